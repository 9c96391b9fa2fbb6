#[macro_export]
macro_rules! impl_client_methods {
    ($client_name:ident, $entity:ty, $entity_name_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $entity_name_snake>](&self, id: String) -> Result<Option<$entity>, $crate::error::StoreError> {
                    tracing::debug!("Sending request");
                    self.store.get::<$entity>(id).await
                }
            }
        }
    };
}

#[macro_export]
macro_rules! impl_client_new {
    ($client_name:ident) => {
        impl $client_name {
            pub fn new(store: $crate::store::StoreClient) -> Self {
                Self { store }
            }
        }
    };
}

#[macro_export]
macro_rules! impl_basic_client {
    ($client_name:ident, $entity:ty, $entity_name_snake:ident) => {
        $crate::impl_client_new!($client_name);
        $crate::impl_client_methods!($client_name, $entity, $entity_name_snake);
    };
}
