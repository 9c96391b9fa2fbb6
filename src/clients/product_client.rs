use tracing::{debug, instrument};

use crate::domain::{Product, ProductCreate};
use crate::error::StoreError;
use crate::store::StoreClient;

/// Client for the product catalog and its stock counters.
#[derive(Clone)]
pub struct ProductClient {
    store: StoreClient,
}

crate::impl_basic_client!(ProductClient, Product, product);

impl ProductClient {
    #[instrument(skip(self), fields(product_name = %product.name))]
    pub async fn create_product(&self, product: ProductCreate) -> Result<String, StoreError> {
        debug!("Sending request");
        self.store.create::<Product>(product).await
    }

    #[cfg(test)]
    pub async fn check_stock(&self, id: String) -> Result<u32, StoreError> {
        self.get_product(id.clone())
            .await?
            .map(|product| product.in_stock)
            .ok_or(StoreError::NotFound { collection: "product", id })
    }
}
