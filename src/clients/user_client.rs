use tracing::{debug, instrument};

use crate::domain::{Caller, User, UserCreate};
use crate::error::StoreError;
use crate::store::StoreClient;

/// Client for user records.
#[derive(Clone)]
pub struct UserClient {
    store: StoreClient,
}

crate::impl_basic_client!(UserClient, User, user);

impl UserClient {
    #[instrument(skip(self), fields(user_email = %user.email))]
    pub async fn create_user(&self, user: UserCreate) -> Result<String, StoreError> {
        debug!("Sending request");
        self.store.create::<User>(user).await
    }

    /// Turns an already-authenticated user id into a [`Caller`]. Unknown ids
    /// resolve to `None`.
    #[instrument(skip(self))]
    pub async fn resolve_caller(&self, user_id: String) -> Result<Option<Caller>, StoreError> {
        let user = self.get_user(user_id).await?;
        Ok(user.as_ref().map(Caller::from))
    }
}
