//! HTTP surface: axum router over the storefront clients.

pub mod error;
pub mod routes;

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::app_system::StorefrontSystem;
use crate::clients::{OrderClient, ProductClient, UserClient, VoucherClient};
use crate::domain::Caller;

pub use error::ApiError;
pub use routes::router;

/// Header carrying the id of the already-authenticated user.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderClient,
    pub users: UserClient,
    pub products: ProductClient,
    pub vouchers: VoucherClient,
}

impl AppState {
    pub fn new(system: &StorefrontSystem) -> Self {
        Self {
            orders: system.order_client.clone(),
            users: system.user_client.clone(),
            products: system.product_client.clone(),
            vouchers: system.voucher_client.clone(),
        }
    }
}

/// The caller behind a request, `None` when the header is missing or names
/// no known user.
pub struct CurrentCaller(pub Option<Caller>);

impl FromRequestParts<AppState> for CurrentCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(user_id) = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            debug!("Request without caller identity");
            return Ok(CurrentCaller(None));
        };

        let caller = state.users.resolve_caller(user_id.to_string()).await?;
        Ok(CurrentCaller(caller))
    }
}
