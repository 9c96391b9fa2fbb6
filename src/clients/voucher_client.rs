use chrono::Utc;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{Voucher, VoucherCreate};
use crate::error::StoreError;
use crate::store::StoreClient;
use crate::voucher_actor::{VoucherAction, VoucherActionResult};

/// Client for vouchers.
#[derive(Clone)]
pub struct VoucherClient {
    store: StoreClient,
}

crate::impl_client_new!(VoucherClient);

/// What a voucher would take off a given subtotal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherQuote {
    pub voucher: Voucher,
    pub discount_amount: u64,
    pub final_amount: u64,
}

impl VoucherClient {
    #[instrument(skip(self), fields(code = %voucher.code))]
    pub async fn create_voucher(&self, voucher: VoucherCreate) -> Result<String, StoreError> {
        debug!("Sending request");
        self.store.create::<Voucher>(voucher).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: String) -> Result<Option<Voucher>, StoreError> {
        debug!("Sending request");
        self.store.find_first::<Voucher, _>(move |v| v.code == code).await
    }

    /// Validates `code` for a subtotal and returns the discount it would
    /// grant, without claiming anything.
    #[instrument(skip(self))]
    pub async fn quote(&self, code: String, subtotal: u64) -> Result<VoucherQuote, StoreError> {
        debug!("Sending request");
        let voucher = self
            .find_by_code(code.clone())
            .await?
            .ok_or(StoreError::NotFound { collection: "voucher", id: code })?;
        let action = VoucherAction::Quote { subtotal, at: Utc::now() };
        match self.store.perform_action::<Voucher>(voucher.id.clone(), action).await? {
            VoucherActionResult::Quoted { discount } => Ok(VoucherQuote {
                voucher,
                discount_amount: discount,
                final_amount: subtotal.saturating_sub(discount),
            }),
            other => Err(StoreError::Internal(format!("unexpected voucher result: {other:?}"))),
        }
    }

    #[cfg(test)]
    pub async fn get_voucher(&self, id: String) -> Result<Option<Voucher>, StoreError> {
        self.store.get::<Voucher>(id).await
    }
}
