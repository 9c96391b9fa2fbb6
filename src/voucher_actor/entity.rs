use chrono::{DateTime, Utc};

use crate::actor_framework::Entity;
use crate::domain::{UserVoucher, UserVoucherCreate, UserVoucherPatch, Voucher, VoucherCreate, VoucherPatch};
use super::{UserVoucherAction, VoucherAction, VoucherActionResult, VoucherError};

impl Entity for Voucher {
    const PREFIX: &'static str = "voucher";
    type CreatePayload = VoucherCreate;
    type Patch = VoucherPatch;
    type Action = VoucherAction;
    type ActionResult = VoucherActionResult;
    type Error = VoucherError;

    fn from_create(id: String, params: VoucherCreate) -> Result<Self, VoucherError> {
        if params.code.trim().is_empty() {
            return Err(VoucherError::ValidationError("code must not be empty".into()));
        }
        if params.end_date <= params.start_date {
            return Err(VoucherError::ValidationError(format!(
                "voucher {} ends before it starts",
                params.code
            )));
        }
        Ok(Self {
            id,
            code: params.code,
            discount_type: params.discount_type,
            discount_value: params.discount_value,
            max_discount: params.max_discount,
            min_order_value: params.min_order_value,
            quantity: params.quantity,
            used_count: 0,
            is_active: true,
            start_date: params.start_date,
            end_date: params.end_date,
        })
    }

    fn on_update(&mut self, patch: VoucherPatch) -> Result<(), VoucherError> {
        if let Some(quantity) = patch.quantity {
            if quantity < self.used_count {
                return Err(VoucherError::ValidationError(format!(
                    "quantity {quantity} is below used count {}",
                    self.used_count
                )));
            }
            self.quantity = quantity;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        Ok(())
    }

    /// Handles voucher quota actions.
    ///
    /// # Errors
    /// `Quote` and `Claim` fail when the voucher is inactive, outside its
    /// validity window, exhausted, or the subtotal is below the minimum.
    /// `Release` fails when nothing is claimed.
    fn handle_action(&mut self, action: VoucherAction) -> Result<VoucherActionResult, VoucherError> {
        match action {
            VoucherAction::Quote { subtotal, at } => {
                self.check_redeemable(subtotal, at)?;
                Ok(VoucherActionResult::Quoted { discount: self.discount_for(subtotal) })
            }
            VoucherAction::Claim { subtotal, at } => {
                self.check_redeemable(subtotal, at)?;
                self.used_count += 1;
                Ok(VoucherActionResult::Claimed {
                    discount: self.discount_for(subtotal),
                    used_count: self.used_count,
                })
            }
            VoucherAction::Release => {
                self.used_count = self
                    .used_count
                    .checked_sub(1)
                    .ok_or_else(|| VoucherError::NotClaimed(self.code.clone()))?;
                Ok(VoucherActionResult::Released { used_count: self.used_count })
            }
        }
    }
}

impl Voucher {
    fn check_redeemable(&self, subtotal: u64, at: DateTime<Utc>) -> Result<(), VoucherError> {
        if !self.is_active {
            return Err(VoucherError::Inactive(self.code.clone()));
        }
        if self.start_date > at {
            return Err(VoucherError::NotStarted(self.code.clone()));
        }
        if self.end_date < at {
            return Err(VoucherError::Expired(self.code.clone()));
        }
        if self.used_count >= self.quantity {
            return Err(VoucherError::OutOfStock(self.code.clone()));
        }
        if let Some(minimum) = self.min_order_value {
            if subtotal < minimum {
                return Err(VoucherError::BelowMinimum { minimum, subtotal });
            }
        }
        Ok(())
    }
}

impl Entity for UserVoucher {
    const PREFIX: &'static str = "user_voucher";
    type CreatePayload = UserVoucherCreate;
    type Patch = UserVoucherPatch;
    type Action = UserVoucherAction;
    type ActionResult = ();
    type Error = VoucherError;

    fn from_create(id: String, params: UserVoucherCreate) -> Result<Self, VoucherError> {
        Ok(Self {
            id,
            user_id: params.user_id,
            voucher_id: params.voucher_id,
            reserved_for: Some(params.reserved_for),
            reserved_at: Some(params.reserved_at),
            used_at: None,
        })
    }

    fn on_update(&mut self, patch: UserVoucherPatch) -> Result<(), VoucherError> {
        if self.used_at.is_some() {
            return Err(VoucherError::AlreadyFinalized(self.id.clone()));
        }
        self.reserved_for = Some(patch.reserved_for);
        self.reserved_at = Some(patch.reserved_at);
        Ok(())
    }

    fn handle_action(&mut self, action: UserVoucherAction) -> Result<(), VoucherError> {
        match action {
            UserVoucherAction::Finalize { at } => {
                if self.used_at.is_some() {
                    return Err(VoucherError::AlreadyFinalized(self.id.clone()));
                }
                self.used_at = Some(at);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DiscountType;
    use chrono::Duration;

    fn create(quantity: u32, min_order_value: Option<u64>) -> Voucher {
        let now = Utc::now();
        Voucher::from_create(
            "voucher_1".into(),
            VoucherCreate {
                code: "WELCOME10".into(),
                discount_type: DiscountType::Percentage,
                discount_value: 10,
                max_discount: None,
                min_order_value,
                quantity,
                start_date: now - Duration::days(1),
                end_date: now + Duration::days(7),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_claim_until_quota_exhausted() {
        let mut v = create(1, None);
        let now = Utc::now();
        assert_eq!(
            v.handle_action(VoucherAction::Claim { subtotal: 100_000, at: now }).unwrap(),
            VoucherActionResult::Claimed { discount: 10_000, used_count: 1 }
        );
        assert_eq!(
            v.handle_action(VoucherAction::Claim { subtotal: 100_000, at: now }).unwrap_err(),
            VoucherError::OutOfStock("WELCOME10".into())
        );
        assert_eq!(v.used_count, 1);
    }

    #[test]
    fn test_release_below_zero_is_rejected() {
        let mut v = create(3, None);
        assert_eq!(
            v.handle_action(VoucherAction::Release).unwrap_err(),
            VoucherError::NotClaimed("WELCOME10".into())
        );
    }

    #[test]
    fn test_window_and_minimum() {
        let mut v = create(5, Some(200_000));
        let now = Utc::now();
        assert_eq!(
            v.handle_action(VoucherAction::Quote { subtotal: 150_000, at: now }).unwrap_err(),
            VoucherError::BelowMinimum { minimum: 200_000, subtotal: 150_000 }
        );
        assert_eq!(
            v.handle_action(VoucherAction::Quote { subtotal: 300_000, at: now + Duration::days(30) })
                .unwrap_err(),
            VoucherError::Expired("WELCOME10".into())
        );
        v.on_update(VoucherPatch { is_active: Some(false), ..Default::default() }).unwrap();
        assert_eq!(
            v.handle_action(VoucherAction::Quote { subtotal: 300_000, at: now }).unwrap_err(),
            VoucherError::Inactive("WELCOME10".into())
        );
    }

    #[test]
    fn test_finalize_once() {
        let mut r = UserVoucher::from_create(
            "user_voucher_1".into(),
            UserVoucherCreate {
                user_id: "user_1".into(),
                voucher_id: "voucher_1".into(),
                reserved_for: "pi_1".into(),
                reserved_at: Utc::now(),
            },
        )
        .unwrap();
        assert!(r.is_active_for("user_1", "pi_1"));
        r.handle_action(UserVoucherAction::Finalize { at: Utc::now() }).unwrap();
        assert!(!r.is_active_for("user_1", "pi_1"));
        assert!(r.handle_action(UserVoucherAction::Finalize { at: Utc::now() }).is_err());
    }
}
