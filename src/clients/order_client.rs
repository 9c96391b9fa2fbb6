use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::audit_actor::{AuditClient, AuditEvent, AuditEventKind};
use crate::domain::{Caller, Order, OrderEvent};
use crate::order_actor::{
    advance_tx, check_rollback_allowed, classify_rollback_failure, confirm_payment_tx, new_payment_ref,
    place_order_tx, rollback_tx, CheckoutRequest, OrderServiceError, RollbackOutcome, RollbackSettings,
};
use crate::store::StoreClient;

/// Client for order operations.
///
/// Each operation is one store transaction; the client does the caller
/// checks around it and, for rollbacks, the audit emission after it.
#[derive(Clone)]
pub struct OrderClient {
    store: StoreClient,
    audit: AuditClient,
    settings: RollbackSettings,
}

crate::impl_client_methods!(OrderClient, Order, order);

impl OrderClient {
    pub fn new(store: StoreClient, audit: AuditClient, settings: RollbackSettings) -> Self {
        Self { store, audit, settings }
    }

    #[instrument(skip(self, caller, request), fields(items = request.items.len()))]
    pub async fn place_order(&self, caller: Option<&Caller>, request: CheckoutRequest) -> Result<Order, OrderServiceError> {
        let caller = caller.ok_or(OrderServiceError::Unauthorized)?;
        info!(user_id = %caller.user_id, "Processing place_order request");

        let user_id = caller.user_id.clone();
        let payment_ref = new_payment_ref();
        let order = self
            .store
            .transaction(move |tx| place_order_tx(tx, user_id, request, payment_ref, Utc::now()))
            .await
            .map_err(|e| {
                warn!(error = %e, "Checkout rejected");
                OrderServiceError::from_request(e)
            })?;

        info!(order_id = %order.id, amount = order.amount, "Order placed");
        Ok(order)
    }

    /// Reads an order on behalf of its owner or an admin.
    #[instrument(skip(self, caller))]
    pub async fn view_order(&self, caller: Option<&Caller>, id: String) -> Result<Order, OrderServiceError> {
        let caller = caller.ok_or(OrderServiceError::Unauthorized)?;
        let order = self.load(&id).await?;
        if !caller.may_act_for(&order.user_id) {
            return Err(OrderServiceError::Forbidden);
        }
        Ok(order)
    }

    #[instrument(skip(self, caller))]
    pub async fn confirm_payment(&self, caller: Option<&Caller>, id: String) -> Result<Order, OrderServiceError> {
        require_admin(caller)?;
        let order = self
            .store
            .transaction(move |tx| confirm_payment_tx(tx, &id, Utc::now()))
            .await
            .map_err(OrderServiceError::from_request)?;
        info!(order_id = %order.id, "Payment confirmed");
        Ok(order)
    }

    #[instrument(skip(self, caller))]
    pub async fn complete_order(&self, caller: Option<&Caller>, id: String) -> Result<Order, OrderServiceError> {
        require_admin(caller)?;
        let order = self
            .store
            .transaction(move |tx| advance_tx(tx, &id, OrderEvent::Complete))
            .await
            .map_err(OrderServiceError::from_request)?;
        info!(order_id = %order.id, "Order completed");
        Ok(order)
    }

    /// Cancels a pending order, restores its stock and releases its voucher
    /// reservation in one transaction, then records an audit event.
    #[instrument(skip(self, caller, reason), fields(order_id = %id))]
    pub async fn rollback_inventory(
        &self,
        caller: Option<&Caller>,
        id: String,
        reason: Option<String>,
    ) -> Result<RollbackOutcome, OrderServiceError> {
        info!("Processing rollback_inventory request");
        if caller.is_none() {
            return Err(OrderServiceError::Unauthorized);
        }

        let order = self.load(&id).await?;
        if let Err(e) = check_rollback_allowed(caller, &order) {
            warn!(error = %e, status = %order.status, "Rollback refused");
            return Err(e);
        }

        let reason = self.settings.reason_or_default(reason);
        let policy = self.settings.missing_product_policy;
        let tx_reason = reason.clone();
        let outcome = self
            .store
            .transaction(move |tx| rollback_tx(tx, &id, tx_reason, policy, Utc::now()))
            .await
            .map_err(|e| {
                error!(error = %e, "Inventory rollback failed");
                classify_rollback_failure(e)
            })?;

        info!(
            restored = outcome.restored_items.len(),
            skipped = outcome.skipped_products.len(),
            voucher_rolled_back = outcome.voucher_rolled_back,
            "Inventory rollback committed"
        );

        self.audit.record(AuditEvent {
            kind: AuditEventKind::OrderCancelled,
            user_id: outcome.order.user_id.clone(),
            order_id: outcome.order.id.clone(),
            reason,
            restored_items: outcome.restored_items.clone(),
            voucher_rolled_back: outcome.voucher_rolled_back,
            at: Utc::now(),
        });

        Ok(outcome)
    }

    async fn load(&self, id: &str) -> Result<Order, OrderServiceError> {
        self.get_order(id.to_string())
            .await
            .map_err(OrderServiceError::Transaction)?
            .ok_or_else(|| OrderServiceError::order_not_found(id))
    }
}

fn require_admin(caller: Option<&Caller>) -> Result<&Caller, OrderServiceError> {
    let caller = caller.ok_or(OrderServiceError::Unauthorized)?;
    if caller.is_admin() {
        Ok(caller)
    } else {
        Err(OrderServiceError::Forbidden)
    }
}
