use crate::actor_framework::Entity;
use crate::domain::{subtotal_of, Order, OrderCreate, OrderEvent, OrderStatus};
use super::{OrderAction, OrderActionResult, OrderError};

impl Entity for Order {
    const PREFIX: &'static str = "order";
    type CreatePayload = OrderCreate;
    type Patch = ();
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Error = OrderError;

    /// Creates a new pending Order, computing its totals from the line items.
    fn from_create(id: String, params: OrderCreate) -> Result<Self, OrderError> {
        let subtotal = subtotal_of(&params.items).ok_or(OrderError::AmountOverflow)?;
        if params.discount > subtotal {
            return Err(OrderError::DiscountTooLarge { discount: params.discount, subtotal });
        }
        Ok(Self {
            id,
            user_id: params.user_id,
            items: params.items,
            status: OrderStatus::Pending,
            payment_ref: params.payment_ref,
            subtotal,
            discount: params.discount,
            amount: subtotal - params.discount,
            voucher_id: params.voucher_id,
            cancel_reason: None,
            cancel_date: None,
            created_at: params.created_at,
        })
    }

    fn on_create(&mut self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            });
        }
        Ok(())
    }

    /// Orders are only changed through lifecycle actions.
    fn on_update(&mut self, _patch: ()) -> Result<(), OrderError> {
        Ok(())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::Advance(event) => self.transition(event),
            OrderAction::Cancel { reason, at } => {
                let result = self.transition(OrderEvent::RollbackInventory)?;
                self.cancel_reason = Some(reason);
                self.cancel_date = Some(at);
                Ok(result)
            }
        }
    }
}

impl Order {
    fn transition(&mut self, event: OrderEvent) -> Result<OrderActionResult, OrderError> {
        let from = self.status;
        let to = from.next(event).ok_or_else(|| OrderError::InvalidTransition {
            order_id: self.id.clone(),
            status: from,
            event,
        })?;
        self.status = to;
        Ok(OrderActionResult::Transitioned { from, to })
    }
}
