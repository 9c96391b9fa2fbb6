//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_store`] to get a store client and the receiver its
//! requests land on. [`expect_transaction`] pulls the next transaction so the
//! test decides its outcome: run it against [`Tables`] it owns, fail it, or
//! drop it. The `seed_*` helpers build state in a real store.

use chrono::{Duration, Utc};
use tokio::sync::mpsc;

use crate::domain::{DiscountType, LineItem, Order, OrderCreate, OrderEvent, OrderStatus, Voucher, VoucherCreate};
use crate::order_actor::{new_payment_ref, OrderAction};
use crate::error::StoreError;
use crate::store::{execute, Response, StoreActor, StoreClient, StoreRequest, Tables, Transaction, TxBody, TxOutput};
use crate::voucher_actor::VoucherAction;

/// Creates a store client whose requests are delivered to the returned
/// receiver instead of a running store actor.
pub fn create_mock_store(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Transaction request
pub async fn expect_transaction(receiver: &mut mpsc::Receiver<StoreRequest>) -> Option<(TxBody, Response<TxOutput>)> {
    match receiver.recv().await {
        Some(StoreRequest::Transaction { body, respond_to }) => Some((body, respond_to)),
        _ => None,
    }
}

/// Answers one pending transaction by running it against `tables`.
pub async fn serve_transaction(receiver: &mut mpsc::Receiver<StoreRequest>, tables: &mut Tables) -> bool {
    match expect_transaction(receiver).await {
        Some((body, respond_to)) => {
            let _ = respond_to.send(execute(tables, body));
            true
        }
        None => false,
    }
}

/// Runs `body` directly against `tables`, the way the store actor would.
pub fn run_transaction<R, F>(tables: &mut Tables, body: F) -> Result<R, StoreError>
where
    R: Send + 'static,
    F: FnOnce(&mut Transaction<'_>) -> Result<R, StoreError> + Send + 'static,
{
    let body: TxBody = Box::new(move |tx: &mut Transaction<'_>| body(tx).map(|value| Box::new(value) as TxOutput));
    let output = execute(tables, body)?;
    output
        .downcast::<R>()
        .map(|value| *value)
        .map_err(|_| StoreError::Internal("transaction output type mismatch".to_string()))
}

pub fn spawn_store() -> StoreClient {
    let (actor, client) = StoreActor::new(32);
    tokio::spawn(actor.run());
    client
}

/// 10% voucher valid around now, with `used` units already claimed.
pub async fn seed_voucher(store: &StoreClient, code: &str, quantity: u32, used: u32) -> String {
    let now = Utc::now();
    let id = store
        .create::<Voucher>(VoucherCreate {
            code: code.to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: 10,
            max_discount: None,
            min_order_value: None,
            quantity,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(30),
        })
        .await
        .expect("seed voucher");
    for _ in 0..used {
        store
            .perform_action::<Voucher>(id.clone(), VoucherAction::Claim { subtotal: 0, at: now })
            .await
            .expect("seed voucher usage");
    }
    id
}

/// Inserts an order for `user_id` without touching stock, then walks it to
/// `status` through the transition table.
pub async fn seed_order(store: &StoreClient, user_id: &str, items: &[(&str, u32)], status: OrderStatus) -> Order {
    let items = items
        .iter()
        .map(|(product_id, quantity)| LineItem {
            product_id: product_id.to_string(),
            name: product_id.to_string(),
            quantity: *quantity,
            price: 1,
        })
        .collect();
    let id = store
        .create::<Order>(OrderCreate {
            user_id: user_id.to_string(),
            items,
            payment_ref: new_payment_ref(),
            discount: 0,
            voucher_id: None,
            created_at: Utc::now(),
        })
        .await
        .expect("seed order");

    let path: &[OrderEvent] = match status {
        OrderStatus::Pending => &[],
        OrderStatus::Confirmed => &[OrderEvent::ConfirmPayment],
        OrderStatus::Completed => &[OrderEvent::ConfirmPayment, OrderEvent::Complete],
        OrderStatus::Canceled => &[OrderEvent::RollbackInventory],
    };
    for event in path {
        store
            .perform_action::<Order>(id.clone(), OrderAction::Advance(*event))
            .await
            .expect("seed order status");
    }
    store.get::<Order>(id).await.expect("seed order read").expect("seeded order exists")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Product, ProductCreate};

    #[tokio::test]
    async fn test_mock_store() {
        let (client, mut receiver) = create_mock_store(4);
        let mut tables = Tables::default();

        let create_task = tokio::spawn(async move {
            client.create::<Product>(ProductCreate::new("Test", 10, 1)).await
        });
        assert!(serve_transaction(&mut receiver, &mut tables).await);
        assert_eq!(create_task.await.unwrap(), Ok("product_1".to_string()));

        let (client, mut receiver) = create_mock_store(4);
        let failing = tokio::spawn(async move { client.get::<Product>("product_1".into()).await });
        let (_body, respond_to) = expect_transaction(&mut receiver).await.expect("Expected Transaction");
        respond_to.send(Err(StoreError::Unavailable("disk full".into()))).unwrap();
        assert_eq!(failing.await.unwrap(), Err(StoreError::Unavailable("disk full".into())));
    }
}
