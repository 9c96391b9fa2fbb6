#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::audit_actor::{AuditActor, AuditEventKind};
    use crate::app_system::StorefrontSystem;
    use crate::clients::OrderClient;
    use crate::config::Config;
    use crate::domain::{Caller, LineItem, Order, OrderCreate, OrderStatus, Product, ProductCreate, Role, UserCreate, UserVoucher};
    use crate::error::StoreError;
    use crate::mock_framework::{
        create_mock_store, expect_transaction, run_transaction, seed_order, seed_voucher, serve_transaction, spawn_store,
    };
    use crate::order_actor::{CheckoutRequest, ErrorKind, LineRequest, MissingProductPolicy, OrderServiceError, RollbackSettings, DEFAULT_CANCEL_REASON};
    use crate::store::Tables;

    struct Shop {
        system: StorefrontSystem,
        customer: Caller,
        admin: Caller,
        p1: String,
        p2: String,
    }

    async fn shop() -> Shop {
        let system = StorefrontSystem::new(&Config::default());
        let customer = system.user_client.create_user(UserCreate::customer("Lan", "lan@example.com")).await.unwrap();
        let admin = system.user_client.create_user(UserCreate::admin("Minh", "minh@example.com")).await.unwrap();
        let p1 = system.product_client.create_product(ProductCreate::new("P1", 100_000, 7)).await.unwrap();
        let p2 = system.product_client.create_product(ProductCreate::new("P2", 50_000, 11)).await.unwrap();
        Shop {
            system,
            customer: Caller { user_id: customer, role: Role::Customer },
            admin: Caller { user_id: admin, role: Role::Admin },
            p1,
            p2,
        }
    }

    fn request(items: &[(&str, u32)], voucher_code: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            items: items
                .iter()
                .map(|(id, quantity)| LineRequest { product_id: id.to_string(), quantity: *quantity })
                .collect(),
            voucher_code: voucher_code.map(str::to_string),
        }
    }

    async fn shop_voucher(shop: &Shop, code: &str, used: u32) -> String {
        seed_voucher(shop.system.store(), code, 10, used).await
    }

    async fn stock(shop: &Shop, id: &str) -> u32 {
        shop.system.product_client.check_stock(id.to_string()).await.unwrap()
    }

    async fn used_count(shop: &Shop, voucher_id: &str) -> u32 {
        shop.system.voucher_client.get_voucher(voucher_id.to_string()).await.unwrap().unwrap().used_count
    }

    #[tokio::test]
    async fn test_rollback_restores_stock_and_voucher() {
        let shop = shop().await;
        let orders = &shop.system.order_client;
        // Two earlier redemptions plus this checkout leave the voucher at 3.
        let v1 = shop_voucher(&shop, "V1", 2).await;
        let order = orders
            .place_order(Some(&shop.customer), request(&[(&shop.p1, 2), (&shop.p2, 1)], Some("V1")))
            .await
            .unwrap();
        assert_eq!(stock(&shop, &shop.p1).await, 5);
        assert_eq!(stock(&shop, &shop.p2).await, 10);
        assert_eq!(used_count(&shop, &v1).await, 3);

        let outcome = orders
            .rollback_inventory(Some(&shop.customer), order.id.clone(), None)
            .await
            .unwrap();

        assert!(outcome.voucher_rolled_back);
        assert!(outcome.skipped_products.is_empty());
        assert_eq!(outcome.order.status, OrderStatus::Canceled);
        assert_eq!(outcome.order.cancel_reason.as_deref(), Some(DEFAULT_CANCEL_REASON));
        assert!(outcome.order.cancel_date.is_some());

        assert_eq!(stock(&shop, &shop.p1).await, 7);
        assert_eq!(stock(&shop, &shop.p2).await, 11);
        assert_eq!(used_count(&shop, &v1).await, 2);

        let payment_ref = order.payment_ref.clone();
        let user_id = shop.customer.user_id.clone();
        let reservation = shop
            .system
            .store()
            .find_first::<UserVoucher, _>(move |r| r.user_id == user_id && r.reserved_for.as_deref() == Some(payment_ref.as_str()))
            .await
            .unwrap();
        assert!(reservation.is_none());
    }

    #[tokio::test]
    async fn test_completed_order_is_left_alone() {
        let shop = shop().await;
        let orders = &shop.system.order_client;
        let order = orders
            .place_order(Some(&shop.customer), request(&[(&shop.p1, 1)], None))
            .await
            .unwrap();
        orders.confirm_payment(Some(&shop.admin), order.id.clone()).await.unwrap();
        orders.complete_order(Some(&shop.admin), order.id.clone()).await.unwrap();

        let err = orders
            .rollback_inventory(Some(&shop.customer), order.id.clone(), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.to_string().contains("completed"));
        assert_eq!(stock(&shop, &shop.p1).await, 6);
        let order = orders.view_order(Some(&shop.customer), order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.cancel_reason.is_none());
    }

    #[tokio::test]
    async fn test_second_rollback_is_invalid_state() {
        let shop = shop().await;
        let orders = &shop.system.order_client;
        let order = orders
            .place_order(Some(&shop.customer), request(&[(&shop.p1, 3)], None))
            .await
            .unwrap();

        orders.rollback_inventory(Some(&shop.customer), order.id.clone(), None).await.unwrap();
        let err = orders
            .rollback_inventory(Some(&shop.customer), order.id.clone(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderServiceError::InvalidState { status: OrderStatus::Canceled, .. }));
        assert_eq!(stock(&shop, &shop.p1).await, 7);
    }

    #[tokio::test]
    async fn test_concurrent_rollbacks_credit_once() {
        let shop = shop().await;
        let orders = shop.system.order_client.clone();
        let v1 = shop_voucher(&shop, "V3", 0).await;
        let order = orders
            .place_order(Some(&shop.customer), request(&[(&shop.p2, 4)], Some("V3")))
            .await
            .unwrap();
        assert_eq!(stock(&shop, &shop.p2).await, 7);

        let (first, second) = tokio::join!(
            orders.rollback_inventory(Some(&shop.customer), order.id.clone(), Some("Hết thời gian".into())),
            orders.rollback_inventory(Some(&shop.admin), order.id.clone(), None),
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(e) if e.kind() == ErrorKind::InvalidState)));
        assert_eq!(stock(&shop, &shop.p2).await, 11);
        assert_eq!(used_count(&shop, &v1).await, 0);
    }

    #[tokio::test]
    async fn test_order_without_voucher_leaves_vouchers_alone() {
        let shop = shop().await;
        let orders = &shop.system.order_client;
        let v1 = shop_voucher(&shop, "UNUSED", 3).await;
        let order = orders
            .place_order(Some(&shop.customer), request(&[(&shop.p1, 1)], None))
            .await
            .unwrap();

        let outcome = orders
            .rollback_inventory(Some(&shop.admin), order.id, Some("Admin hủy".into()))
            .await
            .unwrap();

        assert!(!outcome.voucher_rolled_back);
        assert_eq!(outcome.order.cancel_reason.as_deref(), Some("Admin hủy"));
        assert_eq!(used_count(&shop, &v1).await, 3);
    }

    #[tokio::test]
    async fn test_caller_checks() {
        let shop = shop().await;
        let orders = &shop.system.order_client;
        let order = orders
            .place_order(Some(&shop.customer), request(&[(&shop.p1, 1)], None))
            .await
            .unwrap();
        let stranger = Caller { user_id: "user_99".into(), role: Role::Customer };

        let err = orders.rollback_inventory(None, order.id.clone(), None).await.unwrap_err();
        assert_eq!(err, OrderServiceError::Unauthorized);

        let err = orders.rollback_inventory(Some(&stranger), order.id.clone(), None).await.unwrap_err();
        assert_eq!(err, OrderServiceError::Forbidden);

        let err = orders.rollback_inventory(Some(&shop.customer), "order_404".into(), None).await.unwrap_err();
        assert_eq!(err, OrderServiceError::order_not_found("order_404"));

        assert_eq!(stock(&shop, &shop.p1).await, 6);
    }

    #[tokio::test]
    async fn test_audit_event_recorded_after_commit() {
        let store = spawn_store();
        let (audit_actor, audit) = AuditActor::new(8);
        tokio::spawn(audit_actor.run());
        let orders = OrderClient::new(store.clone(), audit.clone(), RollbackSettings::default());

        let p1 = store.create::<Product>(ProductCreate::new("P1", 10, 1)).await.unwrap();
        let order = seed_order(&store, "user_1", &[(p1.as_str(), 1)], OrderStatus::Pending).await;
        let owner = Caller { user_id: "user_1".into(), role: Role::Customer };
        orders.rollback_inventory(Some(&owner), order.id.clone(), Some("Khách hủy".into())).await.unwrap();

        let events = audit.list().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AuditEventKind::OrderCancelled);
        assert_eq!(events[0].order_id, order.id);
        assert_eq!(events[0].reason, "Khách hủy");
        assert!(!events[0].voucher_rolled_back);
    }

    #[tokio::test]
    async fn test_skipped_products_are_not_reported_as_restored() {
        let store = spawn_store();
        let (audit_actor, audit) = AuditActor::new(8);
        tokio::spawn(audit_actor.run());
        let settings = RollbackSettings { missing_product_policy: MissingProductPolicy::Skip, ..Default::default() };
        let orders = OrderClient::new(store.clone(), audit.clone(), settings);

        let p1 = store.create::<Product>(ProductCreate::new("P1", 10, 3)).await.unwrap();
        let order = seed_order(&store, "user_1", &[(p1.as_str(), 2), ("product_404", 1)], OrderStatus::Pending).await;
        let owner = Caller { user_id: "user_1".into(), role: Role::Customer };
        let outcome = orders.rollback_inventory(Some(&owner), order.id.clone(), None).await.unwrap();

        assert_eq!(outcome.skipped_products, ["product_404"]);
        let restored: Vec<_> = outcome.restored_items.iter().map(|item| item.product_id.as_str()).collect();
        assert_eq!(restored, [p1.as_str()]);
        assert_eq!(store.get::<Product>(p1.clone()).await.unwrap().unwrap().in_stock, 5);

        let events = audit.list().await;
        assert_eq!(events.len(), 1);
        let audited: Vec<_> = events[0].restored_items.iter().map(|item| item.product_id.as_str()).collect();
        assert_eq!(audited, [p1.as_str()]);
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_rollback() {
        let store = spawn_store();
        let (audit_actor, audit) = AuditActor::new(1);
        drop(audit_actor);
        let orders = OrderClient::new(store.clone(), audit, RollbackSettings::default());

        let p1 = store.create::<Product>(ProductCreate::new("P1", 10, 1)).await.unwrap();
        let order = seed_order(&store, "user_1", &[(p1.as_str(), 1)], OrderStatus::Pending).await;
        let owner = Caller { user_id: "user_1".into(), role: Role::Customer };
        let outcome = orders.rollback_inventory(Some(&owner), order.id.clone(), None).await.unwrap();

        assert_eq!(outcome.order.status, OrderStatus::Canceled);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_and_changes_nothing() {
        let mut tables = Tables::default();
        let order_id = run_transaction(&mut tables, |tx| {
            tx.create::<Order>(OrderCreate {
                user_id: "user_1".into(),
                items: vec![LineItem { product_id: "product_1".into(), name: "P1".into(), quantity: 2, price: 10 }],
                payment_ref: "pi_test".into(),
                discount: 0,
                voucher_id: None,
                created_at: Utc::now(),
            })
        })
        .unwrap();
        assert_eq!(order_id, "order_1");

        let (store, mut receiver) = create_mock_store(4);
        let (_audit_actor, audit) = AuditActor::new(4);
        let orders = OrderClient::new(store, audit, RollbackSettings::default());
        let owner = Caller { user_id: "user_1".into(), role: Role::Customer };

        let task = tokio::spawn(async move { orders.rollback_inventory(Some(&owner), "order_1".into(), None).await });

        // The order read is served, the rollback transaction fails.
        assert!(serve_transaction(&mut receiver, &mut tables).await);
        let (_body, respond_to) = expect_transaction(&mut receiver).await.expect("Expected rollback transaction");
        respond_to.send(Err(StoreError::Unavailable("connection reset".into()))).unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        let order = run_transaction(&mut tables, |tx| tx.get::<Order>("order_1")).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_confirmed_order_keeps_voucher_usage() {
        let shop = shop().await;
        let orders = &shop.system.order_client;
        let v1 = shop_voucher(&shop, "PAID", 0).await;
        let order = orders
            .place_order(Some(&shop.customer), request(&[(&shop.p1, 1)], Some("PAID")))
            .await
            .unwrap();
        orders.confirm_payment(Some(&shop.admin), order.id.clone()).await.unwrap();

        let err = orders
            .rollback_inventory(Some(&shop.admin), order.id, None)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderServiceError::InvalidState { status: OrderStatus::Confirmed, .. }));
        assert_eq!(used_count(&shop, &v1).await, 1);
        assert_eq!(stock(&shop, &shop.p1).await, 6);
    }
}
