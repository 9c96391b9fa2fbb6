use chrono::{Duration, Utc};
use tracing::{error, info};

use crate::audit_actor::{AuditActor, AuditClient};
use crate::clients::{OrderClient, ProductClient, UserClient, VoucherClient};
use crate::config::Config;
use crate::domain::{DiscountType, ProductCreate, UserCreate, VoucherCreate};
use crate::error::StoreError;
use crate::store::{StoreActor, StoreClient};

/// The main application system that orchestrates all actors.
///
/// Starts the store and audit actors, hands out the clients wired to them,
/// and stops both on shutdown.
pub struct StorefrontSystem {
    pub order_client: OrderClient,
    pub user_client: UserClient,
    pub product_client: ProductClient,
    pub voucher_client: VoucherClient,
    store: StoreClient,
    audit: AuditClient,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl StorefrontSystem {
    pub fn new(config: &Config) -> Self {
        let (store_actor, store) = StoreActor::new(config.store_buffer);
        let store_handle = tokio::spawn(store_actor.run());

        let (audit_actor, audit) = AuditActor::new(config.audit_buffer);
        let audit_handle = tokio::spawn(audit_actor.run());

        Self {
            order_client: OrderClient::new(store.clone(), audit.clone(), config.rollback.clone()),
            user_client: UserClient::new(store.clone()),
            product_client: ProductClient::new(store.clone()),
            voucher_client: VoucherClient::new(store.clone()),
            store,
            audit,
            handles: vec![store_handle, audit_handle],
        }
    }

    /// Loads a small catalog so the HTTP surface can be tried by hand.
    pub async fn seed_demo(&self) -> Result<(), StoreError> {
        let admin = self.user_client.create_user(UserCreate::admin("Quản trị", "admin@example.com")).await?;
        let customer = self.user_client.create_user(UserCreate::customer("Lan", "lan@example.com")).await?;

        let keyboard = self.product_client.create_product(ProductCreate::new("Bàn phím cơ", 850_000, 20)).await?;
        let mouse = self.product_client.create_product(ProductCreate::new("Chuột không dây", 320_000, 50)).await?;

        let now = Utc::now();
        let voucher = self
            .voucher_client
            .create_voucher(VoucherCreate {
                code: "WELCOME10".to_string(),
                discount_type: DiscountType::Percentage,
                discount_value: 10,
                max_discount: Some(100_000),
                min_order_value: Some(200_000),
                quantity: 100,
                start_date: now - Duration::days(1),
                end_date: now + Duration::days(30),
            })
            .await?;

        info!(%admin, %customer, %keyboard, %mouse, %voucher, "Demo data seeded");
        Ok(())
    }

    #[cfg(test)]
    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        if let Err(e) = self.store.shutdown().await {
            error!(error = %e, "Store did not accept shutdown");
        }
        self.audit.shutdown().await;

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
