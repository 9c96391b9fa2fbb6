use std::{env, fmt::Display, net::SocketAddr, num::NonZeroUsize, str::FromStr};

use thiserror::Error;
use tracing::info;

use crate::order_actor::{MissingProductPolicy, RollbackSettings, DEFAULT_CANCEL_REASON};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {key} value `{value}`: {reason}")]
    Invalid { key: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store_buffer: usize,
    pub audit_buffer: usize,
    pub seed_demo: bool,
    pub rollback: RollbackSettings,
}

impl Config {
    /// Reads the `STOREFRONT_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: try_load(&lookup, "STOREFRONT_BIND_ADDR", "127.0.0.1:3000")?,
            store_buffer: try_load::<NonZeroUsize>(&lookup, "STOREFRONT_STORE_BUFFER", "64")?.get(),
            audit_buffer: try_load::<NonZeroUsize>(&lookup, "STOREFRONT_AUDIT_BUFFER", "256")?.get(),
            seed_demo: try_load(&lookup, "STOREFRONT_SEED_DEMO", "false")?,
            rollback: RollbackSettings {
                missing_product_policy: try_load::<MissingProductPolicy>(
                    &lookup,
                    "STOREFRONT_MISSING_PRODUCT_POLICY",
                    "fail",
                )?,
                default_reason: try_load(&lookup, "STOREFRONT_DEFAULT_CANCEL_REASON", DEFAULT_CANCEL_REASON)?,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            store_buffer: 64,
            audit_buffer: 256,
            seed_demo: false,
            rollback: RollbackSettings::default(),
        }
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.clone(),
        reason: e.to_string(),
    })
}
