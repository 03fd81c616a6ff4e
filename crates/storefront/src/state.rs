//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::gateway::{CardGateway, WalletGateway};
use crate::services::notifications::Notifier;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    card_gateway: CardGateway,
    wallet_gateway: WalletGateway,
    notifier: Notifier,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let card_gateway = CardGateway::new(&config.card_gateway);
        let wallet_gateway = WalletGateway::new(&config.wallet_gateway);
        let notifier = Notifier::from_config(config.email.as_ref());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                card_gateway,
                wallet_gateway,
                notifier,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the hosted-checkout card gateway client.
    #[must_use]
    pub fn card_gateway(&self) -> &CardGateway {
        &self.inner.card_gateway
    }

    /// Get a reference to the wallet (redirect-approval) gateway client.
    #[must_use]
    pub fn wallet_gateway(&self) -> &WalletGateway {
        &self.inner.wallet_gateway
    }

    /// Get a reference to the email notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }
}
