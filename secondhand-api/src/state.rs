use std::sync::Arc;

use secondhand_core::repository::{ProductGate, ProfileDirectory, SaleRegistry};
use secondhand_offer::OfferLedger;
use secondhand_store::app_config::{AuthConfig, RateLimitConfig};
use secondhand_store::RedisClient;

#[derive(Clone)]
pub struct AppState {
    pub ledger: OfferLedger,
    pub products: Arc<dyn ProductGate>,
    pub sales: Arc<dyn SaleRegistry>,
    pub profiles: Arc<dyn ProfileDirectory>,
    /// Rate limiting is skipped when unset.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppState {
    pub fn new(
        ledger: OfferLedger,
        products: Arc<dyn ProductGate>,
        sales: Arc<dyn SaleRegistry>,
        profiles: Arc<dyn ProfileDirectory>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            ledger,
            products,
            sales,
            profiles,
            redis: None,
            auth,
            rate_limit: RateLimitConfig::default(),
        }
    }

    pub fn with_rate_limit(mut self, redis: Arc<RedisClient>, limits: RateLimitConfig) -> Self {
        self.redis = Some(redis);
        self.rate_limit = limits;
        self
    }
}
