use std::sync::Arc;

use trailway_core::identity::IdentityResolver;
use trailway_core::repository::{BookingRepository, TripCatalog};
use trailway_core::Clock;
use trailway_seats::{BookingFinalizer, LockManager, SeatRegistry, SeatSettings};
use trailway_store::{DbClient, EventProducer, RedisClient};

use crate::middleware::auth::JwtIdentity;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone, Copy)]
pub struct RateLimitConfig {
    pub requests: i64,
    pub window_seconds: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SeatRegistry>,
    pub locks: Arc<LockManager>,
    pub finalizer: Arc<BookingFinalizer>,
    pub identity: Arc<dyn IdentityResolver>,
    pub db: Option<Arc<DbClient>>,
    pub redis: Option<Arc<RedisClient>>,
    pub kafka: Option<Arc<EventProducer>>,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn TripCatalog>,
        bookings: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
        settings: SeatSettings,
        auth: AuthConfig,
        rate_limit: RateLimitConfig,
    ) -> Self {
        let registry = Arc::new(SeatRegistry::new(catalog, bookings, clock, settings));

        Self {
            locks: Arc::new(LockManager::new(registry.clone())),
            finalizer: Arc::new(BookingFinalizer::new(registry.clone())),
            registry,
            identity: Arc::new(JwtIdentity::new(&auth.secret)),
            db: None,
            redis: None,
            kafka: None,
            auth,
            rate_limit,
        }
    }

    pub fn with_db(mut self, db: Option<Arc<DbClient>>) -> Self {
        self.db = db;
        self
    }

    pub fn with_redis(mut self, redis: Option<Arc<RedisClient>>) -> Self {
        self.redis = redis;
        self
    }

    pub fn with_kafka(mut self, kafka: Option<Arc<EventProducer>>) -> Self {
        self.kafka = kafka;
        self
    }
}
