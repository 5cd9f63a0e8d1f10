use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trailway_api::{
    app,
    state::{AppState, AuthConfig, RateLimitConfig},
    worker,
};
use trailway_core::memory::{InMemoryBookingRepository, StaticTripCatalog};
use trailway_core::repository::{BookingRepository, TripCatalog};
use trailway_core::SystemClock;
use trailway_store::{Config, DbClient, EventProducer, PgBookingRepository, PgTripCatalog, RedisClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trailway_api=debug,trailway_seats=info,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    config.validate()?;
    tracing::info!("Starting Trailway API on port {}", config.server.port);

    let db = match &config.database {
        Some(database) => {
            let db = DbClient::new(&database.url).await.context("Failed to connect to Postgres")?;
            db.migrate().await?;
            Some(Arc::new(db))
        }
        None => None,
    };
    let (catalog, bookings): (Arc<dyn TripCatalog>, Arc<dyn BookingRepository>) = match &db {
        Some(db) => (
            Arc::new(PgTripCatalog::new(db.pool.clone())),
            Arc::new(PgBookingRepository::new(db.pool.clone())),
        ),
        None => {
            warn!("No database configured, serving the demo catalog with in-memory bookings");
            (Arc::new(StaticTripCatalog::demo()), Arc::new(InMemoryBookingRepository::new()))
        }
    };

    let redis = match &config.redis {
        Some(redis) => Some(Arc::new(
            RedisClient::new(&redis.url).await.context("Failed to create Redis client")?,
        )),
        None => None,
    };

    let kafka = match &config.kafka {
        Some(kafka) => Some(Arc::new(
            EventProducer::new(&kafka.brokers).context("Failed to create Kafka producer")?,
        )),
        None => None,
    };

    let settings = config.seats.to_settings();
    let sweep_interval = settings.sweep_interval;

    let app_state = AppState::new(
        catalog,
        bookings,
        Arc::new(SystemClock),
        settings,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        RateLimitConfig {
            requests: config.rate_limit.requests,
            window_seconds: config.rate_limit.window_seconds,
        },
    )
    .with_db(db)
    .with_redis(redis)
    .with_kafka(kafka);

    let _sweeper = worker::spawn_expiry_sweeper(app_state.locks.clone(), sweep_interval);

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
