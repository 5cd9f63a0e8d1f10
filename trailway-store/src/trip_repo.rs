use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use trailway_core::repository::{RepoError, TripCatalog, TripSummary};
use trailway_core::TripId;

pub struct PgTripCatalog {
    pool: PgPool,
}

impl PgTripCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TripRow {
    id: i64,
    source: String,
    destination: String,
    departure_time: DateTime<Utc>,
    price: i64,
    total_seats: i32,
}

impl From<TripRow> for TripSummary {
    fn from(row: TripRow) -> Self {
        TripSummary {
            trip_id: row.id,
            source: row.source,
            destination: row.destination,
            departure_time: row.departure_time,
            price: row.price,
            total_seats: row.total_seats,
        }
    }
}

#[async_trait]
impl TripCatalog for PgTripCatalog {
    async fn get_trip(&self, trip_id: TripId) -> Result<Option<TripSummary>, RepoError> {
        let row = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT t.id, t.source, t.destination, t.departure_time, t.price, b.total_seats
            FROM trips t
            JOIN buses b ON b.id = t.bus_id
            WHERE t.id = $1
            "#,
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TripSummary::from))
    }
}
