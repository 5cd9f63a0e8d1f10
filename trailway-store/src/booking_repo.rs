use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use trailway_core::repository::{BookingRepository, RepoError};
use trailway_core::{Booking, PassengerDetails, SeatNumber, TripId, UserId};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    booking_number: String,
    trip_id: i64,
    user_id: String,
    gender: String,
    age: i32,
    phone_number: String,
    status: String,
    created_at: DateTime<Utc>,
    seat_numbers: Vec<i32>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepoError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            booking_number: row.booking_number,
            trip_id: row.trip_id,
            owner_user_id: row.user_id,
            seat_numbers: row.seat_numbers,
            passenger_details: PassengerDetails {
                gender: row.gender,
                age: row.age,
                phone_number: row.phone_number,
            },
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

const SELECT_BOOKINGS: &str = r#"
    SELECT b.booking_number, b.trip_id, b.user_id, b.gender, b.age, b.phone_number,
           b.status, b.created_at,
           COALESCE(ARRAY_AGG(s.seat_number ORDER BY s.seat_number)
                    FILTER (WHERE s.seat_number IS NOT NULL), '{}') AS seat_numbers
    FROM bookings b
    LEFT JOIN booked_seats s ON s.booking_number = b.booking_number
"#;

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn save_booking(&self, booking: &Booking) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bookings (booking_number, trip_id, user_id, gender, age, phone_number, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&booking.booking_number)
        .bind(booking.trip_id)
        .bind(&booking.owner_user_id)
        .bind(&booking.passenger_details.gender)
        .bind(booking.passenger_details.age)
        .bind(&booking.passenger_details.phone_number)
        .bind(booking.status.to_string())
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await?;

        // The (trip_id, seat_number) primary key rejects a seat booked twice.
        for seat in &booking.seat_numbers {
            sqlx::query("INSERT INTO booked_seats (trip_id, seat_number, booking_number) VALUES ($1, $2, $3)")
                .bind(booking.trip_id)
                .bind(*seat)
                .bind(&booking.booking_number)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Booking {} stored with {} seats", booking.booking_number, booking.seat_numbers.len());
        Ok(())
    }

    async fn booked_seats(&self, trip_id: TripId) -> Result<Vec<SeatNumber>, RepoError> {
        let seats: Vec<(i32,)> =
            sqlx::query_as("SELECT seat_number FROM booked_seats WHERE trip_id = $1 ORDER BY seat_number")
                .bind(trip_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(seats.into_iter().map(|(seat,)| seat).collect())
    }

    async fn get_booking(&self, booking_number: &str) -> Result<Option<Booking>, RepoError> {
        let query = format!("{} WHERE b.booking_number = $1 GROUP BY b.booking_number", SELECT_BOOKINGS);
        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(booking_number)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(&self, user_id: &UserId) -> Result<Vec<Booking>, RepoError> {
        let query = format!(
            "{} WHERE b.user_id = $1 GROUP BY b.booking_number ORDER BY b.created_at DESC",
            SELECT_BOOKINGS
        );
        let rows = sqlx::query_as::<_, BookingRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}
