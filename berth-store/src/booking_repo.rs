use async_trait::async_trait;
use berth_catalog::{FareClass, InventoryKey};
use berth_core::booking::{Booking, BookingStatus, Passenger, PaymentStatus, Pnr};
use berth_core::repository::{BookingLedger, LedgerError};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::backend_error;

/// Postgres-backed ledger.
///
/// Inserts take a transaction-scoped advisory lock on the inventory key before
/// recounting, so check-and-commit for one (train, date, class) is serialized
/// while other keys proceed in parallel.
pub struct PgBookingLedger {
    pool: PgPool,
}

impl PgBookingLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    pnr: String,
    user_id: Uuid,
    train_id: Uuid,
    train_number: String,
    train_name: String,
    source: String,
    destination: String,
    travel_date: NaiveDate,
    class: String,
    passengers: Json<Vec<Passenger>>,
    total_fare: i64,
    status: String,
    payment_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = LedgerError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, value: &str| LedgerError::Corrupt(format!("booking {}: {} '{}'", row.pnr, what, value));

        let pnr = Pnr::parse(&row.pnr).ok_or_else(|| corrupt("pnr", &row.pnr))?;
        let class = row.class.parse::<FareClass>().map_err(|_| corrupt("class", &row.class))?;
        let status = BookingStatus::parse(&row.status).ok_or_else(|| corrupt("status", &row.status))?;
        let payment_status =
            PaymentStatus::parse(&row.payment_status).ok_or_else(|| corrupt("payment status", &row.payment_status))?;

        Ok(Booking {
            pnr,
            user_id: row.user_id,
            train_id: row.train_id,
            train_number: row.train_number,
            train_name: row.train_name,
            source: row.source,
            destination: row.destination,
            travel_date: row.travel_date,
            class,
            passengers: row.passengers.0,
            total_fare: row.total_fare,
            status,
            payment_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "pnr, user_id, train_id, train_number, train_name, source, destination, \
     travel_date, class, passengers, total_fare, status, payment_status, created_at, updated_at";

const SEATS_HELD: &str = r#"
    SELECT COALESCE(SUM(seat_count), 0)::BIGINT
    FROM bookings
    WHERE train_id = $1 AND travel_date = $2 AND class = $3 AND status <> 'Cancelled'
"#;

async fn recount(tx: &mut Transaction<'_, Postgres>, key: &InventoryKey) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(SEATS_HELD)
        .bind(key.train_id)
        .bind(key.travel_date)
        .bind(key.class.code())
        .fetch_one(&mut **tx)
        .await
}

#[async_trait]
impl BookingLedger for PgBookingLedger {
    async fn booked_seats(&self, key: &InventoryKey) -> Result<i64, LedgerError> {
        sqlx::query_scalar(SEATS_HELD)
            .bind(key.train_id)
            .bind(key.travel_date)
            .bind(key.class.code())
            .fetch_one(&self.pool)
            .await
            .map_err(backend_error)
    }

    async fn booked_by_class(
        &self,
        train_id: Uuid,
        travel_date: NaiveDate,
    ) -> Result<HashMap<FareClass, i64>, LedgerError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT class, SUM(seat_count)::BIGINT
            FROM bookings
            WHERE train_id = $1 AND travel_date = $2 AND status <> 'Cancelled'
            GROUP BY class
            "#,
        )
        .bind(train_id)
        .bind(travel_date)
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        rows.into_iter()
            .map(|(class, seats)| {
                class
                    .parse::<FareClass>()
                    .map(|class| (class, seats))
                    .map_err(|e| LedgerError::Corrupt(e.to_string()))
            })
            .collect()
    }

    async fn insert_within_capacity(&self, booking: &Booking, capacity: u32) -> Result<(), LedgerError> {
        let key = booking.inventory_key();
        let mut tx = self.pool.begin().await.map_err(backend_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(key.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend_error)?;

        let held = recount(&mut tx, &key).await.map_err(backend_error)?;
        let available = i64::from(capacity) - held;
        if i64::from(booking.seat_count()) > available {
            // Dropping the transaction rolls back and releases the lock.
            return Err(LedgerError::CapacityExceeded {
                key: key.to_string(),
                available,
            });
        }

        let seat_count = i32::try_from(booking.seat_count())
            .map_err(|_| LedgerError::Backend(format!("seat count {} out of range", booking.seat_count())))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO bookings (pnr, user_id, train_id, train_number, train_name, source, destination,
                                  travel_date, class, passengers, seat_count, total_fare, status, payment_status,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(booking.pnr.as_str())
        .bind(booking.user_id)
        .bind(booking.train_id)
        .bind(&booking.train_number)
        .bind(&booking.train_name)
        .bind(&booking.source)
        .bind(&booking.destination)
        .bind(booking.travel_date)
        .bind(booking.class.code())
        .bind(Json(&booking.passengers))
        .bind(seat_count)
        .bind(booking.total_fare)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(LedgerError::DuplicatePnr(booking.pnr.to_string()));
            }
            Err(e) => return Err(backend_error(e)),
        }

        tx.commit().await.map_err(backend_error)
    }

    async fn find_by_pnr(&self, pnr: &Pnr) -> Result<Option<Booking>, LedgerError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {} FROM bookings WHERE pnr = $1", BOOKING_COLUMNS))
                .bind(pnr.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend_error)?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, LedgerError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn mark_cancelled(&self, pnr: &Pnr) -> Result<Booking, LedgerError> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "UPDATE bookings SET status = 'Cancelled', updated_at = NOW() \
             WHERE pnr = $1 AND status <> 'Cancelled' RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(pnr.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        match row {
            Some(row) => Booking::try_from(row),
            None => match self.find_by_pnr(pnr).await? {
                Some(_) => Err(LedgerError::AlreadyCancelled(pnr.to_string())),
                None => Err(LedgerError::NotFound(pnr.to_string())),
            },
        }
    }
}
