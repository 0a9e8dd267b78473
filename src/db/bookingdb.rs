// db/bookingdb.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::bookingmodel::*;

/// Name of the partial unique index guarding `(service_id, booking_date, time_slot)`.
pub const ACTIVE_SLOT_CONSTRAINT: &str = "bookings_active_slot_key";

const BOOKING_COLUMNS: &str = "id, user_id, service_id, provider_id, booking_date, time_slot, \
    address, city, urgency, notes, status, cancellation_reason, created_at, updated_at";

const BOOKING_VIEW_SELECT: &str = r#"
    SELECT
        b.id, b.user_id, b.service_id, b.provider_id, b.booking_date, b.time_slot,
        b.address, b.city, b.urgency, b.notes, b.status, b.cancellation_reason,
        b.created_at, b.updated_at,
        s.title AS service_title,
        s.price AS service_price,
        s.category AS service_category,
        pu.name AS provider_name,
        pu.phone AS provider_phone,
        cu.name AS customer_name,
        cu.phone AS customer_phone
    FROM bookings b
    JOIN services s ON s.id = b.service_id
    JOIN service_providers p ON p.id = b.provider_id
    JOIN users pu ON pu.id = p.user_id
    JOIN users cu ON cu.id = b.user_id
"#;

#[async_trait]
pub trait BookingExt {
    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, sqlx::Error>;

    async fn get_booking_view(&self, booking_id: Uuid) -> Result<Option<BookingView>, sqlx::Error>;

    /// Slots held by non-cancelled bookings of a service on a date.
    async fn get_booked_slots(
        &self,
        service_id: Uuid,
        booking_date: NaiveDate,
    ) -> Result<Vec<String>, sqlx::Error>;

    /// Inserts the booking together with its first tracking line.
    async fn create_booking(
        &self,
        booking: NewBooking,
        tracking_text: &str,
    ) -> Result<SlotReservation, sqlx::Error>;

    /// Applies the change only if the booking is still in `change.from`.
    /// `Ok(None)` means the booking moved on in the meantime.
    async fn apply_status_change(&self, change: StatusChange) -> Result<Option<Booking>, sqlx::Error>;

    async fn get_booking_tracking(&self, booking_id: Uuid) -> Result<Vec<BookingTracking>, sqlx::Error>;

    async fn get_user_bookings(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<BookingView>, i64), sqlx::Error>;

    async fn get_provider_bookings(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<BookingView>, i64), sqlx::Error>;

    async fn get_booking_status_counts(&self, provider_id: Uuid) -> Result<Vec<StatusCount>, sqlx::Error>;
}

fn is_slot_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(ACTIVE_SLOT_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait]
impl BookingExt for DBClient {
    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, sqlx::Error> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        sqlx::query_as::<_, Booking>(&sql)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_booking_view(&self, booking_id: Uuid) -> Result<Option<BookingView>, sqlx::Error> {
        let sql = format!("{} WHERE b.id = $1", BOOKING_VIEW_SELECT);
        sqlx::query_as::<_, BookingView>(&sql)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_booked_slots(
        &self,
        service_id: Uuid,
        booking_date: NaiveDate,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT time_slot
            FROM bookings
            WHERE service_id = $1
              AND booking_date = $2
              AND status <> 'cancelled'
            "#,
        )
        .bind(service_id)
        .bind(booking_date)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_booking(
        &self,
        booking: NewBooking,
        tracking_text: &str,
    ) -> Result<SlotReservation, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO bookings
            (user_id, service_id, provider_id, booking_date, time_slot, address, city, urgency, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            RETURNING id
            "#,
        )
        .bind(&booking.user_id)
        .bind(booking.service_id)
        .bind(booking.provider_id)
        .bind(booking.booking_date)
        .bind(&booking.time_slot)
        .bind(&booking.address)
        .bind(&booking.city)
        .bind(booking.urgency)
        .bind(&booking.notes)
        .fetch_one(&mut *tx)
        .await;

        let booking_id = match inserted {
            Ok(id) => id,
            Err(e) if is_slot_conflict(&e) => return Ok(SlotReservation::Taken),
            Err(e) => return Err(e),
        };

        sqlx::query("INSERT INTO booking_tracking (booking_id, status_text) VALUES ($1, $2)")
            .bind(booking_id)
            .bind(tracking_text)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let view = self
            .get_booking_view(booking_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(SlotReservation::Reserved(view))
    }

    async fn apply_status_change(&self, change: StatusChange) -> Result<Option<Booking>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE bookings
            SET status = $3,
                cancellation_reason = COALESCE($4, cancellation_reason),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );
        let updated = sqlx::query_as::<_, Booking>(&sql)
            .bind(change.booking_id)
            .bind(change.from)
            .bind(change.to)
            .bind(&change.cancellation_reason)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(booking) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("INSERT INTO booking_tracking (booking_id, status_text) VALUES ($1, $2)")
            .bind(booking.id)
            .bind(&change.tracking_text)
            .execute(&mut *tx)
            .await?;

        if change.to == BookingStatus::Completed {
            sqlx::query("UPDATE service_providers SET total_jobs = total_jobs + 1 WHERE id = $1")
                .bind(booking.provider_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Some(booking))
    }

    async fn get_booking_tracking(&self, booking_id: Uuid) -> Result<Vec<BookingTracking>, sqlx::Error> {
        sqlx::query_as::<_, BookingTracking>(
            r#"
            SELECT id, booking_id, status_text, recorded_at
            FROM booking_tracking
            WHERE booking_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_user_bookings(
        &self,
        user_id: &str,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<BookingView>, i64), sqlx::Error> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE user_id = $1 AND ($2::booking_status IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"{}
            WHERE b.user_id = $1 AND ($2::booking_status IS NULL OR b.status = $2)
            ORDER BY b.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            BOOKING_VIEW_SELECT
        );
        let bookings = sqlx::query_as::<_, BookingView>(&sql)
            .bind(user_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((bookings, total))
    }

    async fn get_provider_bookings(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<BookingView>, i64), sqlx::Error> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE provider_id = $1 AND ($2::booking_status IS NULL OR status = $2)
            "#,
        )
        .bind(provider_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"{}
            WHERE b.provider_id = $1 AND ($2::booking_status IS NULL OR b.status = $2)
            ORDER BY b.booking_date ASC, b.created_at ASC
            LIMIT $3 OFFSET $4
            "#,
            BOOKING_VIEW_SELECT
        );
        let bookings = sqlx::query_as::<_, BookingView>(&sql)
            .bind(provider_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((bookings, total))
    }

    async fn get_booking_status_counts(&self, provider_id: Uuid) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM bookings
            WHERE provider_id = $1
            GROUP BY status
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
    }
}
