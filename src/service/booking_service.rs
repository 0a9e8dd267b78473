// service/booking_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::Store,
    dtos::{apidtos::Pagination, bookingdtos::*, userdtos::ProviderStatsDto},
    models::{
        bookingmodel::*,
        usermodel::{Provider, User},
    },
    service::error::ServiceError,
    utils::params::{non_empty, parse_date, parse_uuid, PageRequest, DEFAULT_PAGE_SIZE},
};

const REQUIRED_BOOKING_FIELDS: &str = "Service ID, booking date, and time slot are required";
const REQUIRED_SLOT_QUERY: &str = "Service ID and date are required";

#[derive(Debug, Clone)]
pub struct BookingService {
    db_client: Arc<dyn Store>,
}

impl BookingService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn create_booking(
        &self,
        user: &User,
        dto: CreateBookingDto,
    ) -> Result<BookingView, ServiceError> {
        let (Some(service_id), Some(booking_date), Some(time_slot)) = (
            non_empty(dto.service_id),
            non_empty(dto.booking_date),
            non_empty(dto.time_slot),
        ) else {
            return Err(ServiceError::Validation(REQUIRED_BOOKING_FIELDS.to_string()));
        };

        let service_id = parse_uuid(&service_id)
            .ok_or_else(|| ServiceError::Validation("Invalid service ID".to_string()))?;
        let booking_date = parse_date(&booking_date).ok_or_else(|| {
            ServiceError::Validation("Booking date must be formatted as YYYY-MM-DD".to_string())
        })?;
        if !is_known_slot(&time_slot) {
            return Err(ServiceError::Validation(format!("Invalid time slot: {}", time_slot)));
        }

        let service = self
            .db_client
            .get_service(service_id)
            .await?
            .ok_or(ServiceError::ServiceNotFound(service_id))?;

        if !service.is_active {
            tracing::warn!(%service_id, user_id = %user.id, "booking rejected, service inactive");
            return Err(ServiceError::ServiceUnavailable(service_id));
        }

        let booking = NewBooking {
            user_id: user.id.clone(),
            service_id,
            provider_id: service.provider_id,
            booking_date,
            time_slot,
            address: non_empty(dto.address),
            city: non_empty(dto.city),
            urgency: dto.urgency.unwrap_or_default(),
            notes: non_empty(dto.notes),
        };

        match self
            .db_client
            .create_booking(booking, BOOKING_CREATED_MESSAGE)
            .await?
        {
            SlotReservation::Reserved(view) => {
                tracing::info!(
                    booking_id = %view.booking.id,
                    %service_id,
                    date = %view.booking.booking_date,
                    slot = %view.booking.time_slot,
                    "booking created"
                );
                Ok(view)
            }
            SlotReservation::Taken => {
                tracing::warn!(%service_id, %booking_date, "booking rejected, slot already held");
                Err(ServiceError::SlotTaken)
            }
        }
    }

    pub async fn available_slots(
        &self,
        query: AvailableSlotsQuery,
    ) -> Result<Vec<String>, ServiceError> {
        let (Some(service_id), Some(date)) = (non_empty(query.service_id), non_empty(query.date))
        else {
            return Err(ServiceError::Validation(REQUIRED_SLOT_QUERY.to_string()));
        };

        let service_id = parse_uuid(&service_id)
            .ok_or_else(|| ServiceError::Validation("Invalid service ID".to_string()))?;
        let date = parse_date(&date).ok_or_else(|| {
            ServiceError::Validation("Date must be formatted as YYYY-MM-DD".to_string())
        })?;

        let booked = self.db_client.get_booked_slots(service_id, date).await?;
        Ok(available_slots(&booked))
    }

    /// Moves a booking along the lifecycle on behalf of the provider that owns it.
    pub async fn update_status(
        &self,
        provider: &Provider,
        booking_id: Uuid,
        status: &str,
    ) -> Result<Booking, ServiceError> {
        let next = BookingStatus::parse(status.trim())
            .ok_or_else(|| ServiceError::Validation("Invalid status".to_string()))?;

        let booking = self
            .db_client
            .get_booking(booking_id)
            .await?
            .ok_or(ServiceError::BookingNotFound(booking_id))?;

        if booking.provider_id != provider.id {
            tracing::warn!(%booking_id, provider_id = %provider.id, "status change by foreign provider");
            return Err(ServiceError::Forbidden(
                "Not authorized to update this booking".to_string(),
            ));
        }

        if !booking.status.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition {
                from: booking.status,
                to: next,
            });
        }

        let change = StatusChange {
            booking_id,
            from: booking.status,
            to: next,
            tracking_text: next.tracking_message().to_string(),
            cancellation_reason: None,
        };

        let updated = self
            .db_client
            .apply_status_change(change)
            .await?
            .ok_or(ServiceError::StaleBooking(booking_id))?;

        tracing::info!(%booking_id, from = %booking.status, to = %next, "booking status updated");
        Ok(updated)
    }

    pub async fn cancel_booking(
        &self,
        user: &User,
        booking_id: Uuid,
        reason: Option<String>,
    ) -> Result<Booking, ServiceError> {
        let booking = self
            .db_client
            .get_booking(booking_id)
            .await?
            .ok_or(ServiceError::BookingNotFound(booking_id))?;

        if booking.user_id != user.id {
            return Err(ServiceError::Forbidden(
                "Not authorized to cancel this booking".to_string(),
            ));
        }

        if !booking.status.customer_can_cancel() {
            return Err(ServiceError::NotCancellable(booking.status));
        }

        let change = StatusChange {
            booking_id,
            from: booking.status,
            to: BookingStatus::Cancelled,
            tracking_text: CUSTOMER_CANCELLED_MESSAGE.to_string(),
            cancellation_reason: non_empty(reason),
        };

        let cancelled = self
            .db_client
            .apply_status_change(change)
            .await?
            .ok_or(ServiceError::StaleBooking(booking_id))?;

        tracing::info!(%booking_id, from = %booking.status, "booking cancelled by customer");
        Ok(cancelled)
    }

    pub async fn booking_detail(
        &self,
        user: &User,
        booking_id: Uuid,
    ) -> Result<BookingDetailDto, ServiceError> {
        let view = self
            .db_client
            .get_booking_view(booking_id)
            .await?
            .ok_or(ServiceError::BookingNotFound(booking_id))?;

        self.ensure_party(user, &view.booking).await?;

        let tracking = self.db_client.get_booking_tracking(booking_id).await?;
        Ok(BookingDetailDto {
            booking: view,
            tracking,
        })
    }

    pub async fn tracking(
        &self,
        user: &User,
        booking_id: Uuid,
    ) -> Result<Vec<BookingTracking>, ServiceError> {
        let booking = self
            .db_client
            .get_booking(booking_id)
            .await?
            .ok_or(ServiceError::BookingNotFound(booking_id))?;

        self.ensure_party(user, &booking).await?;

        Ok(self.db_client.get_booking_tracking(booking_id).await?)
    }

    pub async fn my_bookings(
        &self,
        user: &User,
        query: BookingListQuery,
    ) -> Result<(Vec<BookingView>, Pagination), ServiceError> {
        let status = parse_status_filter(query.status)?;
        let page = PageRequest::from_params(
            query.page.as_deref(),
            query.limit.as_deref(),
            DEFAULT_PAGE_SIZE,
        );

        let (bookings, total) = self
            .db_client
            .get_user_bookings(&user.id, status, page.limit(), page.offset())
            .await?;

        Ok((bookings, Pagination::new(page.page, page.limit, total)))
    }

    pub async fn provider_bookings(
        &self,
        provider: &Provider,
        query: BookingListQuery,
    ) -> Result<(Vec<BookingView>, Pagination), ServiceError> {
        let status = parse_status_filter(query.status)?;
        let page = PageRequest::from_params(
            query.page.as_deref(),
            query.limit.as_deref(),
            DEFAULT_PAGE_SIZE,
        );

        let (bookings, total) = self
            .db_client
            .get_provider_bookings(provider.id, status, page.limit(), page.offset())
            .await?;

        Ok((bookings, Pagination::new(page.page, page.limit, total)))
    }

    pub async fn provider_stats(&self, provider: &Provider) -> Result<ProviderStatsDto, ServiceError> {
        let counts = self.db_client.get_booking_status_counts(provider.id).await?;

        let mut stats = ProviderStatsDto {
            rating: provider.rating,
            total_jobs: provider.total_jobs,
            is_verified: provider.is_verified,
            availability_status: provider.availability_status.to_str().to_string(),
            ..Default::default()
        };

        for StatusCount { status, count } in counts {
            stats.total_bookings += count;
            match status {
                BookingStatus::Pending => stats.pending = count,
                BookingStatus::Accepted => stats.accepted = count,
                BookingStatus::InProgress => stats.in_progress = count,
                BookingStatus::Completed => stats.completed = count,
                BookingStatus::Cancelled => stats.cancelled = count,
            }
        }

        Ok(stats)
    }

    /// Only the customer and the provider of a booking may read it.
    async fn ensure_party(&self, user: &User, booking: &Booking) -> Result<(), ServiceError> {
        if booking.user_id == user.id {
            return Ok(());
        }

        match self.db_client.get_provider_by_user(&user.id).await? {
            Some(provider) if provider.id == booking.provider_id => Ok(()),
            _ => Err(ServiceError::Forbidden(
                "Not authorized to view this booking".to_string(),
            )),
        }
    }
}

fn parse_status_filter(status: Option<String>) -> Result<Option<BookingStatus>, ServiceError> {
    match non_empty(status) {
        None => Ok(None),
        Some(value) => BookingStatus::parse(&value)
            .map(Some)
            .ok_or_else(|| ServiceError::Validation("Invalid status".to_string())),
    }
}
