use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{error::HttpError, models::bookingmodel::BookingStatus};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service not found")]
    ServiceNotFound(Uuid),

    #[error("Booking not found")]
    BookingNotFound(Uuid),

    #[error("Category not found")]
    CategoryNotFound(String),

    #[error("This service is currently unavailable")]
    ServiceUnavailable(Uuid),

    #[error("This time slot is already booked")]
    SlotTaken,

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("Cannot cancel a booking with status: {0}")]
    NotCancellable(BookingStatus),

    #[error("Booking {0} was updated by another request, reload and retry")]
    StaleBooking(Uuid),

    #[error("Cannot delete service with active bookings")]
    ServiceHasActiveBookings(Uuid),

    #[error("Already registered as a provider")]
    AlreadyProvider,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::ServiceNotFound(_)
            | ServiceError::BookingNotFound(_)
            | ServiceError::CategoryNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::ServiceUnavailable(_)
            | ServiceError::InvalidTransition { .. }
            | ServiceError::NotCancellable(_)
            | ServiceError::ServiceHasActiveBookings(_)
            | ServiceError::AlreadyProvider
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::SlotTaken | ServiceError::StaleBooking(_) => StatusCode::CONFLICT,

            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Database(e) => HttpError::from(e),
            other => HttpError::new(other.to_string(), other.status_code()),
        }
    }
}
