use serde::{Deserialize, Serialize};

use crate::models::bookingmodel::*;

/// Booking request body. Required fields are optional here so that their absence
/// is reported with the booking-specific message instead of a deserialization error.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct CreateBookingDto {
    pub service_id: Option<String>,
    pub booking_date: Option<String>,
    pub time_slot: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub urgency: Option<Urgency>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AvailableSlotsQuery {
    pub service_id: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct UpdateBookingStatusDto {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CancelBookingDto {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingDetailDto {
    #[serde(flatten)]
    pub booking: BookingView,
    pub tracking: Vec<BookingTracking>,
}
