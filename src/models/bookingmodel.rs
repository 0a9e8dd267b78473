use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every bookable slot of a day, in display order.
pub const TIME_SLOTS: [&str; 10] = [
    "09:00 AM",
    "10:00 AM",
    "11:00 AM",
    "12:00 PM",
    "01:00 PM",
    "02:00 PM",
    "03:00 PM",
    "04:00 PM",
    "05:00 PM",
    "06:00 PM",
];

pub const BOOKING_CREATED_MESSAGE: &str = "Booking created - Awaiting provider confirmation";
pub const CUSTOMER_CANCELLED_MESSAGE: &str = "Booking cancelled by customer";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Accepted,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.to_str() == value)
    }

    /// States a provider may move a booking into from `self`.
    pub fn allowed_transitions(&self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Pending => &[BookingStatus::Accepted, BookingStatus::Cancelled],
            BookingStatus::Accepted => &[BookingStatus::InProgress, BookingStatus::Cancelled],
            BookingStatus::InProgress => &[BookingStatus::Completed, BookingStatus::Cancelled],
            BookingStatus::Completed | BookingStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Only bookings the provider has not started yet can be withdrawn by the customer.
    pub fn customer_can_cancel(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Accepted)
    }

    /// Tracking line written when a provider moves a booking into `self`.
    pub fn tracking_message(&self) -> &'static str {
        match self {
            BookingStatus::Pending => BOOKING_CREATED_MESSAGE,
            BookingStatus::Accepted => "Booking accepted by provider",
            BookingStatus::InProgress => "Service is in progress",
            BookingStatus::Completed => "Service completed successfully",
            BookingStatus::Cancelled => "Booking has been cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "booking_urgency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub booking_date: NaiveDate,
    pub time_slot: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub urgency: Urgency,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking joined with the display fields of its service and both parties.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookingView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub service_title: String,
    pub service_price: f64,
    pub service_category: String,
    pub provider_name: Option<String>,
    pub provider_phone: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct BookingTracking {
    pub id: i64,
    pub booking_id: Uuid,
    pub status_text: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub booking_date: NaiveDate,
    pub time_slot: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub urgency: Urgency,
    pub notes: Option<String>,
}

/// Outcome of trying to claim a slot.
#[derive(Debug, Clone)]
pub enum SlotReservation {
    Reserved(BookingView),
    Taken,
}

/// Status change applied by the store as a compare-and-set on `from`.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub booking_id: Uuid,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub tracking_text: String,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: BookingStatus,
    pub count: i64,
}

pub fn is_known_slot(label: &str) -> bool {
    TIME_SLOTS.contains(&label)
}

/// Master slots minus the ones already held, keeping master order.
pub fn available_slots<S: AsRef<str>>(booked: &[S]) -> Vec<String> {
    TIME_SLOTS
        .iter()
        .filter(|slot| !booked.iter().any(|b| b.as_ref() == **slot))
        .map(|slot| slot.to_string())
        .collect()
}
