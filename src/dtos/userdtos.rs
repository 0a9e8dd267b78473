use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::usermodel::*;

/// Payload sent by the sign-in callback of the identity provider.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct SyncUserDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "User ID is required"))]
    pub id: String,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    pub email: Option<String>,

    /// Avatar url, named after the identity provider's field.
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    /// An empty string clears the stored number.
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    /// An empty string clears the stored avatar.
    pub avatar_url: Option<String>,
}

fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    let len = phone.trim().chars().count();
    if len == 0 || (7..=20).contains(&len) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("phone");
        err.message = Some("Phone must be between 7 and 20 characters".into());
        Err(err)
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct UpdateAvailabilityDto {
    #[serde(default)]
    pub availability_status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponseDto {
    #[serde(flatten)]
    pub user: User,
    pub provider: Option<Provider>,
}

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct ProviderStatsDto {
    pub total_bookings: i64,
    pub pending: i64,
    pub accepted: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub rating: f64,
    pub total_jobs: i32,
    pub is_verified: bool,
    pub availability_status: String,
}
