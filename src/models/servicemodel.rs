use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_SERVICE_PAGE_SIZE: u32 = 12;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub icon: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
}

/// A listing joined with the public profile of the provider offering it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServiceView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub service: Service,
    pub provider_name: Option<String>,
    pub provider_avatar_url: Option<String>,
    pub provider_rating: f64,
    pub provider_is_verified: bool,
}

/// Fields an owner may change; `None` keeps the stored value.
/// `location: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ServicePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub location: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Columns a catalog listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceSort {
    #[default]
    CreatedAt,
    Price,
    Title,
}

impl ServiceSort {
    /// Unknown fields fall back to `created_at`.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("price") => ServiceSort::Price,
            Some("title") => ServiceSort::Title,
            _ => ServiceSort::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            ServiceSort::CreatedAt => "s.created_at",
            ServiceSort::Price => "s.price",
            ServiceSort::Title => "s.title",
        }
    }
}

/// Normalized catalog filter, ready to be turned into one store query.
#[derive(Debug, Clone, Default)]
pub struct ServiceQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort: ServiceSort,
    pub ascending: bool,
    pub limit: i64,
    pub offset: i64,
}
