use serde::{Deserialize, Serialize};
use validator::Validate;

/// Raw catalog query string. Values are parsed leniently and fall back to defaults.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ServiceFilterDto {
    pub category: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct CreateServiceDto {
    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "Title is required"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 2000, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[validate(
        required(message = "Price is required"),
        range(min = 0.0, message = "Price must be positive")
    )]
    pub price: Option<f64>,

    pub location: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct UpdateServiceDto {
    #[validate(length(min = 1, max = 150, message = "Title cannot be empty"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 2000, message = "Description cannot be empty"))]
    pub description: Option<String>,

    pub category: Option<String>,

    #[validate(range(min = 0.0, message = "Price must be positive"))]
    pub price: Option<f64>,

    pub location: Option<String>,

    pub is_active: Option<bool>,
}
