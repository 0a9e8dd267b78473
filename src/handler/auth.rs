use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dtos::{apidtos::ApiResponse, userdtos::*},
    error::HttpError,
    middleware::{authenticate, require_provider, AuthContext, ProviderContext},
    models::usermodel::AvailabilityStatus,
    service::error::ServiceError,
    utils::params::{clearable, non_empty},
    AppState,
};

pub fn auth_handler() -> Router {
    let public = Router::new()
        .route("/", get(auth_index))
        .route("/sync-user", post(sync_user));

    let authenticated = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/become-provider", post(become_provider))
        .route_layer(middleware::from_fn(authenticate));

    let provider_only = Router::new()
        .route("/provider/availability", patch(update_availability))
        .route("/provider/stats", get(provider_stats))
        .route_layer(middleware::from_fn(require_provider))
        .route_layer(middleware::from_fn(authenticate));

    public.merge(authenticated).merge(provider_only)
}

pub async fn auth_index() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "Auth API endpoints",
        "endpoints": {
            "info": "GET /api/auth",
            "syncUser": "POST /api/auth/sync-user",
            "getProfile": "GET /api/auth/profile",
            "updateProfile": "PUT /api/auth/profile",
            "becomeProvider": "POST /api/auth/become-provider",
            "updateAvailability": "PATCH /api/auth/provider/availability",
            "getProviderStats": "GET /api/auth/provider/stats"
        }
    }))
}

pub async fn sync_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<SyncUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .upsert_user(
            body.id.trim(),
            non_empty(body.name),
            non_empty(body.email),
            non_empty(body.image),
        )
        .await?;

    tracing::info!(user_id = %user.id, "user synced");
    Ok(Json(ApiResponse::success("User synced successfully!", user)))
}

pub async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, HttpError> {
    let provider = app_state
        .db_client
        .get_provider_by_user(&auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Profile fetched successfully!",
        ProfileResponseDto {
            user: auth.user,
            provider,
        },
    )))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .update_user_profile(
            &auth.user.id,
            non_empty(body.name),
            clearable(body.phone),
            clearable(body.avatar_url),
        )
        .await?;

    Ok(Json(ApiResponse::success("Profile updated successfully!", user)))
}

pub async fn become_provider(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, HttpError> {
    let existing = app_state
        .db_client
        .get_provider_by_user(&auth.user.id)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::AlreadyProvider.into());
    }

    let provider = match app_state.db_client.create_provider(&auth.user.id).await {
        Ok(provider) => provider,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(ServiceError::AlreadyProvider.into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %auth.user.id, provider_id = %provider.id, "user registered as provider");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Successfully registered as a provider!",
            provider,
        )),
    ))
}

pub async fn update_availability(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<ProviderContext>,
    Json(body): Json<UpdateAvailabilityDto>,
) -> Result<impl IntoResponse, HttpError> {
    let status = AvailabilityStatus::parse(body.availability_status.trim()).ok_or_else(|| {
        HttpError::bad_request("Invalid availability status. Use: available, busy, or offline")
    })?;

    let provider = app_state
        .db_client
        .update_provider_availability(ctx.provider.id, status)
        .await?;

    Ok(Json(ApiResponse::success(
        "Availability updated successfully!",
        provider,
    )))
}

pub async fn provider_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<ProviderContext>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state
        .booking_service
        .provider_stats(&ctx.provider)
        .await?;

    Ok(Json(ApiResponse::success(
        "Provider stats fetched successfully!",
        stats,
    )))
}
