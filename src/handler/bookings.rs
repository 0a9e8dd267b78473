use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{apidtos::ApiResponse, bookingdtos::*},
    error::HttpError,
    middleware::{authenticate, require_provider, AuthContext, ProviderContext},
    utils::params::parse_uuid,
    AppState,
};

pub fn bookings_handler() -> Router {
    let public = Router::new().route("/available-slots", get(get_available_slots));

    let authenticated = Router::new()
        .route("/", post(create_booking))
        .route("/my-bookings", get(get_my_bookings))
        .route("/:booking_id", get(get_booking))
        .route("/:booking_id/tracking", get(get_booking_tracking))
        .route("/:booking_id/cancel", patch(cancel_booking))
        .route_layer(middleware::from_fn(authenticate));

    let provider_only = Router::new()
        .route("/provider-bookings", get(get_provider_bookings))
        .route("/:booking_id/status", patch(update_booking_status))
        .route_layer(middleware::from_fn(require_provider))
        .route_layer(middleware::from_fn(authenticate));

    public.merge(authenticated).merge(provider_only)
}

fn booking_id_param(raw: &str) -> Result<Uuid, HttpError> {
    parse_uuid(raw).ok_or_else(|| HttpError::bad_request("Invalid booking ID"))
}

pub async fn get_available_slots(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let slots = app_state.booking_service.available_slots(query).await?;

    Ok(Json(ApiResponse::success(
        "Available slots fetched successfully",
        slots,
    )))
}

pub async fn create_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateBookingDto>,
) -> Result<impl IntoResponse, HttpError> {
    let booking = app_state
        .booking_service
        .create_booking(&auth.user, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Booking created successfully", booking)),
    ))
}

pub async fn get_my_bookings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let (bookings, pagination) = app_state
        .booking_service
        .my_bookings(&auth.user, query)
        .await?;

    Ok(Json(ApiResponse::paginated(
        "Bookings fetched successfully",
        bookings,
        pagination,
    )))
}

pub async fn get_provider_bookings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<ProviderContext>,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let (bookings, pagination) = app_state
        .booking_service
        .provider_bookings(&ctx.provider, query)
        .await?;

    Ok(Json(ApiResponse::paginated(
        "Bookings fetched successfully",
        bookings,
        pagination,
    )))
}

pub async fn get_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let booking_id = booking_id_param(&booking_id)?;
    let detail = app_state
        .booking_service
        .booking_detail(&auth.user, booking_id)
        .await?;

    Ok(Json(ApiResponse::success("Booking fetched successfully", detail)))
}

pub async fn get_booking_tracking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let booking_id = booking_id_param(&booking_id)?;
    let tracking = app_state
        .booking_service
        .tracking(&auth.user, booking_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Tracking history fetched successfully",
        tracking,
    )))
}

pub async fn update_booking_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<ProviderContext>,
    Path(booking_id): Path<String>,
    Json(body): Json<UpdateBookingStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let booking_id = booking_id_param(&booking_id)?;
    let booking = app_state
        .booking_service
        .update_status(&ctx.provider, booking_id, &body.status)
        .await?;

    Ok(Json(ApiResponse::success(
        "Booking status updated successfully",
        booking,
    )))
}

/// The cancel body is optional; when present it must be a valid JSON object.
fn cancellation_reason(body: &[u8]) -> Result<Option<String>, HttpError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let dto: CancelBookingDto = serde_json::from_slice(body)
        .map_err(|e| HttpError::bad_request(format!("Invalid request body: {}", e)))?;
    Ok(dto.reason)
}

pub async fn cancel_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(booking_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let booking_id = booking_id_param(&booking_id)?;
    let reason = cancellation_reason(&body)?;
    let booking = app_state
        .booking_service
        .cancel_booking(&auth.user, booking_id, reason)
        .await?;

    Ok(Json(ApiResponse::success("Booking cancelled successfully", booking)))
}
