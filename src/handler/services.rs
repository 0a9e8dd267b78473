use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{apidtos::ApiResponse, servicedtos::*},
    error::HttpError,
    middleware::{authenticate, require_provider, ProviderContext},
    utils::params::parse_uuid,
    AppState,
};

pub fn services_handler() -> Router {
    let public = Router::new()
        .route("/", get(list_services))
        .route("/categories", get(list_categories))
        .route("/provider/:provider_id", get(get_services_by_provider))
        .route("/:service_id", get(get_service));

    let provider_only = Router::new()
        .route("/", post(create_service))
        .route("/my-services", get(get_my_services))
        .route("/:service_id", put(update_service).delete(delete_service))
        .route_layer(middleware::from_fn(require_provider))
        .route_layer(middleware::from_fn(authenticate));

    public.merge(provider_only)
}

fn service_id_param(raw: &str) -> Result<Uuid, HttpError> {
    parse_uuid(raw).ok_or_else(|| HttpError::bad_request("Invalid service ID"))
}

pub async fn list_services(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(filter): Query<ServiceFilterDto>,
) -> Result<impl IntoResponse, HttpError> {
    let (services, pagination) = app_state.catalog_service.list_services(filter).await?;

    Ok(Json(ApiResponse::paginated(
        "Services fetched successfully",
        services,
        pagination,
    )))
}

pub async fn list_categories(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let categories = app_state.catalog_service.categories().await?;

    Ok(Json(ApiResponse::success(
        "Categories fetched successfully",
        categories,
    )))
}

pub async fn get_service(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(service_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let service_id = service_id_param(&service_id)?;
    let service = app_state.catalog_service.service_detail(service_id).await?;

    Ok(Json(ApiResponse::success("Service fetched successfully", service)))
}

pub async fn get_services_by_provider(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let provider_id =
        parse_uuid(&provider_id).ok_or_else(|| HttpError::bad_request("Invalid provider ID"))?;
    let services = app_state
        .catalog_service
        .services_by_provider(provider_id)
        .await?;

    Ok(Json(ApiResponse::success("Services fetched successfully", services)))
}

pub async fn get_my_services(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<ProviderContext>,
) -> Result<impl IntoResponse, HttpError> {
    let services = app_state.catalog_service.my_services(&ctx.provider).await?;

    Ok(Json(ApiResponse::success("Services fetched successfully", services)))
}

pub async fn create_service(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<ProviderContext>,
    Json(body): Json<CreateServiceDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = app_state
        .catalog_service
        .create_service(&ctx.provider, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Service created successfully", service)),
    ))
}

pub async fn update_service(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<ProviderContext>,
    Path(service_id): Path<String>,
    Json(body): Json<UpdateServiceDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service_id = service_id_param(&service_id)?;
    let service = app_state
        .catalog_service
        .update_service(&ctx.provider, service_id, body)
        .await?;

    Ok(Json(ApiResponse::success("Service updated successfully", service)))
}

pub async fn delete_service(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<ProviderContext>,
    Path(service_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let service_id = service_id_param(&service_id)?;
    app_state
        .catalog_service
        .delete_service(&ctx.provider, service_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Service deleted successfully",
        serde_json::json!({ "id": service_id }),
    )))
}
