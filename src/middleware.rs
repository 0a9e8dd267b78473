use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ErrorMessage, HttpError},
    models::usermodel::{Provider, User, UserRole},
    AppState,
};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity resolved for the current request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthContext {
    pub user: User,
}

/// Present only on routes guarded by [`require_provider`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderContext {
    pub user: User,
    pub provider: Provider,
}

/// The explicit `x-user-id` header wins over a bearer token.
pub fn identity_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_owned())
                .filter(|token| !token.is_empty())
        })
}

pub async fn authenticate(
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = identity_from_headers(req.headers())
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::MissingUserId.to_string()))?;

    let user = match app_state.db_client.get_user(&user_id).await? {
        Some(user) => user,
        None if app_state.env.auto_provision_users => {
            tracing::info!(%user_id, "provisioning unknown user");
            app_state.db_client.provision_user(&user_id).await?
        }
        None => {
            tracing::warn!(%user_id, "request from unknown user");
            return Err(HttpError::unauthorized(ErrorMessage::UserNotFound.to_string()));
        }
    };

    req.extensions_mut().insert(AuthContext { user });

    Ok(next.run(req).await)
}

pub async fn require_provider(
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    if auth.user.role != UserRole::Provider {
        return Err(HttpError::forbidden(ErrorMessage::ProviderAccessRequired.to_string()));
    }

    let provider = app_state
        .db_client
        .get_provider_by_user(&auth.user.id)
        .await?
        .ok_or_else(|| HttpError::forbidden(ErrorMessage::ProviderProfileNotFound.to_string()))?;

    req.extensions_mut().insert(ProviderContext {
        user: auth.user,
        provider,
    });

    Ok(next.run(req).await)
}
