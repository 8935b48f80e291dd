//! Bearer-token extractors.
//!
//! Both run on request parts only, so they reject before any JSON body is
//! parsed.

use crate::api::models::{AppError, AppState};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

/// The caller behind a valid bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub is_admin: bool,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Expected a Bearer token".to_string()))?;

        let claims = state.tokens.verify(token).map_err(|e| {
            warn!(error = %e, path = %parts.uri.path(), "Rejected bearer token");
            AppError::from(e)
        })?;

        Ok(Self {
            user_id: claims.sub,
            is_admin: claims.is_admin,
        })
    }
}

/// A caller whose token carries the admin claim
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            warn!(user_id = %user.user_id, path = %parts.uri.path(), "Admin route refused");
            return Err(AppError::Forbidden("Admin privileges required".to_string()));
        }
        Ok(Self(user))
    }
}
