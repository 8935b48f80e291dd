use crate::api::models::*;
use crate::auth::{AuthError, hash_password, verify_password};
use crate::storage::{StorageError, UserRecord};
use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, warn};

/// Argon2 is deliberately slow; keep it off the async workers
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Password task failed: {}", e)))?
        .map_err(AppError::from)
}

pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    // Validate
    let registration = request.validate().map_err(AppError::BadRequest)?;

    if state.store.find_user_by_email(&registration.email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let is_admin = state
        .admin_policy
        .grants_admin(&registration.email, registration.requested_admin);

    let password = registration.password;
    let password_hash = blocking(move || hash_password(&password)).await?;

    let user = UserRecord::new(registration.name, registration.email, password_hash, is_admin);

    // The unique index catches a concurrent registration that slipped past the lookup
    state.store.insert_user(&user).await.map_err(|e| match e {
        StorageError::Duplicate(_) => AppError::BadRequest("Email already registered".to_string()),
        other => other.into(),
    })?;

    let user_id = user.id.to_hex();
    let token = state.tokens.issue(&user_id, user.is_admin)?;

    info!(user_id = %user_id, is_admin = user.is_admin, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(request.email.as_deref());
    let password = request.password.unwrap_or_default();

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!("Login for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    let stored_hash = user.password_hash.clone();
    if let Err(e) = blocking(move || verify_password(&password, &stored_hash)).await {
        warn!(user_id = %user.id, "Login with wrong password");
        return Err(e);
    }

    let user_id = user.id.to_hex();
    let token = state.tokens.issue(&user_id, user.is_admin)?;

    info!(user_id = %user_id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}
