// handlers/public/users.rs - account creation and token acquisition

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::{begin_write, UserRead};
use crate::error::ApiError;
use crate::handlers::utils::{validate_email_format, validate_password, ApiJson, ApiPath, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{identity, StoreError};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.check("email", validate_email_format(&self.email));
        errors.check("password", validate_password(&self.password));
        errors.into_result()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserRead,
}

/// POST /api/users/register - Create an account
///
/// Emails are matched exactly; a second registration with the same address is a 400.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<UserRead> {
    credentials.validate()?;

    let mut tx = begin_write(&state.db).await?;
    let user = identity::register(
        &mut tx,
        &state.passwords,
        &credentials.email,
        &credentials.password,
    )
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::created(user.into()))
}

/// POST /api/users/login - Exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<LoginResponse> {
    let mut conn = state.db.acquire().await?;
    let user = identity::authenticate(
        &mut conn,
        &state.passwords,
        &credentials.email,
        &credentials.password,
    )
    .await
    .map_err(|e| {
        if let StoreError::Unauthenticated(_) = e {
            tracing::warn!("Failed login attempt for {}", credentials.email);
        }
        e
    })?;

    let access_token = state.tokens.issue_token(&user.email)?;
    tracing::info!(
        "User {} logged in, token valid for {} minutes",
        user.id,
        state.tokens.ttl().num_minutes()
    );

    Ok(ApiResponse::success(LoginResponse {
        access_token,
        token_type: "bearer",
        user: user.into(),
    }))
}

/// GET /api/users/:id - Public profile lookup
pub async fn get_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<UserRead> {
    let mut conn = state.db.acquire().await?;
    let user = identity::find_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(user.into()))
}
