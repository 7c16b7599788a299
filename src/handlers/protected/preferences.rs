use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::{begin_write, Preference};
use crate::handlers::utils::{resolve_caller, validate_font_scale, ApiJson, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::preferences::{self, PreferenceUpdate};

/// GET /api/preferences/me - Defaults are written on first read
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Preference> {
    let mut tx = begin_write(&state.db).await?;
    let user = resolve_caller(&mut tx, &auth).await?;
    let preference = preferences::get_or_create(&mut tx, user.id).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(preference))
}

/// PUT /api/preferences/me - Partial update; the theme is free-form
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(changes): ApiJson<PreferenceUpdate>,
) -> ApiResult<Preference> {
    let mut errors = FieldErrors::new();
    if let Some(scale) = changes.font_scale {
        errors.check("font_scale", validate_font_scale(scale));
    }
    errors.into_result()?;

    let mut tx = begin_write(&state.db).await?;
    let user = resolve_caller(&mut tx, &auth).await?;
    let preference = preferences::update(&mut tx, user.id, changes).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(preference))
}
