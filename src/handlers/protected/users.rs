use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::{begin_write, UserProfile};
use crate::handlers::utils::resolve_caller;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{books, identity};

/// GET /api/users/me - The token holder's own account, with their books
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<UserProfile> {
    let mut conn = state.db.acquire().await?;
    let user = resolve_caller(&mut conn, &auth).await?;
    let books = books::all_books(&mut conn, user.id).await?;

    Ok(ApiResponse::success(UserProfile {
        user: user.into(),
        books,
    }))
}

/// DELETE /api/users/me - Close the account, taking its books, links and preferences with it
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<()> {
    let mut tx = begin_write(&state.db).await?;
    let user = resolve_caller(&mut tx, &auth).await?;
    identity::delete_user(&mut tx, user.id).await?;
    tx.commit().await?;

    Ok(ApiResponse::no_content())
}
