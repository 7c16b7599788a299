// handlers/protected/authors.rs - the shared author catalog
//
// Authors are global: any authenticated user may create, edit or remove them.

use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::{begin_write, Author};
use crate::error::ApiError;
use crate::handlers::utils::{
    resolve_caller, validate_required_text, ApiJson, ApiPath, ApiQuery, FieldErrors, PageQuery,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::authors::{self, AuthorUpdate};

#[derive(Debug, Deserialize)]
pub struct AuthorCreate {
    pub name: String,
    pub biography: Option<String>,
}

fn validate_name(name: Option<&str>) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    if let Some(name) = name {
        errors.check("name", validate_required_text(name, "Name"));
    }
    errors.into_result()
}

/// POST /api/authors - Add an author; an exact name match is a 400
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(payload): ApiJson<AuthorCreate>,
) -> ApiResult<Author> {
    validate_name(Some(&payload.name))?;

    let mut tx = begin_write(&state.db).await?;
    resolve_caller(&mut tx, &auth).await?;
    let author = authors::create_author(&mut tx, &payload.name, payload.biography.as_deref()).await?;
    tx.commit().await?;

    Ok(ApiResponse::created(author))
}

/// GET /api/authors?skip=&limit=
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Vec<Author>> {
    let page = query.into_page(&state.config.api)?;

    let mut conn = state.db.acquire().await?;
    resolve_caller(&mut conn, &auth).await?;
    let authors = authors::list_authors(&mut conn, page).await?;

    Ok(ApiResponse::success(authors))
}

/// GET /api/authors/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Author> {
    let mut conn = state.db.acquire().await?;
    resolve_caller(&mut conn, &auth).await?;
    let author = authors::get_author(&mut conn, id).await?;

    Ok(ApiResponse::success(author))
}

/// PUT /api/authors/:id - Partial update; absent fields are left alone
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<AuthorUpdate>,
) -> ApiResult<Author> {
    validate_name(changes.name.as_deref())?;

    let mut tx = begin_write(&state.db).await?;
    resolve_caller(&mut tx, &auth).await?;
    let author = authors::update_author(&mut tx, id, changes).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(author))
}

/// DELETE /api/authors/:id - Books keep existing, only their links go
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    let mut tx = begin_write(&state.db).await?;
    resolve_caller(&mut tx, &auth).await?;
    authors::delete_author(&mut tx, id).await?;
    tx.commit().await?;

    Ok(ApiResponse::no_content())
}
