// handlers/protected/books.rs - the caller's own books
//
// Every lookup is scoped to the caller. Someone else's book id answers exactly like a
// missing one.

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::{begin_write, Book};
use crate::error::ApiError;
use crate::handlers::utils::{
    resolve_caller, validate_required_text, ApiJson, ApiPath, ApiQuery, FieldErrors, PageQuery,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::books::{self, BookUpdate, NewBook};

fn validate_title(title: Option<&str>) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    if let Some(title) = title {
        errors.check("title", validate_required_text(title, "Title"));
    }
    errors.into_result()
}

/// POST /api/books - Add a book owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(payload): ApiJson<NewBook>,
) -> ApiResult<Book> {
    validate_title(Some(&payload.title))?;

    let mut tx = begin_write(&state.db).await?;
    let owner = resolve_caller(&mut tx, &auth).await?;
    let book = books::create_book(&mut tx, owner.id, payload).await?;
    tx.commit().await?;

    tracing::debug!("User {} created book {}", owner.id, book.id);
    Ok(ApiResponse::created(book))
}

/// GET /api/books?skip=&limit=
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Vec<Book>> {
    let page = query.into_page(&state.config.api)?;

    let mut conn = state.db.acquire().await?;
    let owner = resolve_caller(&mut conn, &auth).await?;
    let books = books::list_books(&mut conn, owner.id, page).await?;

    Ok(ApiResponse::success(books))
}

/// GET /api/books/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Book> {
    let mut conn = state.db.acquire().await?;
    let owner = resolve_caller(&mut conn, &auth).await?;
    let book = books::get_book(&mut conn, owner.id, id).await?;

    Ok(ApiResponse::success(book))
}

/// PUT /api/books/:id - Partial update. `author_ids`, when present, replaces the whole set.
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<BookUpdate>,
) -> ApiResult<Book> {
    validate_title(changes.title.as_deref())?;

    let mut tx = begin_write(&state.db).await?;
    let owner = resolve_caller(&mut tx, &auth).await?;
    let book = books::update_book(&mut tx, owner.id, id, changes).await?;
    tx.commit().await?;

    Ok(ApiResponse::success(book))
}

/// DELETE /api/books/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    let mut tx = begin_write(&state.db).await?;
    let owner = resolve_caller(&mut tx, &auth).await?;
    books::delete_book(&mut tx, owner.id, id).await?;
    tx.commit().await?;

    tracing::debug!("User {} deleted book {}", owner.id, id);
    Ok(ApiResponse::no_content())
}
