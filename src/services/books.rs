use chrono::Utc;
use serde::Deserialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use std::collections::BTreeMap;

use crate::database::{Author, Book, BookRecord};
use crate::services::error::{unique_violation_as, StoreError, StoreResult};
use crate::services::Page;

pub const ISBN_TAKEN: &str = "Book with this ISBN already exists";
pub const BOOK_NOT_FOUND: &str = "Book not found";

const BOOK_COLUMNS: &str =
    "id, title, description, isbn, published_year, owner_id, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub author_ids: Option<Vec<i64>>,
}

/// Partial update. `author_ids: Some(..)` replaces the whole link set, even when empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub author_ids: Option<Vec<i64>>,
}

#[derive(FromRow)]
struct LinkedAuthor {
    book_id: i64,
    #[sqlx(flatten)]
    author: Author,
}

/// Create a book owned by `owner_id`.
///
/// Author ids that match no author are dropped from the link set rather than rejected.
pub async fn create_book(conn: &mut SqliteConnection, owner_id: i64, new: NewBook) -> StoreResult<Book> {
    let isbn = normalize_isbn(new.isbn);
    if let Some(isbn) = &isbn {
        if isbn_taken(conn, isbn, None).await? {
            return Err(StoreError::conflict(ISBN_TAKEN));
        }
    }

    let now = Utc::now();
    let record = sqlx::query_as::<_, BookRecord>(&format!(
        "INSERT INTO books (title, description, isbn, published_year, owner_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING {BOOK_COLUMNS}"
    ))
    .bind(&new.title)
    .bind(&new.description)
    .bind(&isbn)
    .bind(new.published_year)
    .bind(owner_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| unique_violation_as(e, ISBN_TAKEN))?;

    if let Some(author_ids) = &new.author_ids {
        replace_authors(conn, record.id, author_ids).await?;
    }

    tracing::debug!("Created book {} for user {}", record.id, owner_id);
    with_authors(conn, record).await
}

/// The caller's books only
pub async fn list_books(conn: &mut SqliteConnection, owner_id: i64, page: Page) -> StoreResult<Vec<Book>> {
    let records = sqlx::query_as::<_, BookRecord>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE owner_id = ? ORDER BY id LIMIT ? OFFSET ?"
    ))
    .bind(owner_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&mut *conn)
    .await?;

    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    let mut authors = load_authors(conn, &ids).await?;

    Ok(records
        .into_iter()
        .map(|record| {
            let linked = authors.remove(&record.id).unwrap_or_default();
            Book::from_parts(record, linked)
        })
        .collect())
}

/// Every book the owner has
pub async fn all_books(conn: &mut SqliteConnection, owner_id: i64) -> StoreResult<Vec<Book>> {
    // LIMIT -1 means no limit in SQLite
    list_books(conn, owner_id, Page::new(0, -1)).await
}

pub async fn get_book(conn: &mut SqliteConnection, owner_id: i64, id: i64) -> StoreResult<Book> {
    let record = find_owned(conn, owner_id, id).await?;
    with_authors(conn, record).await
}

pub async fn update_book(
    conn: &mut SqliteConnection,
    owner_id: i64,
    id: i64,
    changes: BookUpdate,
) -> StoreResult<Book> {
    let mut record = find_owned(conn, owner_id, id).await?;

    if let Some(title) = changes.title {
        record.title = title;
    }
    if let Some(description) = changes.description {
        record.description = Some(description);
    }
    if let Some(isbn) = changes.isbn {
        // A blank ISBN clears it
        let isbn = normalize_isbn(Some(isbn));
        if let Some(isbn) = &isbn {
            if isbn_taken(conn, isbn, Some(id)).await? {
                return Err(StoreError::conflict(ISBN_TAKEN));
            }
        }
        record.isbn = isbn;
    }
    if let Some(year) = changes.published_year {
        record.published_year = Some(year);
    }

    let record = sqlx::query_as::<_, BookRecord>(&format!(
        "UPDATE books
         SET title = ?, description = ?, isbn = ?, published_year = ?, updated_at = ?
         WHERE id = ? AND owner_id = ?
         RETURNING {BOOK_COLUMNS}"
    ))
    .bind(&record.title)
    .bind(&record.description)
    .bind(&record.isbn)
    .bind(record.published_year)
    .bind(Utc::now())
    .bind(id)
    .bind(owner_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| unique_violation_as(e, ISBN_TAKEN))?;

    if let Some(author_ids) = &changes.author_ids {
        replace_authors(conn, id, author_ids).await?;
    }

    with_authors(conn, record).await
}

/// Remove one of the caller's books; its links cascade.
pub async fn delete_book(conn: &mut SqliteConnection, owner_id: i64, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM books WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(BOOK_NOT_FOUND));
    }
    Ok(())
}

/// Id and owner are matched in one query, so another user's book looks exactly like a
/// missing one.
async fn find_owned(conn: &mut SqliteConnection, owner_id: i64, id: i64) -> StoreResult<BookRecord> {
    sqlx::query_as::<_, BookRecord>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| StoreError::not_found(BOOK_NOT_FOUND))
}

async fn isbn_taken(conn: &mut SqliteConnection, isbn: &str, excluding: Option<i64>) -> StoreResult<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = ? AND (? IS NULL OR id != ?))",
    )
    .bind(isbn)
    .bind(excluding)
    .bind(excluding)
    .fetch_one(&mut *conn)
    .await?;
    Ok(taken)
}

/// Drop every link of `book_id`, then link it to whichever of `author_ids` exist.
async fn replace_authors(conn: &mut SqliteConnection, book_id: i64, author_ids: &[i64]) -> StoreResult<()> {
    sqlx::query("DELETE FROM book_authors WHERE book_id = ?")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;

    if author_ids.is_empty() {
        return Ok(());
    }

    // Selecting from authors resolves the ids and collapses duplicates in one step.
    let mut query = QueryBuilder::<Sqlite>::new("INSERT INTO book_authors (book_id, author_id) SELECT ");
    query.push_bind(book_id);
    query.push(", id FROM authors WHERE id IN (");
    let mut ids = query.separated(", ");
    for author_id in author_ids {
        ids.push_bind(*author_id);
    }
    ids.push_unseparated(")");

    let linked = query.build().execute(&mut *conn).await?.rows_affected();
    if linked < author_ids.len() as u64 {
        tracing::debug!(
            "Book {}: linked {} of {} requested authors",
            book_id,
            linked,
            author_ids.len()
        );
    }
    Ok(())
}

async fn with_authors(conn: &mut SqliteConnection, record: BookRecord) -> StoreResult<Book> {
    let mut authors = load_authors(conn, &[record.id]).await?;
    let linked = authors.remove(&record.id).unwrap_or_default();
    Ok(Book::from_parts(record, linked))
}

/// Linked authors per book id, each list ordered by author id
async fn load_authors(conn: &mut SqliteConnection, book_ids: &[i64]) -> StoreResult<BTreeMap<i64, Vec<Author>>> {
    let mut by_book: BTreeMap<i64, Vec<Author>> = BTreeMap::new();
    if book_ids.is_empty() {
        return Ok(by_book);
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT ba.book_id, a.id, a.name, a.biography, a.created_at
         FROM book_authors ba JOIN authors a ON a.id = ba.author_id
         WHERE ba.book_id IN (",
    );
    let mut ids = query.separated(", ");
    for book_id in book_ids {
        ids.push_bind(*book_id);
    }
    ids.push_unseparated(") ORDER BY ba.book_id, a.id");

    let rows = query.build_query_as::<LinkedAuthor>().fetch_all(&mut *conn).await?;
    for row in rows {
        by_book.entry(row.book_id).or_default().push(row.author);
    }
    Ok(by_book)
}

fn normalize_isbn(isbn: Option<String>) -> Option<String> {
    isbn.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
