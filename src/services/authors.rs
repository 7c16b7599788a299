use chrono::Utc;
use serde::Deserialize;
use sqlx::SqliteConnection;

use crate::database::Author;
use crate::services::error::{StoreError, StoreResult};
use crate::services::Page;

pub const AUTHOR_EXISTS: &str = "Author already exists";
pub const AUTHOR_NOT_FOUND: &str = "Author not found";

const AUTHOR_COLUMNS: &str = "id, name, biography, created_at";

/// Partial update; `None` leaves the field alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorUpdate {
    pub name: Option<String>,
    pub biography: Option<String>,
}

/// Insert an author unless one with the exact same name exists.
///
/// The duplicate check lives inside the INSERT itself. Run it in a unit of work opened
/// with [`begin_write`](crate::database::begin_write): that holds the write lock from the
/// start, so a racing creation waits for the winner's commit and then sees its row. Under
/// a deferred transaction the loser would fail on a stale snapshot instead.
pub async fn create_author(
    conn: &mut SqliteConnection,
    name: &str,
    biography: Option<&str>,
) -> StoreResult<Author> {
    let author = sqlx::query_as::<_, Author>(&format!(
        "INSERT INTO authors (name, biography, created_at)
         SELECT ?, ?, ?
         WHERE NOT EXISTS (SELECT 1 FROM authors WHERE name = ?)
         RETURNING {AUTHOR_COLUMNS}"
    ))
    .bind(name)
    .bind(biography)
    .bind(Utc::now())
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    author.ok_or_else(|| StoreError::conflict(AUTHOR_EXISTS))
}

pub async fn list_authors(conn: &mut SqliteConnection, page: Page) -> StoreResult<Vec<Author>> {
    let authors = sqlx::query_as::<_, Author>(&format!(
        "SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY id LIMIT ? OFFSET ?"
    ))
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&mut *conn)
    .await?;
    Ok(authors)
}

pub async fn get_author(conn: &mut SqliteConnection, id: i64) -> StoreResult<Author> {
    sqlx::query_as::<_, Author>(&format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| StoreError::not_found(AUTHOR_NOT_FOUND))
}

/// Apply the present fields. Renames are not checked against other authors.
pub async fn update_author(
    conn: &mut SqliteConnection,
    id: i64,
    changes: AuthorUpdate,
) -> StoreResult<Author> {
    let mut author = get_author(conn, id).await?;
    if let Some(name) = changes.name {
        author.name = name;
    }
    if let Some(biography) = changes.biography {
        author.biography = Some(biography);
    }

    let author = sqlx::query_as::<_, Author>(&format!(
        "UPDATE authors SET name = ?, biography = ? WHERE id = ? RETURNING {AUTHOR_COLUMNS}"
    ))
    .bind(&author.name)
    .bind(&author.biography)
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(author)
}

/// Remove an author; its book links cascade, the books stay.
pub async fn delete_author(conn: &mut SqliteConnection, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM authors WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found(AUTHOR_NOT_FOUND));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::books::{self, NewBook};
    use crate::testing::{count, TestContext};

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let ctx = TestContext::new().await.unwrap();
        let mut conn = ctx.pool.acquire().await.unwrap();

        let tolkien = create_author(&mut conn, "Tolkien", Some("Philologist")).await.unwrap();
        assert_eq!(tolkien.name, "Tolkien");
        assert_eq!(tolkien.biography.as_deref(), Some("Philologist"));

        let err = create_author(&mut conn, "Tolkien", None).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref m) if m == AUTHOR_EXISTS));
        assert_eq!(count(&mut conn, "authors").await.unwrap(), 1);

        // exact match only
        create_author(&mut conn, "tolkien", None).await.unwrap();
    }

    #[tokio::test]
    async fn list_is_ordered_and_windowed() {
        let ctx = TestContext::new().await.unwrap();
        let mut conn = ctx.pool.acquire().await.unwrap();
        for name in ["C", "A", "B"] {
            create_author(&mut conn, name, None).await.unwrap();
        }

        let all = list_authors(&mut conn, Page::new(0, 10)).await.unwrap();
        let names: Vec<&str> = all.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(all, list_authors(&mut conn, Page::new(0, 10)).await.unwrap());

        let window = list_authors(&mut conn, Page::new(1, 1)).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].name, "A");
    }

    #[tokio::test]
    async fn update_applies_present_fields_without_recheck() {
        let ctx = TestContext::new().await.unwrap();
        let mut conn = ctx.pool.acquire().await.unwrap();
        create_author(&mut conn, "Tolkien", None).await.unwrap();
        let lewis = create_author(&mut conn, "Lewis", Some("Inkling")).await.unwrap();

        let renamed = update_author(
            &mut conn,
            lewis.id,
            AuthorUpdate { name: Some("Tolkien".into()), biography: None },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Tolkien");
        assert_eq!(renamed.biography.as_deref(), Some("Inkling"));
        assert_eq!(renamed.created_at, lewis.created_at);
    }

    #[tokio::test]
    async fn missing_author_is_not_found() {
        let ctx = TestContext::new().await.unwrap();
        let mut conn = ctx.pool.acquire().await.unwrap();

        assert!(matches!(get_author(&mut conn, 9).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            update_author(&mut conn, 9, AuthorUpdate::default()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(delete_author(&mut conn, 9).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_keeps_books() {
        let ctx = TestContext::new().await.unwrap();
        let mut conn = ctx.pool.acquire().await.unwrap();
        let owner = ctx.user(&mut conn, "a@x.com").await.unwrap();
        let author = create_author(&mut conn, "Tolkien", None).await.unwrap();
        let book = books::create_book(
            &mut conn,
            owner.id,
            NewBook {
                title: "The Hobbit".into(),
                author_ids: Some(vec![author.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        delete_author(&mut conn, author.id).await.unwrap();

        let book = books::get_book(&mut conn, owner.id, book.id).await.unwrap();
        assert!(book.authors.is_empty());
        assert_eq!(count(&mut conn, "book_authors").await.unwrap(), 0);
    }
}
