use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::author::Author;

/// A `books` row without its author links
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A book together with its linked authors, ordered by author id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub authors: Vec<Author>,
}

impl Book {
    pub fn from_parts(record: BookRecord, authors: Vec<Author>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            isbn: record.isbn,
            published_year: record.published_year,
            owner_id: record.owner_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            authors,
        }
    }

    #[cfg(test)]
    pub fn author_ids(&self) -> Vec<i64> {
        self.authors.iter().map(|a| a.id).collect()
    }
}
