use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_THEME: &str = "dark";
pub const DEFAULT_FONT_SCALE: f64 = 1.0;

/// Per-user display settings, materialized on first access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Preference {
    pub id: i64,
    pub user_id: i64,
    pub theme: String,
    pub font_scale: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
