use chrono::Utc;
use serde::Deserialize;
use sqlx::SqliteConnection;

use crate::database::models::preference::{DEFAULT_FONT_SCALE, DEFAULT_THEME};
use crate::database::Preference;
use crate::services::error::StoreResult;

const PREFERENCE_COLUMNS: &str = "id, user_id, theme, font_scale, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceUpdate {
    pub theme: Option<String>,
    pub font_scale: Option<f64>,
}

/// Return the user's preferences, writing the defaults first if there is no row yet.
/// Calling it again never creates a second row.
pub async fn get_or_create(conn: &mut SqliteConnection, user_id: i64) -> StoreResult<Preference> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO preferences (user_id, theme, font_scale, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(DEFAULT_THEME)
    .bind(DEFAULT_FONT_SCALE)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let preference = sqlx::query_as::<_, Preference>(&format!(
        "SELECT {PREFERENCE_COLUMNS} FROM preferences WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(preference)
}

/// Apply the present fields on top of the (possibly fresh) row. Themes are free-form.
pub async fn update(
    conn: &mut SqliteConnection,
    user_id: i64,
    changes: PreferenceUpdate,
) -> StoreResult<Preference> {
    let mut preference = get_or_create(conn, user_id).await?;
    if let Some(theme) = changes.theme {
        preference.theme = theme;
    }
    if let Some(font_scale) = changes.font_scale {
        preference.font_scale = font_scale;
    }

    let preference = sqlx::query_as::<_, Preference>(&format!(
        "UPDATE preferences SET theme = ?, font_scale = ?, updated_at = ?
         WHERE user_id = ?
         RETURNING {PREFERENCE_COLUMNS}"
    ))
    .bind(&preference.theme)
    .bind(preference.font_scale)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(preference)
}
