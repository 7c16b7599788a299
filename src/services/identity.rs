use chrono::Utc;
use sqlx::SqliteConnection;

use crate::auth::PasswordHasher;
use crate::database::User;
use crate::services::error::{unique_violation_as, StoreError, StoreResult};

pub const EMAIL_TAKEN: &str = "Email already registered";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

const USER_COLUMNS: &str = "id, email, hashed_password, created_at, updated_at";

/// Create a user. The email match is exact and case-sensitive.
pub async fn register(
    conn: &mut SqliteConnection,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> StoreResult<User> {
    if find_by_email(conn, email).await?.is_some() {
        return Err(StoreError::conflict(EMAIL_TAKEN));
    }

    let hashed_password = hasher.hash(password).await?;
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, hashed_password, created_at, updated_at)
         VALUES (?, ?, ?, ?)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(email)
    .bind(&hashed_password)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| unique_violation_as(e, EMAIL_TAKEN))?;

    tracing::info!("Registered user {}", user.id);
    Ok(user)
}

/// Check credentials. Unknown email and wrong password fail identically.
pub async fn authenticate(
    conn: &mut SqliteConnection,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> StoreResult<User> {
    match find_by_email(conn, email).await? {
        Some(user) => {
            if hasher.verify(password, &user.hashed_password).await? {
                Ok(user)
            } else {
                Err(StoreError::Unauthenticated(INVALID_CREDENTIALS.to_string()))
            }
        }
        None => {
            hasher.verify_dummy(password).await?;
            Err(StoreError::Unauthenticated(INVALID_CREDENTIALS.to_string()))
        }
    }
}

pub async fn find_by_email(conn: &mut SqliteConnection, email: &str) -> StoreResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> StoreResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

/// Remove a user. Their books, those books' links and their preference row go with them.
pub async fn delete_user(conn: &mut SqliteConnection, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("User not found"));
    }
    tracing::info!("Deleted user {}", id);
    Ok(())
}
