use sqlx::{SqliteConnection, SqlitePool};

use crate::auth::PasswordHasher;
use crate::config::{AppConfig, DatabaseConfig};
use crate::database::{DatabaseManager, User};
use crate::services::identity;

/// Test utilities: a fresh catalog per test, in memory unless a test needs real concurrency
pub struct TestContext {
    pub pool: SqlitePool,
    pub hasher: PasswordHasher,
    _dir: Option<tempfile::TempDir>,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::for_tests();
        let pool = DatabaseManager::connect(&config.database)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open test database: {}", e))?;

        Ok(Self {
            pool,
            hasher: PasswordHasher::new(config.security.bcrypt_cost),
            _dir: None,
        })
    }

    /// A file-backed WAL database with up to `max_connections` connections, removed on drop
    pub async fn on_disk(max_connections: u32) -> anyhow::Result<Self> {
        let config = AppConfig::for_tests();
        let dir = tempfile::tempdir()?;
        let database = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("catalog.db").display()),
            max_connections,
            ..config.database
        };
        let pool = DatabaseManager::connect(&database)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open test database: {}", e))?;

        Ok(Self {
            pool,
            hasher: PasswordHasher::new(config.security.bcrypt_cost),
            _dir: Some(dir),
        })
    }

    /// Register a user with a throwaway password
    pub async fn user(&self, conn: &mut SqliteConnection, email: &str) -> anyhow::Result<User> {
        let user = identity::register(conn, &self.hasher, email, "secret-pw").await?;
        Ok(user)
    }
}

/// Row count of `table`. Takes the caller's connection: the test pool has only one.
pub async fn count(conn: &mut SqliteConnection, table: &str) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
