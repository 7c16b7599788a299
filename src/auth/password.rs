// Password hashing and verification

use std::sync::OnceLock;

/// Hash verified when the email is unknown, so both login failures cost one bcrypt verify.
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// bcrypt with a configurable cost. All work runs on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || {
            bcrypt::hash(password, cost).map_err(|e| PasswordError::Hashing(e.to_string()))
        })
        .await
        .map_err(|e| PasswordError::Hashing(format!("Task join error: {}", e)))?
    }

    /// Constant-time comparison against a stored hash. A corrupt hash counts as a mismatch.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
            .await
            .map_err(|e| PasswordError::Hashing(format!("Task join error: {}", e)))
    }

    /// Spend the same effort as `verify` when there is no stored hash to check.
    pub async fn verify_dummy(&self, password: &str) -> Result<(), PasswordError> {
        let password = password.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || {
            let dummy = DUMMY_HASH
                .get_or_init(|| bcrypt::hash("bibliotheque-no-such-user", cost).unwrap_or_default());
            let _ = bcrypt::verify(password, dummy);
        })
        .await
        .map_err(|e| PasswordError::Hashing(format!("Task join error: {}", e)))
    }
}
