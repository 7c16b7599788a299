use axum::extract::{FromRequest, FromRequestParts, Json, Path, Query};
use serde::Deserialize;
use sqlx::SqliteConnection;
use std::collections::HashMap;

use crate::config::ApiConfig;
use crate::database::User;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::{identity, Page};

/// `Json` whose rejections come back in the API error shape
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections come back in the API error shape
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path` whose rejections come back in the API error shape
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Collects per-field validation failures into a single 422
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Request validation failed", Some(self.0)))
        }
    }
}

/// Validate email format
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err("Invalid email format".to_string());
    }

    // Domain needs a dot with something on both sides
    let domain = parts[1];
    match domain.rfind('.') {
        Some(dot) if dot > 0 && dot < domain.len() - 1 => Ok(()),
        _ => Err("Invalid email format".to_string()),
    }
}

/// bcrypt only reads the first 72 bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(format!("Password cannot be longer than {} bytes", MAX_PASSWORD_BYTES));
    }
    Ok(())
}

pub fn validate_required_text(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", label));
    }
    Ok(())
}

pub fn validate_font_scale(scale: f64) -> Result<(), String> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err("Font scale must be a positive number".to_string());
    }
    Ok(())
}

/// `?skip=&limit=` on list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn into_page(self, config: &ApiConfig) -> Result<Page, ApiError> {
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(config.default_page_limit);

        let mut errors = FieldErrors::new();
        if skip < 0 {
            errors.add("skip", "skip must be zero or greater");
        }
        if limit < 1 || limit > config.max_page_limit {
            errors.add(
                "limit",
                format!("limit must be between 1 and {}", config.max_page_limit),
            );
        }
        errors.into_result()?;

        Ok(Page::new(skip, limit))
    }
}

/// Resolve the token's subject to a live user. A valid token for a deleted account is a 404.
pub async fn resolve_caller(conn: &mut SqliteConnection, auth: &AuthUser) -> Result<User, ApiError> {
    identity::find_by_email(conn, &auth.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn email_format() {
        assert!(validate_email_format("a@x.com").is_ok());
        assert!(validate_email_format("first.last@sub.example.org").is_ok());

        for bad in ["", "ax.com", "a@", "@x.com", "a@b@x.com", "a@xcom", "a@x.", "a @x.com"] {
            assert!(validate_email_format(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(validate_required_text("The Hobbit", "Title").is_ok());
        assert_eq!(
            validate_required_text("   ", "Title").unwrap_err(),
            "Title cannot be empty"
        );
    }

    #[test]
    fn font_scale_must_be_positive() {
        assert!(validate_font_scale(1.25).is_ok());
        assert!(validate_font_scale(0.0).is_err());
        assert!(validate_font_scale(-1.0).is_err());
        assert!(validate_font_scale(f64::NAN).is_err());
    }

    #[test]
    fn paging_defaults_and_bounds() {
        let config = AppConfig::for_tests().api;

        let page = PageQuery::default().into_page(&config).unwrap();
        assert_eq!(page, Page::new(0, config.default_page_limit));

        let page = PageQuery { skip: Some(5), limit: Some(2) }.into_page(&config).unwrap();
        assert_eq!(page, Page::new(5, 2));

        for (skip, limit) in [(Some(-1), None), (None, Some(0)), (None, Some(config.max_page_limit + 1))] {
            let err = PageQuery { skip, limit }.into_page(&config).unwrap_err();
            assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn password_length_is_capped_in_bytes() {
        assert!(validate_password(&"a".repeat(MAX_PASSWORD_BYTES)).is_ok());
        assert!(validate_password(&"a".repeat(MAX_PASSWORD_BYTES + 1)).is_err());
        // 24 three-byte characters fit exactly, one more does not
        assert!(validate_password(&"€".repeat(24)).is_ok());
        assert!(validate_password(&"€".repeat(25)).is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("email", "first");
        errors.add("email", "second");
        errors.check("password", Ok(()));

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["email"], "first");
        assert!(err.to_json()["field_errors"].get("password").is_none());
    }
}
