use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{PasswordHasher, TokenGateway};
use crate::config::AppConfig;
use crate::database::{DatabaseError, DatabaseManager};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;

/// Shared handles every request needs. Cloning is cheap: the pool and config are reference counted.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: TokenGateway,
    pub passwords: PasswordHasher,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig) -> Self {
        Self {
            db,
            tokens: TokenGateway::new(&config.security),
            passwords: PasswordHasher::new(config.security.bcrypt_cost),
            config: Arc::new(config),
        }
    }

    /// Open (and migrate) the configured database, then build the state around it
    pub async fn connect(config: AppConfig) -> Result<Self, DatabaseError> {
        let db = DatabaseManager::connect(&config.database).await?;
        Ok(Self::new(db, config))
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);

    Router::new()
        // Public
        .route("/", get(public::meta::root))
        .route("/health", get(public::meta::health))
        .merge(public_routes())
        // Bearer token required
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::users;

    Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users/:id", get(users::get_by_id))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{authors, books, preferences, users};

    Router::new()
        .route("/api/users/me", get(users::me).delete(users::delete_me))
        // Collections answer with and without the trailing slash
        .route("/api/authors", get(authors::list).post(authors::create))
        .route("/api/authors/", get(authors::list).post(authors::create))
        .route(
            "/api/authors/:id",
            get(authors::get).put(authors::update).delete(authors::delete),
        )
        .route("/api/books", get(books::list).post(books::create))
        .route("/api/books/", get(books::list).post(books::create))
        .route(
            "/api/books/:id",
            get(books::get).put(books::update).delete(books::delete),
        )
        .route(
            "/api/preferences/me",
            get(preferences::get).put(preferences::update),
        )
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
