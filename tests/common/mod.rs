#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use bibliotheque::app::{self, AppState};
use bibliotheque::config::AppConfig;

/// An API server on its own port and database, alive for one test
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: Client,
    _dir: Option<tempfile::TempDir>,
}

/// A registered, logged-in user
pub struct Session {
    pub token: String,
    pub user: Value,
}

impl Session {
    pub fn id(&self) -> i64 {
        self.user["id"].as_i64().unwrap_or_default()
    }
}

impl TestServer {
    /// In-memory database behind a single connection
    pub async fn start() -> Result<Self> {
        Self::start_with(AppConfig::for_tests(), None).await
    }

    /// File-backed WAL database with a multi-connection pool, so requests really overlap
    pub async fn start_on_disk() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let mut config = AppConfig::for_tests();
        config.database.url = format!("sqlite://{}", dir.path().join("catalog.db").display());
        config.database.max_connections = 8;
        Self::start_with(config, Some(dir)).await
    }

    async fn start_with(config: AppConfig, dir: Option<tempfile::TempDir>) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::connect(config)
            .await
            .context("failed to open test database")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, app::router(state)).await;
        });

        let server = Self { port, base_url, client: Client::new(), _dir: dir };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Response> {
        let res = self
            .request(Method::POST, "/api/users/register", None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(res)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Response> {
        let res = self
            .request(Method::POST, "/api/users/login", None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(res)
    }

    /// Register and log in a user with a unique email
    pub async fn session(&self) -> Result<Session> {
        let email = format!("user-{}@example.com", uuid::Uuid::new_v4().simple());
        self.session_for(&email, "correct horse").await
    }

    pub async fn session_for(&self, email: &str, password: &str) -> Result<Session> {
        let res = self.register(email, password).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let res = self.login(email, password).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;

        Ok(Session {
            token: body["access_token"].as_str().context("no access_token")?.to_string(),
            user: body["user"].clone(),
        })
    }

    /// Send an authenticated request; returns status and JSON body (Null when empty)
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = self.request(method, path, Some(token));
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let res = builder.send().await?;
        let status = res.status();
        let text = res.text().await?;
        let value = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
        Ok((status, value))
    }

    pub async fn create_author(&self, token: &str, name: &str) -> Result<Value> {
        let (status, body) = self
            .call(Method::POST, "/api/authors/", token, Some(json!({ "name": name })))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create author failed: {} {}", status, body);
        Ok(body)
    }

    pub async fn create_book(&self, token: &str, book: Value) -> Result<Value> {
        let (status, body) = self.call(Method::POST, "/api/books/", token, Some(book)).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create book failed: {} {}", status, body);
        Ok(body)
    }
}
