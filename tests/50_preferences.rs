mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn first_read_returns_persisted_defaults() -> Result<()> {
    let server = TestServer::start().await?;
    let s = server.session().await?;

    let (status, first) = server.call(Method::GET, "/api/preferences/me", &s.token, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["theme"], "dark");
    assert_eq!(first["font_scale"], 1.0);
    assert_eq!(first["user_id"], s.id());

    let (_, second) = server.call(Method::GET, "/api/preferences/me", &s.token, None).await?;
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn update_applies_only_present_fields() -> Result<()> {
    let server = TestServer::start().await?;
    let s = server.session().await?;

    // No prior read: the update creates the row first
    let (status, prefs) = server
        .call(Method::PUT, "/api/preferences/me", &s.token, Some(json!({ "font_scale": 1.5 })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs["theme"], "dark");
    assert_eq!(prefs["font_scale"], 1.5);

    let (_, prefs) = server
        .call(
            Method::PUT,
            "/api/preferences/me",
            &s.token,
            Some(json!({ "theme": "solarized", "font_scale": null })),
        )
        .await?;
    assert_eq!(prefs["theme"], "solarized");
    assert_eq!(prefs["font_scale"], 1.5);

    let (_, read) = server.call(Method::GET, "/api/preferences/me", &s.token, None).await?;
    assert_eq!(read["id"], prefs["id"]);
    assert_eq!(read["theme"], "solarized");
    Ok(())
}

#[tokio::test]
async fn preferences_are_per_user() -> Result<()> {
    let server = TestServer::start().await?;
    let alice = server.session().await?;
    let bob = server.session().await?;

    server
        .call(Method::PUT, "/api/preferences/me", &alice.token, Some(json!({ "theme": "light" })))
        .await?;

    let (_, bobs) = server.call(Method::GET, "/api/preferences/me", &bob.token, None).await?;
    assert_eq!(bobs["theme"], "dark");
    assert_eq!(bobs["user_id"], bob.id());
    Ok(())
}

#[tokio::test]
async fn non_positive_font_scale_is_422() -> Result<()> {
    let server = TestServer::start().await?;
    let s = server.session().await?;

    let (status, body) = server
        .call(Method::PUT, "/api/preferences/me", &s.token, Some(json!({ "font_scale": 0 })))
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["font_scale"].is_string());

    let (status, _) = server
        .call(Method::PUT, "/api/preferences/me", &s.token, Some(json!({ "font_scale": "big" })))
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}
