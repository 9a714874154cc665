#![allow(dead_code)]

use anyhow::{ensure, Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use bookvault::{
    api::{self, AppState},
    auth::{
        AuthenticationGate, MemoryCredentialStore, PasswordHasher, PasswordParams, TokenIssuer,
        TokenVerifier,
    },
    books::{BookStore, MemoryBookStore},
};
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";

pub fn app() -> Result<Router> {
    app_with_books(Arc::new(MemoryBookStore::new()))
}

pub fn app_with_books(books: Arc<dyn BookStore>) -> Result<Router> {
    let secret = SecretString::from(SECRET.to_string());
    let hasher = PasswordHasher::new(PasswordParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .context("build password hasher")?;
    let issuer = TokenIssuer::new(&secret).context("build token issuer")?;

    let state = AppState {
        gate: AuthenticationGate::new(Arc::new(MemoryCredentialStore::new()), hasher, issuer),
        verifier: verifier()?,
        books,
        pool: None,
    };

    Ok(api::router(Arc::new(state)))
}

pub fn verifier() -> Result<TokenVerifier> {
    TokenVerifier::new(&SecretString::from(SECRET.to_string())).context("build token verifier")
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Vec<u8>)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .context("build request")?;

    let response = app
        .clone()
        .oneshot(request)
        .await
        .with_context(|| format!("{method} {uri}"))?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .context("read response body")?;

    Ok((status, bytes.to_vec()))
}

pub fn json(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).context("decode JSON body")
}

pub async fn register(app: &Router, username: &str, password: &str) -> Result<Value> {
    let (status, body) = send(
        app,
        "POST",
        "/register",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await?;
    ensure!(
        status == StatusCode::CREATED,
        "register {username}: unexpected status {status}"
    );
    json(&body)
}

pub async fn login(app: &Router, username: &str, password: &str) -> Result<String> {
    let (status, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await?;
    ensure!(
        status == StatusCode::OK,
        "login {username}: unexpected status {status}"
    );
    json(&body)?["token"]
        .as_str()
        .map(str::to_string)
        .context("token missing from login response")
}
