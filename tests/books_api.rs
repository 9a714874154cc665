mod common;

use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use axum::http::StatusCode;
use axum::Router;
use bookvault::{
    auth::{StoreError, UserId},
    books::{Book, BookStore, MemoryBookStore, NewBook},
};
use common::{app, app_with_books, json, login, register, send};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

async fn user(app: &Router, name: &str) -> Result<String> {
    register(app, name, "pw123").await?;
    login(app, name, "pw123").await
}

async fn create(app: &Router, token: &str, body: Value) -> Result<Value> {
    let (status, body) = send(app, "POST", "/books", Some(token), Some(body)).await?;
    ensure!(status == StatusCode::CREATED, "create: unexpected status {status}");
    json(&body)
}

fn book_uri(book: &Value) -> Result<String> {
    let id = book["id"].as_str().context("book id")?;
    Ok(format!("/books/{id}"))
}

/// Drops every book right after it is looked up, as a concurrent delete would.
#[derive(Default)]
struct VanishingBookStore {
    inner: MemoryBookStore,
}

#[async_trait]
impl BookStore for VanishingBookStore {
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Book>, StoreError> {
        self.inner.list_by_owner(owner).await
    }

    async fn insert(&self, owner: UserId, book: NewBook) -> Result<Book, StoreError> {
        self.inner.insert(owner, book).await
    }

    async fn find(&self, id: Uuid) -> Result<Option<Book>, StoreError> {
        let book = self.inner.find(id).await?;
        if book.is_some() {
            self.inner.delete(id).await?;
        }
        Ok(book)
    }

    async fn update(&self, book: &Book) -> Result<(), StoreError> {
        self.inner.update(book).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
}

#[tokio::test]
async fn owner_can_manage_their_book() -> Result<()> {
    let app = app()?;
    let bob = user(&app, "bob").await?;

    let book = create(
        &app,
        &bob,
        json!({ "title": "Dune", "author": "Frank Herbert", "year": 1965, "genre": "sf" }),
    )
    .await?;
    assert_eq!(book["owner"], 1);
    let uri = book_uri(&book)?;

    let (status, body) = send(&app, "GET", &uri, Some(&bob), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)?, book);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&bob),
        Some(json!({ "title": "Dune Messiah", "year": 1969 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let updated = json(&body)?;
    assert_eq!(updated["title"], "Dune Messiah");
    assert_eq!(updated["author"], "Frank Herbert");
    assert_eq!(updated["year"], 1969);
    assert_eq!(updated["owner"], 1);

    let (status, body) = send(&app, "GET", "/books", Some(&bob), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)?, json!([updated]));

    let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, Some(&bob), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn other_users_are_forbidden_and_nothing_changes() -> Result<()> {
    let app = app()?;
    let bob = user(&app, "bob").await?;
    let eve = user(&app, "eve").await?;

    let book = create(
        &app,
        &bob,
        json!({ "title": "Dune", "author": "Frank Herbert", "year": 1965 }),
    )
    .await?;
    let uri = book_uri(&book)?;

    let (status, _) = send(&app, "GET", &uri, Some(&eve), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "PUT", &uri, Some(&eve), Some(json!({ "title": "Mine" }))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &uri, Some(&eve), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/books", Some(&eve), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)?, json!([]));

    let (status, body) = send(&app, "GET", &uri, Some(&bob), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)?, book);
    Ok(())
}

#[tokio::test]
async fn missing_and_unparsable_ids_are_not_found() -> Result<()> {
    let app = app()?;
    let bob = user(&app, "bob").await?;

    for uri in ["/books/67e55044-10b1-426f-9247-bb680e5fe0c8", "/books/42"] {
        for method in ["GET", "DELETE"] {
            let (status, _) = send(&app, method, uri, Some(&bob), None).await?;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn book_deleted_mid_request_is_not_found() -> Result<()> {
    let app = app_with_books(Arc::new(VanishingBookStore::default()))?;
    let bob = user(&app, "bob").await?;

    let book = create(
        &app,
        &bob,
        json!({ "title": "Dune", "author": "Frank Herbert" }),
    )
    .await?;
    let (status, _) = send(
        &app,
        "PUT",
        &book_uri(&book)?,
        Some(&bob),
        Some(json!({ "title": "Dune Messiah" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let book = create(
        &app,
        &bob,
        json!({ "title": "Emma", "author": "Jane Austen" }),
    )
    .await?;
    let (status, _) = send(&app, "DELETE", &book_uri(&book)?, Some(&bob), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn token_is_checked_before_lookup() -> Result<()> {
    let app = app()?;
    let (status, _) = send(
        &app,
        "GET",
        "/books/67e55044-10b1-426f-9247-bb680e5fe0c8",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn invalid_books_are_rejected() -> Result<()> {
    let app = app()?;
    let bob = user(&app, "bob").await?;

    for body in [
        json!({ "title": "", "author": "Frank Herbert" }),
        json!({ "title": "Dune", "author": "   " }),
        json!({ "title": "Dune", "author": "Frank Herbert", "year": -3 }),
        json!({ "author": "Frank Herbert" }),
    ] {
        let (status, _) = send(&app, "POST", "/books", Some(&bob), Some(body)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    Ok(())
}
