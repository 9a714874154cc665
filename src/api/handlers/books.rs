//! Book endpoints.
//!
//! Every single-book route runs lookup, then the ownership guard, then the
//! action. Nothing about a book is read back or changed before the guard
//! passes.

use crate::{
    api::{handlers::require_auth, AppState},
    auth::{authorize_resource, AuthError, Identity},
    books::{Book, BookUpdate, NewBook},
};
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Unparsable ids cannot name an existing book.
fn parse_book_id(id: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(id).map_err(|_| AuthError::NotFound)
}

async fn owned_book(state: &AppState, identity: &Identity, id: &str) -> Result<Book, AuthError> {
    let id = parse_book_id(id)?;
    let book = state.books.find(id).await?;
    authorize_resource(identity, book)
}

#[utoipa::path(
    get,
    path= "/books",
    responses (
        (status = 200, description = "Books owned by the caller", body = [Book]),
        (status = 401, description = "Missing, invalid or expired token"),
    ),
    security(("bearer_token" = [])),
    tag= "books"
)]
#[instrument(skip(state, headers))]
pub async fn list_books(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Book>>, AuthError> {
    let identity = require_auth(&headers, &state.verifier)?;
    let books = state.books.list_by_owner(identity.user_id()).await?;

    debug!(user_id = %identity.user_id(), count = books.len(), "listed books");

    Ok(Json(books))
}

#[utoipa::path(
    post,
    path= "/books",
    request_body = NewBook,
    responses (
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid book"),
        (status = 401, description = "Missing, invalid or expired token"),
    ),
    security(("bearer_token" = [])),
    tag= "books"
)]
#[instrument(skip(state, headers, payload))]
pub async fn create_book(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<NewBook>>,
) -> Result<(StatusCode, Json<Book>), AuthError> {
    let identity = require_auth(&headers, &state.verifier)?;

    let Some(Json(new_book)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };
    new_book.validate()?;

    let book = state.books.insert(identity.user_id(), new_book).await?;

    debug!(user_id = %identity.user_id(), book_id = %book.id, "book created");

    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    get,
    path= "/books/{id}",
    params(("id" = String, Path, description = "Book id (UUID)")),
    responses (
        (status = 200, description = "Book", body = Book),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 403, description = "Book belongs to another user"),
        (status = 404, description = "No such book"),
    ),
    security(("bearer_token" = [])),
    tag= "books"
)]
#[instrument(skip(state, headers))]
pub async fn get_book(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Book>, AuthError> {
    let identity = require_auth(&headers, &state.verifier)?;
    let book = owned_book(&state, &identity, &id).await?;

    Ok(Json(book))
}

#[utoipa::path(
    put,
    path= "/books/{id}",
    params(("id" = String, Path, description = "Book id (UUID)")),
    request_body = BookUpdate,
    responses (
        (status = 200, description = "Updated book", body = Book),
        (status = 400, description = "Invalid update"),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 403, description = "Book belongs to another user"),
        (status = 404, description = "No such book"),
    ),
    security(("bearer_token" = [])),
    tag= "books"
)]
#[instrument(skip(state, headers, payload))]
pub async fn update_book(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Option<Json<BookUpdate>>,
) -> Result<Json<Book>, AuthError> {
    let identity = require_auth(&headers, &state.verifier)?;
    let mut book = owned_book(&state, &identity, &id).await?;

    let Some(Json(update)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };
    update.validate()?;
    update.apply_to(&mut book);

    state.books.update(&book).await?;

    debug!(user_id = %identity.user_id(), book_id = %book.id, "book updated");

    Ok(Json(book))
}

#[utoipa::path(
    delete,
    path= "/books/{id}",
    params(("id" = String, Path, description = "Book id (UUID)")),
    responses (
        (status = 204, description = "Book deleted"),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 403, description = "Book belongs to another user"),
        (status = 404, description = "No such book"),
    ),
    security(("bearer_token" = [])),
    tag= "books"
)]
#[instrument(skip(state, headers))]
pub async fn delete_book(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AuthError> {
    let identity = require_auth(&headers, &state.verifier)?;
    let book = owned_book(&state, &identity, &id).await?;

    state.books.delete(book.id).await?;

    debug!(user_id = %identity.user_id(), book_id = %book.id, "book deleted");

    Ok(StatusCode::NO_CONTENT)
}
