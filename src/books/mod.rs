//! Books: the owned resource behind the protected endpoints.

mod memory;

pub use memory::MemoryBookStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthError, Owned, StoreError, UserId};

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub genre: String,
    /// Set at creation from the authenticated identity; never changes.
    #[schema(value_type = u64)]
    pub owner: UserId,
}

impl Owned for Book {
    fn owner(&self) -> UserId {
        self.owner
    }
}

/// Payload for `POST /books`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub genre: String,
}

impl NewBook {
    /// # Errors
    /// Returns `AuthError::Validation` when title or author is blank or the
    /// year is negative.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.title.trim().is_empty() {
            return Err(AuthError::Validation("title is required".to_string()));
        }
        if self.author.trim().is_empty() {
            return Err(AuthError::Validation("author is required".to_string()));
        }
        if self.year < 0 {
            return Err(AuthError::Validation("year must not be negative".to_string()));
        }
        Ok(())
    }
}

/// Payload for `PUT /books/{id}`. Empty strings and a zero year leave the
/// stored value unchanged.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default)]
pub struct BookUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub genre: String,
}

impl BookUpdate {
    /// # Errors
    /// Returns `AuthError::Validation` for a negative year.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.year < 0 {
            return Err(AuthError::Validation("year must not be negative".to_string()));
        }
        Ok(())
    }

    pub fn apply_to(self, book: &mut Book) {
        if !self.title.is_empty() {
            book.title = self.title;
        }
        if !self.author.is_empty() {
            book.author = self.author;
        }
        if self.year != 0 {
            book.year = self.year;
        }
        if !self.genre.is_empty() {
            book.genre = self.genre;
        }
    }
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Book>, StoreError>;

    /// Persist a new book for `owner` and return it with its assigned id.
    async fn insert(&self, owner: UserId, book: NewBook) -> Result<Book, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Book>, StoreError>;

    /// Persist the mutable fields of an existing book. Ownership is not written.
    ///
    /// Returns `StoreError::NotFound` when the book is gone.
    async fn update(&self, book: &Book) -> Result<(), StoreError>;

    /// Returns `StoreError::NotFound` when the book is gone.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
