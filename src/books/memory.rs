use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Book, BookStore, NewBook};
use crate::auth::{StoreError, UserId};

/// Process-local [`BookStore`] for tests and database-less runs.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    books: RwLock<HashMap<Uuid, Book>>,
}

impl MemoryBookStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Book>, StoreError> {
        let mut books: Vec<Book> = self
            .books
            .read()
            .await
            .values()
            .filter(|book| book.owner == owner)
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(books)
    }

    async fn insert(&self, owner: UserId, book: NewBook) -> Result<Book, StoreError> {
        let book = Book {
            id: Uuid::new_v4(),
            title: book.title,
            author: book.author,
            year: book.year,
            genre: book.genre,
            owner,
        };
        self.books.write().await.insert(book.id, book.clone());
        Ok(book)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Book>, StoreError> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn update(&self, book: &Book) -> Result<(), StoreError> {
        let mut books = self.books.write().await;
        let stored = books.get_mut(&book.id).ok_or(StoreError::NotFound)?;
        stored.title.clone_from(&book.title);
        stored.author.clone_from(&book.author);
        stored.year = book.year;
        stored.genre.clone_from(&book.genre);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.books
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
