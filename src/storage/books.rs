use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{user_id_from_db, user_id_to_db};
use crate::{
    auth::{StoreError, UserId},
    books::{Book, BookStore, NewBook},
};

/// [`BookStore`] backed by the `books` table.
#[derive(Debug, Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn book_from_row(row: &PgRow) -> Result<Book, StoreError> {
    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        year: row.try_get("year")?,
        genre: row.try_get("genre")?,
        owner: user_id_from_db(row.try_get("owner")?)?,
    })
}

// a concurrent delete can land between the lookup and the write
fn require_row(rows_affected: u64) -> Result<(), StoreError> {
    if rows_affected == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Book>, StoreError> {
        let query = r"
            SELECT id, title, author, year, genre, owner
            FROM books
            WHERE owner = $1
            ORDER BY title, id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .bind(user_id_to_db(owner)?)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        rows.iter().map(book_from_row).collect()
    }

    async fn insert(&self, owner: UserId, book: NewBook) -> Result<Book, StoreError> {
        let query = r"
            INSERT INTO books
                (id, title, author, year, genre, owner)
            VALUES ($1, $2, $3, $4, $5, $6)
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let book = Book {
            id: Uuid::new_v4(),
            title: book.title,
            author: book.author,
            year: book.year,
            genre: book.genre,
            owner,
        };
        sqlx::query(query)
            .bind(book.id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.year)
            .bind(&book.genre)
            .bind(user_id_to_db(owner)?)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        Ok(book)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Book>, StoreError> {
        let query = "SELECT id, title, author, year, genre, owner FROM books WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        row.as_ref().map(book_from_row).transpose()
    }

    async fn update(&self, book: &Book) -> Result<(), StoreError> {
        // owner is never written after insert
        let query = r"
            UPDATE books
            SET title = $2, author = $3, year = $4, genre = $5
            WHERE id = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(book.id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.year)
            .bind(&book.genre)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        require_row(result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let query = "DELETE FROM books WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        require_row(result.rows_affected())
    }
}
