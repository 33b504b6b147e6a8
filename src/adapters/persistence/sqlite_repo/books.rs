//! Books and book purchases.

use super::{SqliteRepo, collect, first, get_i64, get_string, get_ts, get_uuid, scalar, ts};
use crate::domain::{Book, DomainError};
use crate::ports::BookRepo;
use libsql::{Row, params};
use uuid::Uuid;

const BOOK_COLUMNS: &str = "id, author_id, title, description, price, file_url, created_at";

fn row_to_book(row: &Row) -> Result<Book, DomainError> {
    Ok(Book {
        id: get_uuid(row, 0)?,
        author_id: get_uuid(row, 1)?,
        title: get_string(row, 2)?,
        description: get_string(row, 3)?,
        price: get_i64(row, 4)?,
        file_url: get_string(row, 5)?,
        created_at: get_ts(row, 6)?,
    })
}

#[async_trait::async_trait]
impl BookRepo for SqliteRepo {
    async fn insert_book(&self, book: &Book) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO books (id, author_id, title, description, price, file_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                book.id.to_string(),
                book.author_id.to_string(),
                book.title.as_str(),
                book.description.as_str(),
                book.price,
                book.file_url.as_str(),
                ts(book.created_at)
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn get_book(&self, id: Uuid) -> Result<Option<Book>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_book).await
    }

    async fn list_books(&self) -> Result<Vec<Book>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at DESC"),
                (),
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_book).await
    }

    async fn has_purchased(&self, buyer_id: Uuid, book_id: Uuid) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT COUNT(*) FROM book_purchases WHERE buyer_id = ?1 AND book_id = ?2",
                params![buyer_id.to_string(), book_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        Ok(scalar(rows).await? > 0)
    }
}
