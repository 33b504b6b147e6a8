//! Books: publishing, catalogue and gated file access.

use crate::domain::rules::{ensure_can_author, validate_price, validate_title};
use crate::domain::{Book, DomainError, Millimes, Profile};
use crate::ports::BookRepo;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Millimes,
    pub file_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookAccess {
    pub book_id: Uuid,
    pub file_url: String,
}

pub struct BookService {
    books: Arc<dyn BookRepo>,
}

impl BookService {
    pub fn new(books: Arc<dyn BookRepo>) -> Self {
        Self { books }
    }

    pub async fn create(&self, user: &Profile, input: NewBook) -> Result<Book, DomainError> {
        ensure_can_author(user)?;
        validate_title(&input.title)?;
        validate_price(input.price)?;
        if input.file_url.trim().is_empty() {
            return Err(DomainError::validation("file_url must not be empty"));
        }
        let book = Book {
            id: Uuid::new_v4(),
            author_id: user.id,
            title: input.title.trim().to_string(),
            description: input.description,
            price: input.price,
            file_url: input.file_url.trim().to_string(),
            created_at: Utc::now(),
        };
        self.books.insert_book(&book).await?;
        info!(book_id = %book.id, author_id = %user.id, "book published");
        Ok(book)
    }

    pub async fn list(&self) -> Result<Vec<Book>, DomainError> {
        self.books.list_books().await
    }

    /// File URL for the author, admins, purchasers, or anyone when the book is free.
    pub async fn access(&self, user: &Profile, id: Uuid) -> Result<BookAccess, DomainError> {
        let book = self
            .books
            .get_book(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("book {id}")))?;
        let allowed = book.price == 0
            || book.author_id == user.id
            || user.is_admin()
            || self.books.has_purchased(user.id, id).await?;
        if !allowed {
            return Err(DomainError::forbidden("book not purchased"));
        }
        Ok(BookAccess {
            book_id: book.id,
            file_url: book.file_url,
        })
    }
}
