//! One handler per book operation.
//!
//! Each handler decodes its input, makes a single call on the [`BookStore`],
//! and maps the outcome onto a status code.
//!
//! [`BookStore`]: super::store::BookStore

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use booknest_http::error::AppError;
use serde_json::json;

use super::models::Book;
use super::store::{StoreError, StoreHandle};

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => AppError::not_found("Book not found"),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

fn invalid_body(error: serde_json::Error) -> AppError {
    AppError::bad_request_with(
        vec![json!({ "reason": error.to_string() })],
        "Invalid request body",
    )
}

/// Decode a book from the raw body. The `Content-Type` header is not consulted.
fn decode_book(body: &[u8]) -> Result<Book, AppError> {
    serde_json::from_slice(body).map_err(invalid_body)
}

/// `POST /api/v1/books`
pub async fn create_book(
    State(store): State<StoreHandle>,
    body: Bytes,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = decode_book(&body)?.with_generated_id();

    store.get()?.insert(&book).await?;

    Ok((StatusCode::CREATED, Json(book)))
}

/// `GET /api/v1/books`
pub async fn list_books(State(store): State<StoreHandle>) -> Result<Json<Vec<Book>>, AppError> {
    let books = store.get()?.find_all().await?;
    Ok(Json(books))
}

/// `GET /api/v1/books/book/{id}`
pub async fn get_book(
    State(store): State<StoreHandle>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let book = store.get()?.find_by_id(&id).await?;
    Ok(Json(book))
}

/// `PUT /api/v1/books/book/{id}`
///
/// Replaces the whole record. The id in the path wins over any id in the body.
pub async fn update_book(
    State(store): State<StoreHandle>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let book = decode_book(&body)?;

    store.get()?.replace_by_id(&id, &book).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/v1/books/book/{id}`
pub async fn delete_book(
    State(store): State<StoreHandle>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    store.get()?.delete_by_id(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/v1/books`
pub async fn delete_all_books(State(store): State<StoreHandle>) -> Result<StatusCode, AppError> {
    store.get()?.delete_all().await?;
    Ok(StatusCode::NO_CONTENT)
}
