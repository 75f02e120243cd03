use std::time::Duration;

use async_trait::async_trait;
use booknest_db::Database;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson},
    Collection,
};
use serde::{Deserialize, Serialize};

use super::{logged, with_deadline, BookStore, DeleteBatch, StoreError};
use crate::modules::books::models::Book;

/// Store-native shape of a book: the id lives in `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub author: String,
    pub isbn: String,
    pub genre: String,
}

impl From<&Book> for BookDocument {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            name: book.name.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            genre: book.genre.clone(),
        }
    }
}

impl From<BookDocument> for Book {
    fn from(document: BookDocument) -> Self {
        Self {
            id: document.id,
            name: document.name,
            author: document.author,
            isbn: document.isbn,
            genre: document.genre,
        }
    }
}

/// [`BookStore`] over a single MongoDB collection.
#[derive(Clone, Debug)]
pub struct MongoBookStore {
    collection: Collection<BookDocument>,
    operation_timeout: Duration,
    batch_size: usize,
}

impl MongoBookStore {
    pub fn new(database: &Database, collection: &str, batch_size: usize) -> Self {
        Self {
            collection: database.collection(collection),
            operation_timeout: database.operation_timeout(),
            batch_size,
        }
    }
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        let result = with_deadline("find_all", self.operation_timeout, async {
            let cursor = self.collection.find(doc! {}).await?;
            let documents: Vec<BookDocument> = cursor.try_collect().await?;
            Ok::<_, StoreError>(documents.into_iter().map(Book::from).collect())
        })
        .await;
        logged("find_all", None, result)
    }

    async fn find_by_id(&self, id: &str) -> Result<Book, StoreError> {
        let result = with_deadline("find_by_id", self.operation_timeout, async {
            match self.collection.find_one(doc! { "_id": id }).await? {
                Some(document) => Ok(Book::from(document)),
                None => Err(StoreError::NotFound { id: id.to_string() }),
            }
        })
        .await;
        logged("find_by_id", Some(id), result)
    }

    async fn insert(&self, book: &Book) -> Result<(), StoreError> {
        let document = BookDocument::from(book);
        let result = with_deadline("insert", self.operation_timeout, async {
            // Upsert: a duplicate id overwrites the stored record.
            self.collection
                .replace_one(doc! { "_id": document.id.as_str() }, &document)
                .upsert(true)
                .await?;
            Ok::<_, StoreError>(())
        })
        .await;
        logged("insert", Some(book.id.as_str()), result)
    }

    async fn replace_by_id(&self, id: &str, book: &Book) -> Result<(), StoreError> {
        let document = BookDocument::from(book).with_id(id);
        let result = with_deadline("replace_by_id", self.operation_timeout, async {
            let outcome = self
                .collection
                .replace_one(doc! { "_id": id }, &document)
                .await?;
            if outcome.matched_count == 0 {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            Ok(())
        })
        .await;
        logged("replace_by_id", Some(id), result)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let result = with_deadline("delete_by_id", self.operation_timeout, async {
            let outcome = self.collection.delete_one(doc! { "_id": id }).await?;
            if outcome.deleted_count == 0 {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
            Ok(())
        })
        .await;
        logged("delete_by_id", Some(id), result)
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let result = with_deadline("list_ids", self.operation_timeout, async {
            let ids = self.collection.distinct("_id", doc! {}).await?;
            string_ids(ids)
        })
        .await;
        logged("list_ids", None, result)
    }

    async fn delete_batch(&self, batch: &DeleteBatch) -> Result<u64, StoreError> {
        let result = with_deadline("delete_batch", self.operation_timeout, async {
            let outcome = self
                .collection
                .delete_many(doc! { "_id": { "$in": batch.ids.clone() } })
                .await?;
            Ok::<_, StoreError>(outcome.deleted_count)
        })
        .await;
        tracing::debug!(batch = batch.index, size = batch.ids.len(), "delete batch issued");
        logged("delete_batch", None, result)
    }

    fn delete_batch_size(&self) -> usize {
        self.batch_size
    }
}

impl BookDocument {
    fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }
}

/// Book ids are strings. Any other `_id` fails the listing rather than
/// being left out of a bulk delete.
fn string_ids(ids: Vec<Bson>) -> Result<Vec<String>, StoreError> {
    ids.into_iter()
        .map(|id| match id {
            Bson::String(id) => Ok(id),
            other => Err(StoreError::UnsupportedId {
                id: other.to_string(),
            }),
        })
        .collect()
}
