//! Persistence adapter for books.
//!
//! [`BookStore`] is the seam handlers talk to. [`MongoBookStore`] backs it with
//! a MongoDB collection and [`InMemoryBookStore`] keeps records in process
//! (selected with a `memory://` database uri).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use booknest_db::ConnectionError;
use booknest_kernel::settings::DatabaseSettings;
use once_cell::sync::OnceCell;

use super::models::Book;

mod batch;
mod memory;
mod mongo;

pub use batch::{DeleteBatch, DeleteBatches, DEFAULT_DELETE_BATCH_SIZE};
pub use memory::InMemoryBookStore;
pub use mongo::{BookDocument, MongoBookStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("book {id} not found")]
    NotFound { id: String },

    #[error("database not connected")]
    NotConnected,

    #[error("{operation} did not complete within {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("database failure: {0}")]
    Backend(#[from] mongodb::error::Error),

    #[error("stored document has a non-string id {id}")]
    UnsupportedId { id: String },

    #[error("delete batch {batch} failed after {deleted} books were removed")]
    BatchFailed {
        batch: usize,
        deleted: u64,
        #[source]
        source: Box<StoreError>,
    },
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every stored book, unfiltered and unpaginated.
    async fn find_all(&self) -> Result<Vec<Book>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Book, StoreError>;

    /// Write `book` under its id, overwriting any record already stored there.
    async fn insert(&self, book: &Book) -> Result<(), StoreError>;

    /// Replace the whole record at `id`. Never creates a record.
    async fn replace_by_id(&self, id: &str, book: &Book) -> Result<(), StoreError>;

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;

    /// Ids of every stored book.
    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Remove one batch of ids, returning how many were actually deleted.
    async fn delete_batch(&self, batch: &DeleteBatch) -> Result<u64, StoreError>;

    /// Maximum ids per [`delete_batch`](Self::delete_batch) call.
    fn delete_batch_size(&self) -> usize {
        DEFAULT_DELETE_BATCH_SIZE
    }

    /// Delete every book, one batch at a time.
    ///
    /// Batches run sequentially. The first failing batch aborts the sweep;
    /// batches already applied stay deleted.
    async fn delete_all(&self) -> Result<u64, StoreError> {
        let ids = self.list_ids().await?;
        let mut deleted = 0;

        for batch in DeleteBatches::new(ids, self.delete_batch_size()) {
            match self.delete_batch(&batch).await {
                Ok(count) => deleted += count,
                Err(source) => {
                    tracing::error!(
                        operation = "delete_all",
                        batch = batch.index,
                        deleted,
                        error = %source,
                        "bulk delete aborted"
                    );
                    return Err(StoreError::BatchFailed {
                        batch: batch.index,
                        deleted,
                        source: Box::new(source),
                    });
                }
            }
        }

        tracing::info!(operation = "delete_all", deleted, "all books deleted");
        Ok(deleted)
    }
}

/// Set-once slot holding the store shared by all handlers.
///
/// Empty until the store connects; `/health` reports on it.
#[derive(Clone, Default)]
pub struct StoreHandle {
    slot: Arc<OnceCell<Arc<dyn BookStore>>>,
}

impl StoreHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that is already connected to `store`.
    pub fn connected(store: Arc<dyn BookStore>) -> Self {
        let handle = Self::new();
        let _ = handle.slot.set(store);
        handle
    }

    /// Fill the slot. Fails if a store is already attached.
    pub fn attach(&self, store: Arc<dyn BookStore>) -> anyhow::Result<()> {
        self.slot
            .set(store)
            .map_err(|_| anyhow::anyhow!("a book store is already attached"))
    }

    pub fn is_connected(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn get(&self) -> Result<&Arc<dyn BookStore>, StoreError> {
        self.slot.get().ok_or(StoreError::NotConnected)
    }
}

/// Open the store selected by `settings.uri`.
pub async fn connect(
    settings: &DatabaseSettings,
) -> Result<Arc<dyn BookStore>, ConnectionError> {
    if settings.is_in_memory() {
        tracing::info!(
            operation = "connect",
            "using in-memory book store; data is lost on restart"
        );
        return Ok(Arc::new(InMemoryBookStore::with_batch_size(
            settings.delete_batch_size,
        )));
    }

    let database = booknest_db::connect(settings).await?;
    Ok(Arc::new(MongoBookStore::new(
        &database,
        &settings.collection,
        settings.delete_batch_size,
    )))
}

/// Run `future` under `limit`, mapping expiry to [`StoreError::Timeout`].
async fn with_deadline<T, F>(
    operation: &'static str,
    limit: Duration,
    future: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, future)
        .await
        .unwrap_or(Err(StoreError::Timeout {
            operation,
            after: limit,
        }))
}

/// Emit the structured outcome event every adapter operation reports.
fn logged<T>(
    operation: &'static str,
    book_id: Option<&str>,
    result: Result<T, StoreError>,
) -> Result<T, StoreError> {
    let book_id = book_id.unwrap_or_default();
    match &result {
        Ok(_) => tracing::info!(operation, book_id, "store operation succeeded"),
        Err(StoreError::NotFound { .. }) => {
            tracing::info!(operation, book_id, "book not found")
        }
        Err(error) => tracing::error!(operation, book_id, %error, "store operation failed"),
    }
    result
}
