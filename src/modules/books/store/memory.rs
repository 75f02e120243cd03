use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{logged, BookStore, DeleteBatch, StoreError, DEFAULT_DELETE_BATCH_SIZE};
use crate::modules::books::models::Book;

/// Process-local [`BookStore`], ordered by id.
#[derive(Debug)]
pub struct InMemoryBookStore {
    books: RwLock<BTreeMap<String, Book>>,
    batch_size: usize,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::with_batch_size(DEFAULT_DELETE_BATCH_SIZE)
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            books: RwLock::new(BTreeMap::new()),
            batch_size,
        }
    }

    /// Number of stored books.
    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.books.read().await.is_empty()
    }
}

impl Default for InMemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        let books = self.books.read().await.values().cloned().collect();
        logged("find_all", None, Ok(books))
    }

    async fn find_by_id(&self, id: &str) -> Result<Book, StoreError> {
        let result = self
            .books
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() });
        logged("find_by_id", Some(id), result)
    }

    async fn insert(&self, book: &Book) -> Result<(), StoreError> {
        self.books
            .write()
            .await
            .insert(book.id.clone(), book.clone());
        logged("insert", Some(book.id.as_str()), Ok(()))
    }

    async fn replace_by_id(&self, id: &str, book: &Book) -> Result<(), StoreError> {
        let result = match self.books.write().await.get_mut(id) {
            Some(stored) => {
                *stored = book.clone().with_id(id);
                Ok(())
            }
            None => Err(StoreError::NotFound { id: id.to_string() }),
        };
        logged("replace_by_id", Some(id), result)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let result = match self.books.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound { id: id.to_string() }),
        };
        logged("delete_by_id", Some(id), result)
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let ids = self.books.read().await.keys().cloned().collect();
        logged("list_ids", None, Ok(ids))
    }

    async fn delete_batch(&self, batch: &DeleteBatch) -> Result<u64, StoreError> {
        let mut books = self.books.write().await;
        let deleted = batch
            .ids
            .iter()
            .filter_map(|id| books.remove(id))
            .count() as u64;
        logged("delete_batch", None, Ok(deleted))
    }

    fn delete_batch_size(&self) -> usize {
        self.batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str, name: &str) -> Book {
        Book {
            id: id.to_string(),
            name: name.to_string(),
            author: "Herbert".to_string(),
            isbn: "123".to_string(),
            genre: "SciFi".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = InMemoryBookStore::new();
        store.insert(&book("a", "Dune")).await.unwrap();

        assert_eq!(store.find_by_id("a").await.unwrap(), book("a", "Dune"));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_with_existing_id_overwrites() {
        let store = InMemoryBookStore::new();
        store.insert(&book("a", "Dune")).await.unwrap();
        store.insert(&book("a", "Dune Messiah")).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.find_by_id("a").await.unwrap().name, "Dune Messiah");
    }

    #[tokio::test]
    async fn replace_missing_book_does_not_create_it() {
        let store = InMemoryBookStore::new();
        let err = store
            .replace_by_id("ghost", &book("ghost", "Dune"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn replace_keeps_stored_id() {
        let store = InMemoryBookStore::new();
        store.insert(&book("a", "Dune")).await.unwrap();
        store
            .replace_by_id("a", &book("other", "Children of Dune"))
            .await
            .unwrap();

        let stored = store.find_by_id("a").await.unwrap();
        assert_eq!(stored.id, "a");
        assert_eq!(stored.name, "Children of Dune");
        assert!(matches!(
            store.find_by_id("other").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_missing_book_reports_not_found() {
        let store = InMemoryBookStore::new();
        assert!(matches!(
            store.delete_by_id("ghost").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_all_spans_several_batches() {
        let store = InMemoryBookStore::with_batch_size(4);
        for i in 0..10 {
            store.insert(&book(&i.to_string(), "Dune")).await.unwrap();
        }

        assert_eq!(store.delete_all().await.unwrap(), 10);
        assert!(store.find_all().await.unwrap().is_empty());
    }
}
