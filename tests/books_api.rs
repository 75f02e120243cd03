//! End-to-end tests of the book API over the in-memory store

use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Bytes, http::StatusCode};
use axum_test::TestServer;
use booknest::modules::books::{
    models::Book,
    store::{BookStore, DeleteBatch, InMemoryBookStore, StoreError, StoreHandle},
    BooksModule,
};
use booknest_kernel::{settings::Settings, ModuleRegistry};
use serde_json::{json, Value};

fn server_for(module: BooksModule) -> TestServer {
    let mut registry = ModuleRegistry::new();
    registry.register(Arc::new(module));
    let app = booknest_http::build_router(&registry, &Settings::default());
    TestServer::new(app).expect("Failed to create test server")
}

fn test_server() -> TestServer {
    server_for(BooksModule::with_store(Arc::new(InMemoryBookStore::new())))
}

fn dune() -> Value {
    json!({"name": "Dune", "author": "Herbert", "isbn": "123", "genre": "SciFi"})
}

async fn create(server: &TestServer, body: &Value) -> Book {
    let response = server.post("/api/v1/books").json(body).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Book>()
}

#[tokio::test]
async fn create_assigns_id_and_echoes_fields() {
    let server = test_server();

    let response = server.post("/api/v1/books").json(&dune()).await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert_eq!(body["name"], "Dune");
    assert_eq!(body["author"], "Herbert");
    assert_eq!(body["isbn"], "123");
    assert_eq!(body["genre"], "SciFi");
}

#[tokio::test]
async fn generated_ids_are_unique() {
    let server = test_server();

    let first = create(&server, &dune()).await;
    let second = create(&server, &dune()).await;

    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn get_after_create_returns_same_book() {
    let server = test_server();
    let created = create(&server, &dune()).await;

    let response = server
        .get(&format!("/api/v1/books/book/{}", created.id))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Book>(), created);
}

#[tokio::test]
async fn create_keeps_client_id_and_overwrites_duplicates() {
    let server = test_server();
    let mut body = dune();
    body["id"] = json!("dune-1");
    create(&server, &body).await;

    body["name"] = json!("Dune Messiah");
    let second = create(&server, &body).await;
    assert_eq!(second.id, "dune-1");

    let books: Vec<Book> = server.get("/api/v1/books").await.json();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].name, "Dune Messiah");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let server = test_server();

    let response = server
        .post("/api/v1/books")
        .bytes(Bytes::from_static(b"{\"name\": "))
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "bad_request");

    let response = server
        .post("/api/v1/books")
        .json(&json!({"name": "Dune"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn body_is_decoded_without_content_type() {
    let server = test_server();

    let response = server
        .post("/api/v1/books")
        .bytes(Bytes::from_static(
            br#"{"name":"Dune","author":"Herbert","isbn":"123","genre":"SciFi"}"#,
        ))
        .await;
    response.assert_status(StatusCode::CREATED);

    let book: Book = response.json();
    assert!(!book.id.is_empty());
    assert_eq!(book.name, "Dune");
}

#[tokio::test]
async fn null_id_gets_a_generated_one() {
    let server = test_server();

    let mut body = dune();
    body["id"] = Value::Null;
    let created = create(&server, &body).await;

    assert!(!created.id.is_empty());
    server
        .get(&format!("/api/v1/books/book/{}", created.id))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn list_starts_empty() {
    let server = test_server();

    let response = server.get("/api/v1/books").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn get_unknown_book_is_not_found() {
    let server = test_server();

    let response = server.get("/api/v1/books/book/missing").await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn update_replaces_whole_record() {
    let server = test_server();
    let created = create(&server, &dune()).await;
    let path = format!("/api/v1/books/book/{}", created.id);

    let response = server
        .put(&path)
        .json(&json!({
            "id": "ignored",
            "name": "Children of Dune",
            "author": "Herbert",
            "isbn": "456",
            "genre": "SciFi"
        }))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let stored: Book = server.get(&path).await.json();
    assert_eq!(stored.id, created.id);
    assert_eq!(stored.name, "Children of Dune");
    assert_eq!(stored.isbn, "456");
}

#[tokio::test]
async fn update_unknown_book_is_not_found_and_creates_nothing() {
    let server = test_server();

    let response = server
        .put("/api/v1/books/book/ghost")
        .json(&dune())
        .await;
    response.assert_status_not_found();

    server
        .get("/api/v1/books/book/ghost")
        .await
        .assert_status_not_found();
    assert_eq!(server.get("/api/v1/books").await.json::<Value>(), json!([]));
}

#[tokio::test]
async fn update_with_malformed_body_is_rejected() {
    let server = test_server();
    let created = create(&server, &dune()).await;

    let response = server
        .put(&format!("/api/v1/books/book/{}", created.id))
        .bytes(Bytes::from_static(b"not json"))
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_wins_over_unknown_id_on_update() {
    let server = test_server();

    let response = server
        .put("/api/v1/books/book/ghost")
        .bytes(Bytes::from_static(b"not json"))
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let server = test_server();
    let created = create(&server, &dune()).await;
    let path = format!("/api/v1/books/book/{}", created.id);

    server
        .delete(&path)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server.get(&path).await.assert_status_not_found();
    server.delete(&path).await.assert_status_not_found();
}

#[tokio::test]
async fn delete_all_empties_the_collection() {
    let server = test_server();
    for i in 0..30 {
        let mut body = dune();
        body["id"] = json!(format!("book-{i}"));
        create(&server, &body).await;
    }

    server
        .delete("/api/v1/books")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(server.get("/api/v1/books").await.json::<Value>(), json!([]));
}

#[tokio::test]
async fn health_reports_database_state() {
    let module = BooksModule::new();
    let handle: StoreHandle = module.store_handle();
    let server = server_for(module);

    let response = server.get("/health").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "Database not connected");

    server
        .get("/api/v1/books")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    handle.attach(Arc::new(InMemoryBookStore::new())).unwrap();

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

/// Store that fails every call, standing in for an unreachable database.
struct UnreachableStore;

fn unreachable() -> StoreError {
    StoreError::Timeout {
        operation: "test",
        after: std::time::Duration::from_secs(10),
    }
}

#[async_trait]
impl BookStore for UnreachableStore {
    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        Err(unreachable())
    }

    async fn find_by_id(&self, _id: &str) -> Result<Book, StoreError> {
        Err(unreachable())
    }

    async fn insert(&self, _book: &Book) -> Result<(), StoreError> {
        Err(unreachable())
    }

    async fn replace_by_id(&self, _id: &str, _book: &Book) -> Result<(), StoreError> {
        Err(unreachable())
    }

    async fn delete_by_id(&self, _id: &str) -> Result<(), StoreError> {
        Err(unreachable())
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(vec!["a".to_string()])
    }

    async fn delete_batch(&self, _batch: &DeleteBatch) -> Result<u64, StoreError> {
        Err(unreachable())
    }
}

#[tokio::test]
async fn store_failures_map_to_internal_error() {
    let server = server_for(BooksModule::with_store(Arc::new(UnreachableStore)));

    server
        .post("/api/v1/books")
        .json(&dune())
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    server
        .get("/api/v1/books")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    server
        .get("/api/v1/books/book/a")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    server
        .put("/api/v1/books/book/a")
        .json(&dune())
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    server
        .delete("/api/v1/books/book/a")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    server
        .delete("/api/v1/books")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn openapi_document_lists_book_routes() {
    let server = test_server();

    let response = server.get("/docs/openapi.json").await;

    response.assert_status_ok();
    let spec: Value = response.json();
    assert!(spec["paths"]["/api/v1/books"]["post"].is_object());
    assert!(spec["paths"]["/api/v1/books/book/{id}"]["put"].is_object());
    assert!(spec["components"]["schemas"]["Book"].is_object());
}
