pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use booknest_kernel::{InitCtx, Module};
use serde_json::json;

use store::{BookStore, StoreHandle};

/// Books module: CRUD over a single `books` collection
pub struct BooksModule {
    store: StoreHandle,
}

impl BooksModule {
    /// A module that connects its store during `init`
    pub fn new() -> Self {
        Self {
            store: StoreHandle::new(),
        }
    }

    /// A module bound to an already-open store; `init` leaves it as is
    pub fn with_store(store: Arc<dyn BookStore>) -> Self {
        Self {
            store: StoreHandle::connected(store),
        }
    }

    /// Shared handle to the module's store slot
    pub fn store_handle(&self) -> StoreHandle {
        self.store.clone()
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if !self.store.is_connected() {
            let store = store::connect(&ctx.settings.database)
                .await
                .context("failed to connect to the book store")?;
            self.store.attach(store)?;
        }

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            collection = %ctx.settings.database.collection,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }

    async fn health(&self) -> anyhow::Result<()> {
        if !self.store.is_connected() {
            anyhow::bail!("Database not connected");
        }
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_body(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_parameter = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    });
    let request_body = json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "Every stored book",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("Store failure")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "description": "Assigns a random id when none is given. An existing id is overwritten.",
                    "tags": ["Books"],
                    "requestBody": request_body.clone(),
                    "responses": {
                        "201": book_body("Created book, including its id"),
                        "400": error_response("Malformed request body"),
                        "500": error_response("Store failure")
                    }
                },
                "delete": {
                    "summary": "Delete every book",
                    "tags": ["Books"],
                    "responses": {
                        "204": { "description": "All books deleted" },
                        "500": error_response("Store failure; earlier batches stay deleted")
                    }
                }
            },
            "/book/{id}": {
                "get": {
                    "summary": "Fetch a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter.clone()],
                    "responses": {
                        "200": book_body("The book"),
                        "404": error_response("Book not found"),
                        "500": error_response("Store failure")
                    }
                },
                "put": {
                    "summary": "Replace a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter.clone()],
                    "requestBody": request_body,
                    "responses": {
                        "204": { "description": "Book replaced" },
                        "400": error_response("Malformed request body"),
                        "404": error_response("Book not found"),
                        "500": error_response("Store failure")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter],
                    "responses": {
                        "204": { "description": "Book deleted" },
                        "404": error_response("Book not found"),
                        "500": error_response("Store failure")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "string",
                            "description": "Unique identifier, generated when omitted on create"
                        },
                        "name": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string" },
                        "genre": { "type": "string" }
                    },
                    "required": ["name", "author", "isbn", "genre"]
                }
            }
        }
    })
}
