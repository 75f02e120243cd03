use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::store::StoreHandle;

/// Book routes, relative to the module mount point `/api/v1/books`.
pub fn router(store: StoreHandle) -> Router {
    tracing::debug!(target: "booknest.routes", "registering books routes");

    Router::new()
        .route(
            "/",
            post(handlers::create_book)
                .get(handlers::list_books)
                .delete(handlers::delete_all_books),
        )
        .route(
            "/book/{id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .with_state(store)
}
