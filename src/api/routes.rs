use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::{self, AppState};
use crate::store::EntityStore;

/// `:kind` is a plural resource name (`programs`, `instruments`, `templates`, ...)
/// or a snake_case kind key
pub fn create_router<S: EntityStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Cloning composition roots
        .route("/:kind/:id/clone", post(handlers::clone_entity::<S>))
        // Reads
        .route("/:kind/:id", get(handlers::get_entity::<S>))
        .route("/:kind/:id/graph", get(handlers::get_entity_graph::<S>))
}
