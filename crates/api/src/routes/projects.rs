//! Route definitions for the `/projects` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{layers, projects};
use crate::state::AppState;
use crate::ws;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                   -> list
/// POST   /                                   -> submit
/// GET    /{id}                               -> get_by_id
/// DELETE /{id}                               -> delete
/// GET    /{id}/status                        -> status
/// POST   /{id}/cancel                        -> cancel
/// GET    /{id}/layers                        -> list_layers
/// POST   /{id}/layers/{layer_id}/regenerate  -> regenerate
/// GET    /{id}/ws                            -> progress WebSocket
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list).post(projects::submit))
        .route(
            "/{id}",
            get(projects::get_by_id).delete(projects::delete),
        )
        .route("/{id}/status", get(projects::status))
        .route("/{id}/cancel", post(projects::cancel))
        .route("/{id}/layers", get(projects::list_layers))
        .route(
            "/{id}/layers/{layer_id}/regenerate",
            post(layers::regenerate),
        )
        .route("/{id}/ws", get(ws::handler::ws_handler))
}
