pub mod callbacks;
pub mod health;
pub mod projects;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects                                        list, submit
/// /projects/{id}                                   get, delete
/// /projects/{id}/status                            status snapshot
/// /projects/{id}/cancel                            cancel (POST)
/// /projects/{id}/layers                            list layers
/// /projects/{id}/layers/{layer_id}/regenerate      regenerate mesh (POST)
/// /projects/{id}/ws                                progress WebSocket
///
/// /callbacks/progress                              mesh service callbacks (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", projects::router())
        .nest("/callbacks", callbacks::router())
}
