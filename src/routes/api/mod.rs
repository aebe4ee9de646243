pub mod collect;
pub mod jobs;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use super::AppState;
use crate::auth::require_api_token;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/jobs", get(jobs::list))
        .route("/jobs/{id}", get(jobs::get))
        .route("/jobs/{id}/process", post(jobs::process))
        .route(
            "/jobs/{id}/offer",
            get(jobs::get_offer).post(jobs::generate_offer),
        )
        .route("/collect/messages", post(collect::messages))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_token,
        ))
        .with_state(state);

    Router::new().nest("/api/v1", protected)
}
