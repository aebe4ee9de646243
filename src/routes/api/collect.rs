use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use crate::collectors::{CollectStats, Message};
use crate::error::AppError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct CollectRequest {
    pub messages: Vec<Message>,
}

/// Push a batch of chat messages through the collector.
pub async fn messages(
    State(state): State<AppState>,
    Json(input): Json<CollectRequest>,
) -> Result<Json<CollectStats>, AppError> {
    let stats = state.collector.handle_batch(input.messages).await;
    tracing::info!(
        received = stats.total(),
        submitted = stats.submitted,
        "Collected message batch"
    );
    Ok(Json(stats))
}
