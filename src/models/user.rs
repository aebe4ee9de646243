use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A requester whose CV feeds offer generation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub cv: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub cv: serde_json::Value,
    pub token_hash: String,
}

impl UserProfile {
    /// CV serialized as JSON for prompt building.
    pub fn cv_json(&self) -> String {
        serde_json::to_string(&self.cv).unwrap_or_default()
    }
}
