use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Generated outreach message, unique per `(user_id, job_id)`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserJobOffer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub offer_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserJobOffer {
    pub fn new(user_id: Uuid, job_id: Uuid, offer_text: String) -> Self {
        let now = Utc::now();
        UserJobOffer {
            id: Uuid::new_v4(),
            user_id,
            job_id,
            offer_text,
            created_at: now,
            updated_at: now,
        }
    }
}
