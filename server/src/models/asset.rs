use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Asset {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Builds the record for a file stored as `name` inside `folder`.
    pub fn stored_in(event_id: Uuid, folder: &str, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            url: format!("{}/{}", folder, name),
            name,
            created_at: Utc::now(),
        }
    }
}

/// An uploaded file as received from the client, before it is persisted.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FilePart {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
