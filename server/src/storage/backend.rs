// Storage backend selection: PostgreSQL for production, in-memory for dev mode.

use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use super::{EventStore, InMemoryEventStore, PgEventStore, SessionStore, StoreResult};
use crate::models::User;

const MAX_CONNECTIONS: u32 = 5;
const DEV_SESSION_DAYS: i64 = 30;

#[derive(Clone)]
pub enum StorageBackend {
    Postgres(PgEventStore),
    InMemory(Arc<InMemoryEventStore>),
}

impl StorageBackend {
    /// Connects to PostgreSQL and applies pending migrations.
    pub async fn postgres(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        tracing::info!("Successfully connected to database");

        sqlx::migrate!().run(&pool).await?;
        tracing::info!("Migrations run successfully");

        Ok(Self::Postgres(PgEventStore::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryEventStore::new()))
    }

    /// Registers a developer account reachable with `token`.
    ///
    /// Only the in-memory backend has no other way to obtain a session, so
    /// the PostgreSQL backend leaves its users untouched and returns `None`.
    pub fn seed_dev_session(&self, token: &str) -> Option<User> {
        let Self::InMemory(store) = self else {
            return None;
        };
        let user = User::new("Developer", "dev@localhost");
        store.insert_user(user.clone());
        store.insert_session(token, user.id, Utc::now() + Duration::days(DEV_SESSION_DAYS));
        Some(user)
    }

    pub fn event_store(&self) -> Arc<dyn EventStore> {
        match self {
            Self::Postgres(store) => Arc::new(store.clone()),
            Self::InMemory(store) => store.clone(),
        }
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        match self {
            Self::Postgres(store) => Arc::new(store.clone()),
            Self::InMemory(store) => store.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_dev_session_authenticates() {
        let backend = StorageBackend::in_memory();
        let user = backend.seed_dev_session("dev-token").unwrap();

        let sessions = backend.session_store();
        assert_eq!(sessions.find_session_user("dev-token").await.unwrap(), Some(user));
        assert_eq!(sessions.find_session_user("other").await.unwrap(), None);
    }
}
