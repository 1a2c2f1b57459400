use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{EventStore, SessionStore, StoreResult};
use crate::models::{Asset, Event, Location, User};

const EVENT_COLUMNS: &str = "id, creator_id, title, description, start_date, end_date, \
                             location_id, is_private, created_at";

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn all_events(&self) -> StoreResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn public_events(&self) -> StoreResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE NOT is_private ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn all_locations(&self) -> StoreResult<Vec<Location>> {
        let locations =
            sqlx::query_as::<_, Location>("SELECT id, name, latitude, longitude FROM locations")
                .fetch_all(&self.pool)
                .await?;
        Ok(locations)
    }

    async fn create_event(&self, location: &Location, event: &Event) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO locations (id, name, latitude, longitude) VALUES ($1, $2, $3, $4)")
            .bind(location.id)
            .bind(&location.name)
            .bind(location.latitude)
            .bind(location.longitude)
            .execute(&mut *tx)
            .await?;

        sqlx::query(&format!(
            "INSERT INTO events ({EVENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(event.id)
        .bind(event.creator_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.location_id)
        .bind(event.is_private)
        .bind(event.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO event_participants (event_id, user_id) VALUES ($1, $2)")
            .bind(event.id)
            .bind(event.creator_id)
            .execute(&mut *tx)
            .await?;

        // Dropping the transaction on any error above rolls everything back
        tx.commit().await?;
        Ok(())
    }

    async fn add_participant(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        // The (event_id, user_id) unique key turns a concurrent duplicate into a no-op
        let result = sqlx::query(
            "INSERT INTO event_participants (event_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (event_id, user_id) DO NOTHING",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn is_participant(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let attached: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM event_participants WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(attached)
    }

    async fn participants(&self, event_id: Uuid) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.id, u.name, u.email, u.created_at, u.updated_at \
             FROM event_participants p JOIN users u ON u.id = p.user_id \
             WHERE p.event_id = $1 ORDER BY p.position",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert_asset(&self, asset: &Asset) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO assets (id, event_id, name, url, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(asset.id)
        .bind(asset.event_id)
        .bind(&asset.name)
        .bind(&asset.url)
        .bind(asset.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn assets(&self, event_id: Uuid) -> StoreResult<Vec<Asset>> {
        let assets = sqlx::query_as::<_, Asset>(
            "SELECT id, event_id, name, url, created_at FROM assets \
             WHERE event_id = $1 ORDER BY position",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(assets)
    }
}

#[async_trait]
impl SessionStore for PgEventStore {
    async fn find_session_user(&self, token: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.name, u.email, u.created_at, u.updated_at \
             FROM sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
