//! Persistence and byte-storage seams used by the event service.
//!
//! - [`EventStore`]: events, locations, the participant relation and assets
//! - [`SessionStore`]: resolves session tokens to users for the identity provider
//! - [`AssetUploader`]: the byte sink behind asset uploads

pub mod backend;
pub mod memory;
pub mod postgres;
pub mod uploader;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Asset, Event, FilePart, Location, User};

pub use backend::StorageBackend;
pub use memory::InMemoryEventStore;
pub use postgres::PgEventStore;
pub use uploader::{LocalFileUploader, UploadError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>>;

    async fn all_events(&self) -> StoreResult<Vec<Event>>;

    /// Events with `is_private = false`.
    async fn public_events(&self) -> StoreResult<Vec<Event>>;

    async fn all_locations(&self) -> StoreResult<Vec<Location>>;

    /// Persists the location, the event and the creator's membership as one
    /// unit. Either all three are visible afterwards or none is.
    async fn create_event(&self, location: &Location, event: &Event) -> StoreResult<()>;

    /// Attaches `user_id` to the event unless already attached.
    ///
    /// Returns `true` when a new membership was recorded. Implementations
    /// must perform the check and the insert as one atomic step.
    async fn add_participant(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    async fn is_participant(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Participants in the order they joined.
    async fn participants(&self, event_id: Uuid) -> StoreResult<Vec<User>>;

    /// Persists the asset and attaches it to `asset.event_id`.
    async fn insert_asset(&self, asset: &Asset) -> StoreResult<()>;

    /// Assets of an event in insertion order.
    async fn assets(&self, event_id: Uuid) -> StoreResult<Vec<Asset>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The user owning an unexpired session token.
    async fn find_session_user(&self, token: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// Writes the part into `folder` and returns the generated file name.
    async fn upload_file(&self, part: &FilePart, folder: &str) -> Result<String, UploadError>;

    async fn remove_file(&self, folder: &str, name: &str) -> Result<(), UploadError>;
}
