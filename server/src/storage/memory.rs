// In-memory store for dev mode and tests.
// Data lives in parking_lot locks and is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{EventStore, SessionStore, StoreResult};
use crate::models::{Asset, Event, Location, User};

struct Session {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryEventStore {
    users: RwLock<HashMap<Uuid, User>>,
    sessions: RwLock<HashMap<String, Session>>,
    locations: RwLock<HashMap<Uuid, Location>>,
    // Vec keeps creation order for listing
    events: RwLock<Vec<Event>>,
    participants: RwLock<HashMap<Uuid, Vec<Uuid>>>,
    assets: RwLock<HashMap<Uuid, Vec<Asset>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.write().insert(user.id, user);
    }

    /// Registers a session token for `user_id` valid until `expires_at`.
    pub fn insert_session(&self, token: impl Into<String>, user_id: Uuid, expires_at: DateTime<Utc>) {
        self.sessions
            .write()
            .insert(token.into(), Session { user_id, expires_at });
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn find_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(self.events.read().iter().find(|e| e.id == id).cloned())
    }

    async fn all_events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.events.read().clone())
    }

    async fn public_events(&self) -> StoreResult<Vec<Event>> {
        Ok(self
            .events
            .read()
            .iter()
            .filter(|e| !e.is_private)
            .cloned()
            .collect())
    }

    async fn all_locations(&self) -> StoreResult<Vec<Location>> {
        Ok(self.locations.read().values().cloned().collect())
    }

    async fn create_event(&self, location: &Location, event: &Event) -> StoreResult<()> {
        let mut locations = self.locations.write();
        let mut events = self.events.write();
        let mut participants = self.participants.write();

        locations.insert(location.id, location.clone());
        events.push(event.clone());
        participants.insert(event.id, vec![event.creator_id]);
        Ok(())
    }

    async fn add_participant(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut participants = self.participants.write();
        let members = participants.entry(event_id).or_default();
        if members.contains(&user_id) {
            return Ok(false);
        }
        members.push(user_id);
        Ok(true)
    }

    async fn is_participant(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .participants
            .read()
            .get(&event_id)
            .is_some_and(|members| members.contains(&user_id)))
    }

    async fn participants(&self, event_id: Uuid) -> StoreResult<Vec<User>> {
        let participants = self.participants.read();
        let users = self.users.read();
        Ok(participants
            .get(&event_id)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|id| users.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_asset(&self, asset: &Asset) -> StoreResult<()> {
        self.assets
            .write()
            .entry(asset.event_id)
            .or_default()
            .push(asset.clone());
        Ok(())
    }

    async fn assets(&self, event_id: Uuid) -> StoreResult<Vec<Asset>> {
        Ok(self
            .assets
            .read()
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl SessionStore for InMemoryEventStore {
    async fn find_session_user(&self, token: &str) -> StoreResult<Option<User>> {
        let sessions = self.sessions.read();
        let Some(session) = sessions.get(token) else {
            return Ok(None);
        };
        if session.expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(self.users.read().get(&session.user_id).cloned())
    }
}
