//! Event orchestration: creation, membership, listing and asset uploads.
//!
//! Every operation checks existence and membership before touching the
//! store or the uploader.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Asset, CreateEventRequest, Event, FilePart, Location, NearbyQuery, User};
use crate::storage::{AssetUploader, EventStore};
use crate::utils::error::AppError;

const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Clone, Copy)]
pub struct EventSettings {
    pub default_location: (f64, f64),
    pub nearby_radius_km: f64,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for EventSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_location: config.default_location,
            nearby_radius_km: config.nearby_radius_km,
        }
    }
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
    uploader: Arc<dyn AssetUploader>,
    settings: EventSettings,
}

impl EventService {
    pub fn new(
        store: Arc<dyn EventStore>,
        uploader: Arc<dyn AssetUploader>,
        settings: EventSettings,
    ) -> Self {
        Self {
            store,
            uploader,
            settings,
        }
    }

    /// Folder holding the uploaded files of an event.
    pub fn asset_folder(event_id: Uuid) -> String {
        format!("assets/{}", event_id)
    }

    async fn require_event(&self, event_id: Uuid) -> Result<Event, AppError> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event '{}' was not found", event_id)))
    }

    async fn require_participant(&self, event: &Event, user: &User) -> Result<(), AppError> {
        if self.store.is_participant(event.id, user.id).await? {
            Ok(())
        } else {
            Err(AppError::ValidationError(
                "You are not a participant of this event".to_string(),
            ))
        }
    }

    // ============================================
    // Membership
    // ============================================

    pub async fn join(&self, event_id: Uuid, user: &User) -> Result<Event, AppError> {
        let event = self.require_event(event_id).await?;

        if !self.store.add_participant(event.id, user.id).await? {
            return Err(AppError::ValidationError(
                "You are already a participant of this event".to_string(),
            ));
        }

        info!(event_id = %event.id, user_id = %user.id, "User joined event");
        Ok(event)
    }

    /// Participants in join order. Open to any caller.
    pub async fn list_members(&self, event_id: Uuid) -> Result<Vec<User>, AppError> {
        let event = self.store.find_event(event_id).await?.ok_or_else(|| {
            AppError::ValidationError(format!("Event '{}' does not exist", event_id))
        })?;

        Ok(self.store.participants(event.id).await?)
    }

    // ============================================
    // Assets
    // ============================================

    pub async fn list_assets(&self, event_id: Uuid, user: &User) -> Result<Vec<Asset>, AppError> {
        let event = self.require_event(event_id).await?;
        self.require_participant(&event, user).await?;

        Ok(self.store.assets(event.id).await?)
    }

    /// Stores the file bytes, then records the asset against the event.
    ///
    /// The event is resolved before the caller, so an unknown event is
    /// reported as missing even to anonymous callers. If the record cannot be
    /// persisted the written file is removed again.
    pub async fn upload_asset(
        &self,
        event_id: Uuid,
        user: Option<&User>,
        part: Option<FilePart>,
    ) -> Result<Asset, AppError> {
        let event = self.require_event(event_id).await?;
        let user = user.ok_or_else(|| {
            AppError::AuthError("Sign in to upload files to an event".to_string())
        })?;
        self.require_participant(&event, user).await?;

        let part = match part {
            Some(part) if !part.is_empty() => part,
            Some(_) => {
                return Err(AppError::ValidationError(
                    "The uploaded file is empty".to_string(),
                ))
            }
            None => {
                return Err(AppError::ValidationError(
                    "Missing form field 'file'".to_string(),
                ))
            }
        };

        let folder = Self::asset_folder(event.id);
        let name = self.uploader.upload_file(&part, &folder).await?;
        let asset = Asset::stored_in(event.id, &folder, name);

        if let Err(e) = self.store.insert_asset(&asset).await {
            if let Err(cleanup) = self.uploader.remove_file(&folder, &asset.name).await {
                warn!(
                    event_id = %event.id,
                    file = %asset.url,
                    error = %cleanup,
                    "Failed to remove orphaned asset file"
                );
            }
            return Err(e.into());
        }

        info!(
            event_id = %event.id,
            user_id = %user.id,
            asset_id = %asset.id,
            bytes = part.data.len(),
            "Asset uploaded"
        );
        Ok(asset)
    }

    // ============================================
    // Creation
    // ============================================

    /// Creates an event owned by `creator`, who becomes its first participant.
    pub async fn create_event(
        &self,
        creator: &User,
        request: CreateEventRequest,
    ) -> Result<Event, AppError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("Title must not be empty".to_string()));
        }
        let start_date = parse_date("startDate", &request.start_date)?;
        let end_date = parse_date("endDate", &request.end_date)?;
        if end_date < start_date {
            return Err(AppError::ValidationError(
                "endDate must not be before startDate".to_string(),
            ));
        }

        // Locations are not looked up yet; every event gets its own row
        let (latitude, longitude) = self.settings.default_location;
        let location = Location::new(request.location_label, latitude, longitude);

        let event = Event {
            id: Uuid::new_v4(),
            creator_id: creator.id,
            title: title.to_string(),
            description: request.description,
            start_date,
            end_date,
            location_id: location.id,
            is_private: request.is_private,
            created_at: Utc::now(),
        };
        self.store.create_event(&location, &event).await?;

        info!(event_id = %event.id, creator_id = %creator.id, "Event created");
        Ok(event)
    }

    // ============================================
    // Listing
    // ============================================

    pub async fn list_public_events(&self) -> Result<Vec<Event>, AppError> {
        Ok(self.store.public_events().await?)
    }

    /// All events when no coordinates are given, otherwise the events whose
    /// location lies within the radius of the given point.
    pub async fn list_nearby_events(&self, query: &NearbyQuery) -> Result<Vec<Event>, AppError> {
        let (lat, lon) = match (query.lat, query.lon) {
            (None, None) => return Ok(self.store.all_events().await?),
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(AppError::ValidationError(
                    "Both 'lat' and 'lon' are required for a nearby search".to_string(),
                ))
            }
        };
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(AppError::ValidationError("Coordinates out of range".to_string()));
        }
        let radius = query.radius_km.unwrap_or(self.settings.nearby_radius_km);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(AppError::ValidationError(
                "'radius_km' must be a positive number".to_string(),
            ));
        }

        let locations = self.store.all_locations().await?;
        let events = self.store.all_events().await?;

        Ok(events
            .into_iter()
            .filter(|event| {
                locations
                    .iter()
                    .find(|l| l.id == event.location_id)
                    .is_some_and(|l| l.distance_km(lat, lon) <= radius)
            })
            .collect())
    }
}

/// Strict `dd.MM.yyyy`: zero padded day and month, four digit year.
fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    let invalid = || {
        AppError::ValidationError(format!(
            "'{}' must be a date in dd.MM.yyyy format, got '{}'",
            field, value
        ))
    };

    let well_formed = value.len() == 10
        && value.char_indices().all(|(i, c)| match i {
            2 | 5 => c == '.',
            _ => c.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}
