use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location_id: Uuid,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /events/create`.
///
/// Dates stay raw strings here; they are validated as `dd.MM.yyyy` by the
/// event service so a malformed date surfaces as a validation error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(rename = "location")]
    pub location_label: String,
    pub is_private: bool,
}

/// Query string of `GET /events/closeby`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
}
