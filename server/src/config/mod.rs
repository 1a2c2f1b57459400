use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/eventhub";
const DEFAULT_UPLOAD_DIR: &str = "public";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_LOCATION_LAT: f64 = 42.0;
const DEFAULT_LOCATION_LON: f64 = 21.0;
const DEFAULT_NEARBY_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub storage: StorageKind,
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Coordinates stamped on locations created with new events.
    pub default_location: (f64, f64),
    pub nearby_radius_km: f64,
    /// Comma separated list, see [`cors::DEFAULT_ALLOWED_ORIGINS`].
    pub cors_allowed_origins: String,
    /// `RUST_ENV=production` turns on HSTS.
    pub production: bool,
    /// Bearer token of a seeded developer account, in-memory storage only.
    pub dev_session_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            storage: StorageKind::Postgres,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_location: (DEFAULT_LOCATION_LAT, DEFAULT_LOCATION_LON),
            nearby_radius_km: DEFAULT_NEARBY_RADIUS_KM,
            cors_allowed_origins: cors::DEFAULT_ALLOWED_ORIGINS.to_string(),
            production: false,
            dev_session_token: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unparsable values fall
    /// back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            storage: parse_or("STORAGE_BACKEND", &lookup, defaults.storage),
            bind_addr: parse_or("BIND_ADDR", &lookup, defaults.bind_addr),
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", &lookup, defaults.max_upload_bytes),
            default_location: (
                parse_or("DEFAULT_LOCATION_LAT", &lookup, defaults.default_location.0),
                parse_or("DEFAULT_LOCATION_LON", &lookup, defaults.default_location.1),
            ),
            nearby_radius_km: parse_or("NEARBY_RADIUS_KM", &lookup, defaults.nearby_radius_km),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or(defaults.cors_allowed_origins),
            production: lookup("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(defaults.production),
            dev_session_token: lookup("DEV_SESSION_TOKEN")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        }
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Config: invalid {}='{}' ({}), using {:?}", key, raw, e, default);
                default
            }
        },
    }
}
