use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::services::EventService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub identity: Arc<dyn IdentityProvider>,
    pub max_upload_bytes: usize,
}
