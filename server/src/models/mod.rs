pub mod asset;
pub mod event;
pub mod location;
pub mod user;

pub use asset::{Asset, FilePart};
pub use event::{CreateEventRequest, Event, NearbyQuery};
pub use location::Location;
pub use user::{Member, User};
