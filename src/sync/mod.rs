//! State synchronization between the store and connected dashboards
//!
//! - `views`: host summaries and full character records
//! - `hub`: push delivery to websocket connections
//! - `projector`: reads for each audience, inbound edits, event publishing

mod hub;
mod projector;
mod views;

pub use hub::{
    Audience, ConnectionId, ConnectionManager, Delivery, Role, ServerMessage, Subscription,
};
pub use projector::{SyncProjector, HOST_NAME};
pub use views::{CharacterSummary, CharacterView, SheetView};
