//! services/client/src/collab/mod.rs
//!
//! Live collaboration on a document over the backend's WebSocket channel.

pub mod connection;
pub mod handlers;
pub mod protocol;
pub mod state;

pub use connection::{collab_url, CollabConnection, CollabSender};
pub use handlers::HandlerMap;
pub use protocol::{CollabCommand, CollabEvent, EventKind, PresenceAction};
pub use state::CollabState;

/// Feeds every event from `connection` through `state` and then `handlers`
/// until the connection ends.
pub async fn pump(connection: &mut CollabConnection, handlers: &HandlerMap, state: &mut CollabState) {
    while let Some(event) = connection.next_event().await {
        state.apply(&event);
        handlers.dispatch(&event);
    }
}
