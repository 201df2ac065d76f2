//! services/client/src/collab/protocol.rs
//!
//! Defines the JSON messages exchanged on `/ws/collab/<document_id>/`.

use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

/// An event broadcast to everyone in the document's room.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum CollabEvent {
    /// Someone changed the content. The new content replaces the old.
    Edit {
        #[serde(default)]
        content: String,
        #[serde(default)]
        user: String,
    },

    /// Someone joined or left the room.
    Presence { user: String, action: PresenceAction },

    /// Someone saved the document.
    Save {
        #[serde(default)]
        user: String,
    },

    /// Someone shared the document.
    Share {
        #[serde(default)]
        user: String,
    },
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceAction {
    Joined,
    Left,
}

/// The discriminant of a `CollabEvent`, used to key handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Edit,
    Presence,
    Save,
    Share,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Edit,
        EventKind::Presence,
        EventKind::Save,
        EventKind::Share,
    ];
}

impl CollabEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CollabEvent::Edit { .. } => EventKind::Edit,
            CollabEvent::Presence { .. } => EventKind::Presence,
            CollabEvent::Save { .. } => EventKind::Save,
            CollabEvent::Share { .. } => EventKind::Share,
        }
    }

    /// The user the server attributes the event to.
    pub fn user(&self) -> &str {
        match self {
            CollabEvent::Edit { user, .. }
            | CollabEvent::Presence { user, .. }
            | CollabEvent::Save { user }
            | CollabEvent::Share { user } => user,
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

/// The server fills in the acting user itself.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum CollabCommand {
    Edit { content: String },
    Save,
    Share,
}
