//! services/client/src/collab/state.rs

use super::protocol::{CollabEvent, PresenceAction};
use std::collections::BTreeSet;

/// What a participant knows about the shared document. Edits are whole
/// documents, so the latest one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollabState {
    pub content: Option<String>,
    pub last_editor: Option<String>,
    pub online: BTreeSet<String>,
    pub last_saved_by: Option<String>,
    pub last_shared_by: Option<String>,
}

impl CollabState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &CollabEvent) {
        match event {
            CollabEvent::Edit { content, user } => {
                self.content = Some(content.clone());
                self.last_editor = Some(user.clone());
            }
            CollabEvent::Presence { user, action } => match action {
                PresenceAction::Joined => {
                    self.online.insert(user.clone());
                }
                PresenceAction::Left => {
                    self.online.remove(user);
                }
            },
            CollabEvent::Save { user } => self.last_saved_by = Some(user.clone()),
            CollabEvent::Share { user } => self.last_shared_by = Some(user.clone()),
        }
    }

    pub fn is_online(&self, user: &str) -> bool {
        self.online.contains(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(user: &str, action: PresenceAction) -> CollabEvent {
        CollabEvent::Presence {
            user: user.into(),
            action,
        }
    }

    #[test]
    fn last_edit_wins() {
        let mut state = CollabState::new();
        state.apply(&CollabEvent::Edit {
            content: "first".into(),
            user: "ana".into(),
        });
        state.apply(&CollabEvent::Edit {
            content: "second".into(),
            user: "bo".into(),
        });
        assert_eq!(state.content.as_deref(), Some("second"));
        assert_eq!(state.last_editor.as_deref(), Some("bo"));
    }

    #[test]
    fn presence_tracks_who_is_online() {
        let mut state = CollabState::new();
        state.apply(&presence("ana", PresenceAction::Joined));
        state.apply(&presence("bo", PresenceAction::Joined));
        state.apply(&presence("ana", PresenceAction::Left));
        // Leaving twice is harmless.
        state.apply(&presence("ana", PresenceAction::Left));
        assert!(!state.is_online("ana"));
        assert!(state.is_online("bo"));
        assert_eq!(state.online.len(), 1);
    }

    #[test]
    fn save_and_share_record_the_actor() {
        let mut state = CollabState::new();
        state.apply(&CollabEvent::Save { user: "ana".into() });
        state.apply(&CollabEvent::Share { user: "bo".into() });
        assert_eq!(state.last_saved_by.as_deref(), Some("ana"));
        assert_eq!(state.last_shared_by.as_deref(), Some("bo"));
        assert!(state.content.is_none());
    }
}
