//! crates/atticus_core/src/draft.rs
//!
//! Local draft state for the editor: the values being edited and the last
//! values known to be saved on the server. A save is only worth issuing when
//! the two differ.

use crate::convert::{html_to_text, text_to_html, word_count};
use crate::domain::{Chapter, Document, DraftUpdate};

/// A title/content pair in plain-text form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftSnapshot {
    pub title: String,
    pub content: String,
}

impl DraftSnapshot {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Builds a snapshot from server data, whose content is HTML.
    pub fn from_server(title: &str, html: &str) -> Self {
        Self::new(title, html_to_text(html))
    }

    /// The request body that persists this snapshot.
    pub fn to_update(&self) -> DraftUpdate {
        DraftUpdate {
            title: self.title.clone(),
            content: text_to_html(&self.content),
        }
    }
}

impl From<&Chapter> for DraftSnapshot {
    fn from(chapter: &Chapter) -> Self {
        Self::from_server(&chapter.title, &chapter.content)
    }
}

impl From<&Document> for DraftSnapshot {
    fn from(document: &Document) -> Self {
        Self::from_server(&document.title, &document.content)
    }
}

/// Tracks the current draft against the last-known-saved snapshot.
#[derive(Debug, Clone)]
pub struct DraftTracker {
    current: DraftSnapshot,
    saved: DraftSnapshot,
}

impl DraftTracker {
    /// Starts clean: the opening values are what the server already has.
    pub fn new(initial: DraftSnapshot) -> Self {
        Self {
            current: initial.clone(),
            saved: initial,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.current.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.current.content = content.into();
    }

    pub fn current(&self) -> &DraftSnapshot {
        &self.current
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.saved
    }

    /// The snapshot to send, or `None` when it matches what is saved.
    pub fn pending(&self) -> Option<DraftSnapshot> {
        self.is_dirty().then(|| self.current.clone())
    }

    /// Records that `snapshot` reached the server. Edits made while the
    /// request was in flight keep the draft dirty.
    pub fn mark_saved(&mut self, snapshot: DraftSnapshot) {
        self.saved = snapshot;
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.current.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_chapter_is_clean() {
        let chapter = Chapter {
            id: 1,
            title: "Opening".into(),
            content: "<p>It was a dark night.</p>".into(),
            ..Default::default()
        };
        let tracker = DraftTracker::new(DraftSnapshot::from(&chapter));
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.current().content, "It was a dark night.");
        assert_eq!(tracker.word_count(), 5);
        assert!(tracker.pending().is_none());
    }

    #[test]
    fn editing_back_to_the_saved_value_is_not_dirty() {
        let mut tracker = DraftTracker::new(DraftSnapshot::new("T", "body"));
        tracker.set_content("body!");
        assert!(tracker.is_dirty());
        tracker.set_content("body");
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn edits_during_a_save_stay_pending() {
        let mut tracker = DraftTracker::new(DraftSnapshot::new("T", "a"));
        tracker.set_content("ab");
        let sent = tracker.pending().unwrap();
        tracker.set_content("abc");
        tracker.mark_saved(sent);
        assert!(tracker.is_dirty());
        assert_eq!(tracker.pending().unwrap().content, "abc");
    }

    #[test]
    fn update_body_is_html() {
        let snapshot = DraftSnapshot::new("Title", "one\n\ntwo");
        let update = snapshot.to_update();
        assert_eq!(update.title, "Title");
        assert_eq!(update.content, "<p>one</p><p>two</p>");
    }
}
