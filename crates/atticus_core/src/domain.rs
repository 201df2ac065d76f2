//! crates/atticus_core/src/domain.rs
//!
//! Defines the core data structures mirrored from the writing backend.
//! These are plain DTOs: the server is the source of truth for every derived
//! value (word counts, progress, ordering), so missing fields fall back to
//! their defaults instead of failing the whole response.

use serde::{Deserialize, Serialize};

/// Server-assigned primary key.
pub type Id = i64;

/// A writing project as listed on the bookshelf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub target_word_count: Option<u64>,
    pub progress_percentage: f64,
    pub chapter_count: u32,
    pub word_count: u64,
    /// Raw server timestamp; only parsed for display.
    pub updated_at: Option<String>,
}

/// A chapter of a project. `content` is an HTML fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chapter {
    pub id: Id,
    #[serde(rename = "project", alias = "project_id")]
    pub project_id: Option<Id>,
    pub title: String,
    pub content: String,
    pub order: i64,
    pub word_count: u64,
    pub updated_at: Option<String>,
}

/// A standalone document, optionally attached to a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub project: Option<Id>,
    pub is_published: bool,
    pub word_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    #[default]
    #[serde(alias = "contributor")]
    Collaborator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Collaborator => "collaborator",
        }
    }
}

/// Someone with access to a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collaborator {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Collaborator {
    /// The name when the server sent one, the email otherwise.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// The signed-in user's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Opaque token issued by the token-auth endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of logs.
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

//=========================================================================================
// Request Payloads
//=========================================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub genre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_word_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewChapter {
    pub title: String,
    pub content: String,
    pub order: i64,
}

impl NewChapter {
    /// The defaults used when a chapter is appended to a list of `existing` chapters.
    pub fn next_after(existing: usize) -> Self {
        Self {
            title: format!("Chapter {}", existing + 1),
            content: String::new(),
            order: existing as i64,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Id>,
}

/// The body of every draft save: a title and an HTML-encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftUpdate {
    pub title: String,
    pub content: String,
}

//=========================================================================================
// Response Envelopes
//=========================================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectList {
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChapterList {
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollaboratorList {
    pub collaborators: Vec<Collaborator>,
}

/// Response of the chapter-create endpoint, which reports failures in-band.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChapterCreated {
    pub success: bool,
    pub chapter: Option<Chapter>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShareLink {
    /// Absent on backends that answer with just the link.
    pub success: Option<bool>,
    #[serde(alias = "url")]
    pub share_url: Option<String>,
    pub project_title: Option<String>,
    pub error: Option<String>,
}

impl ShareLink {
    /// The link, unless the server flagged the request as failed.
    pub fn link(&self) -> Option<&str> {
        if self.success == Some(false) {
            return None;
        }
        self.share_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Response of the token-auth and registration endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenResponse {
    pub token: Option<String>,
}

impl TokenResponse {
    pub fn into_token(self) -> Option<AuthToken> {
        self.token.filter(|t| !t.is_empty()).map(AuthToken::new)
    }
}

/// Light or dark presentation, persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// Anything other than `"dark"` reads as light.
    pub fn from_stored(value: &str) -> Self {
        if value == "dark" {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_accepts_project_foreign_key_under_either_name() {
        let a: Chapter = serde_json::from_str(r#"{"id": 3, "project": 7, "title": "One"}"#).unwrap();
        let b: Chapter = serde_json::from_str(r#"{"id": 3, "project_id": 7}"#).unwrap();
        assert_eq!(a.project_id, Some(7));
        assert_eq!(b.project_id, Some(7));
        assert_eq!(a.content, "");
    }

    #[test]
    fn project_tolerates_missing_fields() {
        let p: Project = serde_json::from_str(r#"{"id": 1, "title": "Dune"}"#).unwrap();
        assert_eq!(p.title, "Dune");
        assert_eq!(p.chapter_count, 0);
        assert!(p.updated_at.is_none());
    }

    #[test]
    fn contributor_role_reads_as_collaborator() {
        let c: Collaborator =
            serde_json::from_str(r#"{"id": 2, "email": "a@b.c", "role": "contributor"}"#).unwrap();
        assert_eq!(c.role, Role::Collaborator);
        assert_eq!(c.display_name(), "a@b.c");
    }

    #[test]
    fn new_chapter_defaults_follow_list_length() {
        let next = NewChapter::next_after(2);
        assert_eq!(next.title, "Chapter 3");
        assert_eq!(next.order, 2);
        assert!(next.content.is_empty());
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = AuthToken::new("secret");
        assert_eq!(format!("{:?}", token), "AuthToken(***)");
    }

    #[test]
    fn theme_mode_reads_stored_values() {
        assert_eq!(ThemeMode::from_stored("dark"), ThemeMode::Dark);
        assert_eq!(ThemeMode::from_stored("light"), ThemeMode::Light);
        assert_eq!(ThemeMode::from_stored("garbage"), ThemeMode::Light);
        assert_eq!(ThemeMode::Light.toggled(), ThemeMode::Dark);
    }

    #[test]
    fn share_link_accepts_a_bare_url() {
        let bare: ShareLink = serde_json::from_str(r#"{"url":"https://x/s/abc"}"#).unwrap();
        assert_eq!(bare.share_url.as_deref(), Some("https://x/s/abc"));
        assert_eq!(bare.link(), Some("https://x/s/abc"));

        let failed: ShareLink =
            serde_json::from_str(r#"{"success":false,"share_url":"https://x","error":"nope"}"#)
                .unwrap();
        assert_eq!(failed.link(), None);
        assert_eq!(ShareLink::default().link(), None);
    }

    #[test]
    fn user_full_name_falls_back_to_username() {
        let user = User { username: "ada".into(), ..Default::default() };
        assert_eq!(user.full_name(), "ada");
    }
}
