//! crates/atticus_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client logic depends on.
//! These traits form the boundary of the hexagonal architecture: the core never
//! talks HTTP or touches the filesystem, the `client` service plugs adapters in.

use async_trait::async_trait;

use crate::domain::{
    AuthToken, Chapter, ChapterCreated, Collaborator, Credentials, Document, DraftUpdate, Id,
    NewChapter, NewDocument, NewProject, Project, Registration, Role, ShareLink, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (HTTP, storage).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote writing backend.
#[async_trait]
pub trait WriterApi: Send + Sync {
    // --- Auth ---
    async fn login(&self, credentials: &Credentials) -> PortResult<AuthToken>;

    /// Not every backend hands out a token on registration.
    async fn register(&self, registration: &Registration) -> PortResult<Option<AuthToken>>;

    async fn current_user(&self) -> PortResult<User>;

    /// Any HTTP answer counts as reachable.
    async fn test_connection(&self) -> PortResult<()>;

    // --- Projects ---
    async fn list_projects(&self, bookshelf_only: bool) -> PortResult<Vec<Project>>;

    async fn get_project(&self, project_id: Id) -> PortResult<Project>;

    async fn create_project(&self, project: &NewProject) -> PortResult<Project>;

    async fn update_project(&self, project_id: Id, project: &NewProject) -> PortResult<Project>;

    async fn delete_project(&self, project_id: Id) -> PortResult<()>;

    // --- Chapters ---
    async fn list_chapters(&self, project_id: Id) -> PortResult<Vec<Chapter>>;

    async fn get_chapter(&self, chapter_id: Id) -> PortResult<Chapter>;

    async fn create_chapter(&self, project_id: Id, chapter: &NewChapter)
        -> PortResult<ChapterCreated>;

    async fn update_chapter(&self, chapter_id: Id, update: &DraftUpdate) -> PortResult<Chapter>;

    /// `order` is the 0-based position.
    async fn reorder_chapter(&self, project_id: Id, chapter_id: Id, order: i64)
        -> PortResult<()>;

    // --- Documents ---
    async fn list_documents(&self) -> PortResult<Vec<Document>>;

    async fn create_document(&self, document: &NewDocument) -> PortResult<Document>;

    async fn update_document(&self, document_id: Id, update: &DraftUpdate)
        -> PortResult<Document>;

    async fn delete_document(&self, document_id: Id) -> PortResult<()>;

    // --- Collaboration ---
    async fn list_collaborators(&self, project_id: Id) -> PortResult<Vec<Collaborator>>;

    async fn invite_collaborator(&self, project_id: Id, email: &str) -> PortResult<()>;

    async fn remove_collaborator(&self, project_id: Id, collaborator_id: Id) -> PortResult<()>;

    async fn update_collaborator_role(
        &self,
        project_id: Id,
        collaborator_id: Id,
        role: Role,
    ) -> PortResult<()>;

    async fn share_link(&self, project_id: Id) -> PortResult<ShareLink>;
}

/// Local string key-value persistence (auth token, preferences).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// Where a draft is written back to: a chapter or a document.
#[async_trait]
pub trait DraftSink: Send + Sync {
    async fn save_draft(&self, update: &DraftUpdate) -> PortResult<()>;
}
