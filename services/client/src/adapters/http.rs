//! services/client/src/adapters/http.rs
//!
//! This module contains the adapter for the writing backend's REST API.
//! It implements the `WriterApi` port from the core crate over `reqwest`,
//! plus the `DraftSink` adapters the editor saves through.

use crate::config::{AuthScheme, Config};
use async_trait::async_trait;
use atticus_core::domain::{
    AuthToken, Chapter, ChapterCreated, ChapterList, Collaborator, CollaboratorList, Credentials,
    Document, DraftUpdate, Id, NewChapter, NewDocument, NewProject, Project, ProjectList,
    Registration, Role, ShareLink, TokenResponse, User,
};
use atticus_core::ports::{DraftSink, KeyValueStore, PortError, PortResult, WriterApi};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// The key the auth token is persisted under.
pub const TOKEN_KEY: &str = "authToken";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `WriterApi` port against the HTTP backend.
#[derive(Clone)]
pub struct HttpWriterApi {
    client: Client,
    base_url: String,
    auth_scheme: AuthScheme,
    store: Arc<dyn KeyValueStore>,
}

impl HttpWriterApi {
    /// Creates a new `HttpWriterApi` from the loaded configuration.
    pub fn new(config: &Config, store: Arc<dyn KeyValueStore>) -> PortResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            auth_scheme: config.auth_scheme,
            store,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Starts a request, attaching the persisted token when `authed` is set.
    async fn request(&self, method: Method, path: &str, authed: bool) -> PortResult<RequestBuilder> {
        let mut builder = self
            .client
            .request(method.clone(), self.url(path))
            .header("Accept", "application/json");
        if authed {
            if let Some(token) = self.store.get(TOKEN_KEY).await? {
                builder = builder.header("Authorization", self.auth_scheme.header_value(&token));
            }
        }
        debug!("{} {}", method, path);
        Ok(builder)
    }

    /// Sends the request and maps every non-2xx status onto a `PortError`.
    async fn send(&self, builder: RequestBuilder, path: &str) -> PortResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => {
                warn!("{} answered 401; clearing the stored token.", path);
                if let Err(e) = self.store.remove(TOKEN_KEY).await {
                    warn!("Failed to clear the stored token: {:?}", e);
                }
                Err(PortError::Unauthorized)
            }
            StatusCode::NOT_FOUND => Err(PortError::NotFound(path.to_string())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(PortError::Rejected {
                    status: status.as_u16(),
                    message: error_message(&body)
                        .unwrap_or_else(|| fallback_message(status, &body)),
                })
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> PortResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| PortError::Unexpected(format!("Failed to decode response: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> PortResult<T> {
        let builder = self.request(Method::GET, path, true).await?;
        let response = self.send(builder, path).await?;
        Self::decode(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B, authed: bool) -> PortResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path, authed).await?.json(body);
        let response = self.send(builder, path).await?;
        Self::decode(response).await
    }

    /// For endpoints whose response body is not needed.
    async fn send_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> PortResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let mut builder = self.request(method, path, true).await?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder, path).await?;
        Ok(())
    }
}

/// Pulls the human-readable message out of a DRF style error body.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .or_else(|| {
            value
                .get("non_field_errors")
                .and_then(|errors| errors.get(0))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    // HTML error pages are noise on a terminal.
    if body.is_empty() || body.starts_with('<') {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

/// The users endpoint answers with either the profile or a one-element list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    // Tried first: a defaulted struct would also accept an empty array.
    Many(Vec<T>),
    One(T),
}

//=========================================================================================
// `WriterApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl WriterApi for HttpWriterApi {
    async fn login(&self, credentials: &Credentials) -> PortResult<AuthToken> {
        let response: TokenResponse = self
            .send_json(Method::POST, "/api-token-auth/", credentials, false)
            .await?;
        response
            .into_token()
            .ok_or_else(|| PortError::Unexpected("Login response carried no token".to_string()))
    }

    async fn register(&self, registration: &Registration) -> PortResult<Option<AuthToken>> {
        let response: TokenResponse = self
            .send_json(Method::POST, "/api/register/", registration, false)
            .await?;
        Ok(response.into_token())
    }

    async fn current_user(&self) -> PortResult<User> {
        match self.get_json::<OneOrMany<User>>("/writer/api/users/").await? {
            OneOrMany::One(user) => Ok(user),
            OneOrMany::Many(users) => users
                .into_iter()
                .next()
                .ok_or_else(|| PortError::NotFound("current user".to_string())),
        }
    }

    async fn test_connection(&self) -> PortResult<()> {
        let builder = self.request(Method::GET, "/api-token-auth/", false).await?;
        // Any status at all proves the server is there.
        builder
            .send()
            .await
            .map(|response| debug!("Connection test answered {}", response.status()))
            .map_err(|e| PortError::Network(e.to_string()))
    }

    // --- Projects ---

    async fn list_projects(&self, bookshelf_only: bool) -> PortResult<Vec<Project>> {
        if bookshelf_only {
            let list: ProjectList = self
                .get_json("/writer/projects/api/list/?bookshelf_only=true")
                .await?;
            Ok(list.projects)
        } else {
            self.get_json("/writer/api/projects/").await
        }
    }

    async fn get_project(&self, project_id: Id) -> PortResult<Project> {
        self.get_json(&format!("/writer/api/projects/{}/", project_id)).await
    }

    async fn create_project(&self, project: &NewProject) -> PortResult<Project> {
        self.send_json(Method::POST, "/writer/api/projects/", project, true)
            .await
    }

    async fn update_project(&self, project_id: Id, project: &NewProject) -> PortResult<Project> {
        let path = format!("/writer/api/projects/{}/", project_id);
        self.send_json(Method::PUT, &path, project, true).await
    }

    async fn delete_project(&self, project_id: Id) -> PortResult<()> {
        let path = format!("/writer/api/projects/{}/", project_id);
        self.send_unit::<Value>(Method::DELETE, &path, None).await
    }

    // --- Chapters ---

    async fn list_chapters(&self, project_id: Id) -> PortResult<Vec<Chapter>> {
        let path = format!("/writer/projects/{}/chapters/list/", project_id);
        let list: ChapterList = self.get_json(&path).await?;
        Ok(list.chapters)
    }

    async fn get_chapter(&self, chapter_id: Id) -> PortResult<Chapter> {
        self.get_json(&format!("/writer/api/chapters/{}/", chapter_id)).await
    }

    async fn create_chapter(
        &self,
        project_id: Id,
        chapter: &NewChapter,
    ) -> PortResult<ChapterCreated> {
        let path = format!("/writer/projects/{}/chapters/create/", project_id);
        self.send_json(Method::POST, &path, chapter, true).await
    }

    async fn update_chapter(&self, chapter_id: Id, update: &DraftUpdate) -> PortResult<Chapter> {
        let path = format!("/writer/api/chapters/{}/", chapter_id);
        self.send_json(Method::PUT, &path, update, true).await
    }

    async fn reorder_chapter(&self, project_id: Id, chapter_id: Id, order: i64) -> PortResult<()> {
        let path = format!("/writer/projects/{}/chapters/{}/order/", project_id, chapter_id);
        self.send_unit(Method::POST, &path, Some(&json!({ "order": order })))
            .await
    }

    // --- Documents ---

    async fn list_documents(&self) -> PortResult<Vec<Document>> {
        self.get_json("/writer/api/documents/").await
    }

    async fn create_document(&self, document: &NewDocument) -> PortResult<Document> {
        self.send_json(Method::POST, "/writer/api/documents/", document, true)
            .await
    }

    async fn update_document(&self, document_id: Id, update: &DraftUpdate) -> PortResult<Document> {
        let path = format!("/writer/api/documents/{}/", document_id);
        self.send_json(Method::PUT, &path, update, true).await
    }

    async fn delete_document(&self, document_id: Id) -> PortResult<()> {
        let path = format!("/writer/api/documents/{}/", document_id);
        self.send_unit::<Value>(Method::DELETE, &path, None).await
    }

    // --- Collaboration ---

    async fn list_collaborators(&self, project_id: Id) -> PortResult<Vec<Collaborator>> {
        let path = format!("/writer/projects/{}/collaborators/", project_id);
        let list: CollaboratorList = self.get_json(&path).await?;
        Ok(list.collaborators)
    }

    async fn invite_collaborator(&self, project_id: Id, email: &str) -> PortResult<()> {
        let path = format!("/writer/projects/{}/collaborators/invite/", project_id);
        self.send_unit(Method::POST, &path, Some(&json!({ "email": email })))
            .await
    }

    async fn remove_collaborator(&self, project_id: Id, collaborator_id: Id) -> PortResult<()> {
        let path = format!("/writer/projects/{}/collaborators/{}/", project_id, collaborator_id);
        self.send_unit::<Value>(Method::DELETE, &path, None).await
    }

    async fn update_collaborator_role(
        &self,
        project_id: Id,
        collaborator_id: Id,
        role: Role,
    ) -> PortResult<()> {
        let path = format!("/writer/projects/{}/collaborators/{}/", project_id, collaborator_id);
        self.send_unit(Method::PUT, &path, Some(&json!({ "role": role.as_str() })))
            .await
    }

    async fn share_link(&self, project_id: Id) -> PortResult<ShareLink> {
        self.get_json(&format!("/writer/projects/{}/share/", project_id))
            .await
    }
}

//=========================================================================================
// Draft Sinks
//=========================================================================================

/// Saves an editor draft into a chapter.
pub struct ChapterDraftSink {
    api: Arc<dyn WriterApi>,
    chapter_id: Id,
}

impl ChapterDraftSink {
    pub fn new(api: Arc<dyn WriterApi>, chapter_id: Id) -> Self {
        Self { api, chapter_id }
    }
}

#[async_trait]
impl DraftSink for ChapterDraftSink {
    async fn save_draft(&self, update: &DraftUpdate) -> PortResult<()> {
        self.api.update_chapter(self.chapter_id, update).await?;
        Ok(())
    }
}

/// Saves an editor draft into a standalone document.
pub struct DocumentDraftSink {
    api: Arc<dyn WriterApi>,
    document_id: Id,
}

impl DocumentDraftSink {
    pub fn new(api: Arc<dyn WriterApi>, document_id: Id) -> Self {
        Self { api, document_id }
    }
}

#[async_trait]
impl DraftSink for DocumentDraftSink {
    async fn save_draft(&self, update: &DraftUpdate) -> PortResult<()> {
        self.api.update_document(self.document_id, update).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail_then_error_then_field_errors() {
        assert_eq!(
            error_message(r#"{"detail":"Invalid token."}"#).as_deref(),
            Some("Invalid token.")
        );
        assert_eq!(
            error_message(r#"{"success":false,"error":"Only the owner can share"}"#).as_deref(),
            Some("Only the owner can share")
        );
        assert_eq!(
            error_message(r#"{"non_field_errors":["Unable to log in with provided credentials."]}"#)
                .as_deref(),
            Some("Unable to log in with provided credentials.")
        );
        assert_eq!(error_message(r#"{"title":["This field is required."]}"#), None);
        assert_eq!(error_message("<html>oops</html>"), None);
    }

    #[test]
    fn fallback_message_skips_html_pages() {
        assert_eq!(
            fallback_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>trace</html>"),
            "Internal Server Error"
        );
        assert_eq!(fallback_message(StatusCode::BAD_REQUEST, " plain "), "plain");
    }
}
