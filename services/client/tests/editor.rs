//! services/client/tests/editor.rs
//!
//! An editor session saving through the HTTP adapter.

use atticus_core::domain::Chapter;
use atticus_core::draft::DraftSnapshot;
use atticus_core::ports::{KeyValueStore, WriterApi};
use client_lib::adapters::{ChapterDraftSink, DocumentDraftSink, HttpWriterApi, MemoryKeyValueStore, TOKEN_KEY};
use client_lib::autosave::EditorSession;
use client_lib::config::Config;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn api_for(server: &MockServer) -> Arc<dyn WriterApi> {
    let store = Arc::new(MemoryKeyValueStore::new());
    store.set(TOKEN_KEY, "t").await.unwrap();
    let config = Config {
        api_base_url: server.uri(),
        ..Config::default()
    };
    Arc::new(HttpWriterApi::new(&config, store).unwrap())
}

#[tokio::test]
async fn chapter_edits_are_saved_as_html() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/writer/api/chapters/5/"))
        .and(body_json(json!({
            "title": "Opening",
            "content": "<p>It was late.</p><p>Nobody &amp; nothing stirred.</p>"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .expect(1)
        .mount(&server)
        .await;

    let chapter = Chapter {
        id: 5,
        title: "Opening".into(),
        content: "<p>It was late.</p>".into(),
        ..Default::default()
    };
    let api = api_for(&server).await;
    let session = EditorSession::new(
        DraftSnapshot::from(&chapter),
        Arc::new(ChapterDraftSink::new(api, 5)),
        Duration::from_secs(60),
    );
    assert!(!session.status().dirty);

    session
        .set_content("It was late.\n\nNobody & nothing stirred.")
        .await;
    assert!(session.status().dirty);
    assert!(session.save_now().await.unwrap());
    assert!(!session.status().dirty);

    // Nothing changed since, so closing sends nothing more.
    assert!(!session.close().await.unwrap());
}

#[tokio::test]
async fn document_drafts_save_on_close() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/writer/api/documents/8/"))
        .and(body_json(json!({"title": "Notes", "content": "<p>one<br>two</p>"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 8})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let session = EditorSession::new(
        DraftSnapshot::new("Notes", ""),
        Arc::new(DocumentDraftSink::new(api, 8)),
        Duration::from_secs(60),
    );
    session.set_content("one\ntwo").await;
    assert!(session.close().await.unwrap());
}
