pub mod http;
pub mod kv_store;

pub use http::{ChapterDraftSink, DocumentDraftSink, HttpWriterApi, TOKEN_KEY};
pub use kv_store::{FileKeyValueStore, MemoryKeyValueStore};
