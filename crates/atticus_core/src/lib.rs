pub mod convert;
pub mod domain;
pub mod draft;
pub mod ports;
pub mod presentation;

pub use convert::{html_to_text, normalize_text, text_to_html, word_count};
pub use domain::{
    AuthToken, Chapter, Collaborator, Credentials, Document, DraftUpdate, Id, Project,
    Registration, Role, ThemeMode, User,
};
pub use draft::{DraftSnapshot, DraftTracker};
pub use ports::{DraftSink, KeyValueStore, PortError, PortResult, WriterApi};
pub use presentation::{Listing, Reorder, WordCountTier};
