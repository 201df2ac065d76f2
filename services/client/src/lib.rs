pub mod adapters;
pub mod autosave;
pub mod cli;
pub mod collab;
pub mod config;
pub mod error;
pub mod preferences;
pub mod session;
