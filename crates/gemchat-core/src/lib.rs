//! Core gemchat library (conversation store, chat session, streaming ingest, providers, config).

pub mod config;
pub mod conversation;
pub mod ingest;
pub mod providers;
pub mod session;
