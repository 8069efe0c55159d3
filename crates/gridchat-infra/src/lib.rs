//! Infrastructure implementations for GridChat.
//!
//! Adapters behind the ports defined in `gridchat-core`: the SQLite-backed
//! chat store, the OpenAI-compatible HTTP provider, the remote-process
//! provider, and the application config loader.

pub mod config;
pub mod llm;
pub mod sqlite;
