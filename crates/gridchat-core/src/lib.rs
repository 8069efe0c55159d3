//! Business logic and port definitions for GridChat.
//!
//! This crate defines the "ports" (the [`chat::store::ChatStore`] and
//! [`llm::provider::LlmProvider`] traits) that the infrastructure layer
//! implements, plus the stream demultiplexer and turn orchestration that
//! sit between them. It depends only on `gridchat-types` -- never on
//! `gridchat-infra` or any database/HTTP crate.

pub mod chat;
pub mod llm;
