//! Shared domain types for GridChat.
//!
//! Pure data shapes and error enums with no I/O. Every other crate in the
//! workspace depends on this one; it depends on nothing in the workspace.

pub mod chat;
pub mod error;
pub mod llm;
