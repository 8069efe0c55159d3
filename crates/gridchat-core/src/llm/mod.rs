//! Inference backend port.

pub mod provider;

pub use provider::{DeltaStream, LlmProvider};
