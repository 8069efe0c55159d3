//! Inference backend implementations.

pub mod openai_compat;
pub mod remote;

pub use openai_compat::OpenAiCompatibleProvider;
pub use remote::RemoteProcessProvider;
