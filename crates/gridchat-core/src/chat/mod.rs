//! Chat domain: durable store port, stream demultiplexer, turn orchestration.

pub mod demux;
pub mod service;
pub mod store;
pub mod title;

pub use demux::{split_completion, ThinkDemux};
pub use service::ChatService;
pub use store::ChatStore;
