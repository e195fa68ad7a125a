//! Relay Common - Shared wire constants and types
//!
//! This crate provides the error type, the framing constants, the chunk data
//! model, configuration structs and utility functions used by the server and
//! client sides of the streaming protocol.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::{RelayConfig, RenderConfig, ServerConfig, StreamConfig};
pub use constants::*;
pub use error::{RelayError, Result};
pub use types::{Chunk, ChunkKind, ToolInput, ToolInvocation};
pub use utils::*;
