//! Server side of the framed streaming protocol
//!
//! This crate folds the chunk sequence of an agent runtime into running
//! buffers, turns every update into wire frames and pushes those frames to
//! the response body as soon as they exist.

pub mod aggregator;
pub mod encoder;
pub mod narrator;
pub mod pipeline;
pub mod render;
pub mod runtime;
pub mod session;
pub mod transport;

// Re-export key types for convenience
pub use aggregator::{Applied, ChunkAggregator};
pub use encoder::{Frame, FrameEncoder};
pub use narrator::ToolNarrator;
pub use pipeline::{CompletionHook, LogCompletion, PipelineOutcome, StreamPipeline, StreamSummary};
pub use render::{FragmentRenderer, HtmlRenderer, MessageView};
pub use runtime::{AgentRuntime, ChunkStream, Scenario, ScenarioStep, ScriptedRuntime};
pub use session::StreamSession;
pub use transport::{FrameReceiver, TransportWriter, frame_channel};
