//! Wire format constants shared by the server and the client

/// Delimiter written after every frame. Rendered content must never contain it.
pub const STREAM_STOP: &str = "\n§STREAM-STOP§\n";

/// Header that addresses a frame to an element id
pub const STREAM_ID_HEADER: &str = "streamId:";

/// Content type used as the protocol discriminator.
/// Deliberately not `text/event-stream`, so generic SSE clients leave it alone.
pub const STREAM_CONTENT_TYPE: &str = "text/stream";

/// Cache-control value for streamed responses
pub const NO_CACHE: &str = "no-cache";

/// Header asking reverse proxies not to buffer the response body
pub const ACCEL_BUFFERING_HEADER: &str = "x-accel-buffering";

/// Prefix of minted answer-region ids
pub const STREAM_ID_PREFIX: &str = "stream";

/// Prefix of minted tool-region ids
pub const TOOL_ID_PREFIX: &str = "tool";

/// Hidden marker prepended to narration rendered from tool results
pub const TOOLS_DONE_MARKER: &str = r#"<span class="tools-done-flag" style="display:none"></span>"#;

/// Default server settings
pub mod defaults {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 3000;
    pub const LOG_LEVEL: &str = "info";
    /// Frames buffered between the pipeline task and the response body
    pub const CHANNEL_CAPACITY: usize = 16;
    pub const SCRIPTED_CHUNK_DELAY_MS: u64 = 40;
    pub const AGENT_NAME: &str = "Agent";
    pub const DEFAULT_TARGET_ID: &str = "chat-messages";
}
