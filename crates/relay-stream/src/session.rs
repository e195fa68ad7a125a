//! Per-response streaming state

use relay_common::{STREAM_ID_PREFIX, TOOL_ID_PREFIX, generate_prefixed_id};

/// State of one streamed HTTP response. Created when the handler starts
/// pulling chunks and dropped with the response; never shared.
#[derive(Debug, Clone)]
pub struct StreamSession {
    /// Client element receiving the anchor frame. The wire never names it,
    /// the client is configured with the same id; kept for logging.
    default_target_id: String,
    stream_id: Option<String>,
    tool_id: Option<String>,
    answer_text: String,
    tool_narration: Option<String>,
}

impl StreamSession {
    pub fn new(default_target_id: impl Into<String>) -> Self {
        Self {
            default_target_id: default_target_id.into(),
            stream_id: None,
            tool_id: None,
            answer_text: String::new(),
            tool_narration: None,
        }
    }

    pub fn default_target_id(&self) -> &str {
        &self.default_target_id
    }

    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref()
    }

    pub fn tool_id(&self) -> Option<&str> {
        self.tool_id.as_deref()
    }

    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    pub fn tool_narration(&self) -> Option<&str> {
        self.tool_narration.as_deref()
    }

    /// Whether the anchor frame still has to be produced
    pub fn is_anchored(&self) -> bool {
        self.stream_id.is_some()
    }

    /// Mint the stream id on first use; later calls return the same id.
    pub fn ensure_stream_id(&mut self) -> &str {
        self.stream_id
            .get_or_insert_with(|| generate_prefixed_id(STREAM_ID_PREFIX))
    }

    /// Mint a tool id unless one is pending.
    pub fn ensure_tool_id(&mut self) -> &str {
        self.tool_id
            .get_or_insert_with(|| generate_prefixed_id(TOOL_ID_PREFIX))
    }

    /// Hand out the pending tool id and clear it, so the next tool chunk gets a fresh one.
    pub fn take_tool_id(&mut self) -> Option<String> {
        self.tool_id.take()
    }

    pub fn push_answer(&mut self, content: &str) {
        self.answer_text.push_str(content);
    }

    pub fn replace_tool_narration(&mut self, narration: String) {
        self.tool_narration = Some(narration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_minted_once() {
        let mut session = StreamSession::new("chat");
        assert!(!session.is_anchored());

        let first = session.ensure_stream_id().to_string();
        let second = session.ensure_stream_id().to_string();
        assert_eq!(first, second);
        assert!(first.starts_with("stream-"));
        assert!(session.is_anchored());
    }

    #[test]
    fn test_tool_id_is_single_shot() {
        let mut session = StreamSession::new("chat");
        let first = session.ensure_tool_id().to_string();
        assert_eq!(session.ensure_tool_id(), first);

        assert_eq!(session.take_tool_id().as_deref(), Some(first.as_str()));
        assert!(session.tool_id().is_none());

        let second = session.ensure_tool_id().to_string();
        assert_ne!(first, second);
    }

    #[test]
    fn test_buffers() {
        let mut session = StreamSession::new("chat");
        session.push_answer("Hel");
        session.push_answer("lo");
        assert_eq!(session.answer_text(), "Hello");

        session.replace_tool_narration("one".to_string());
        session.replace_tool_narration("two".to_string());
        assert_eq!(session.tool_narration(), Some("two"));
        assert_eq!(session.default_target_id(), "chat");
    }
}
