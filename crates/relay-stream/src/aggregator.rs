//! Folds the chunk sequence into the running buffers of a [`StreamSession`]

use crate::narrator::ToolNarrator;
use crate::session::StreamSession;
use relay_common::Chunk;
use tracing::{debug, warn};

/// What changed in the session after a chunk was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Answer text grew
    Answer,
    /// Tool narration was replaced
    Tools,
}

impl Applied {
    pub fn touches_tools(self) -> bool {
        self == Applied::Tools
    }
}

/// Applies chunks to a session one at a time
#[derive(Debug)]
pub struct ChunkAggregator {
    session: StreamSession,
    narrator: ToolNarrator,
}

impl ChunkAggregator {
    pub fn new(session: StreamSession) -> Self {
        Self {
            session,
            narrator: ToolNarrator::new(),
        }
    }

    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut StreamSession {
        &mut self.session
    }

    pub fn into_session(self) -> StreamSession {
        self.session
    }

    /// Update the buffers for one chunk. Returns `None` for chunks that
    /// produce no frame.
    pub fn apply(&mut self, chunk: &Chunk) -> Option<Applied> {
        match chunk {
            // Reasoning and answer share one buffer
            Chunk::Text { content } | Chunk::Reasoning { content } => {
                self.session.push_answer(content);
                Some(Applied::Answer)
            }
            Chunk::ToolCall { tools } => {
                self.session.ensure_tool_id();
                let narration = self.narrator.narrate_calls(tools);
                debug!("Tool call narration for {} tool(s)", tools.len());
                self.session.replace_tool_narration(narration);
                Some(Applied::Tools)
            }
            Chunk::ToolResult { tools } => {
                self.session.ensure_tool_id();
                let narration = self.narrator.narrate_results(tools);
                debug!("Tool result narration for {} tool(s)", tools.len());
                self.session.replace_tool_narration(narration);
                Some(Applied::Tools)
            }
            Chunk::Unknown => {
                warn!("Skipping chunk of unknown kind: {}", chunk.kind());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_common::{TOOLS_DONE_MARKER, ToolInvocation};

    fn aggregator() -> ChunkAggregator {
        ChunkAggregator::new(StreamSession::new("chat"))
    }

    #[test]
    fn test_text_and_reasoning_share_buffer() {
        let mut agg = aggregator();
        assert_eq!(agg.apply(&Chunk::reasoning("Thinking. ")), Some(Applied::Answer));
        assert_eq!(agg.apply(&Chunk::text("Answer.")), Some(Applied::Answer));
        assert_eq!(agg.session().answer_text(), "Thinking. Answer.");
        assert!(agg.session().tool_id().is_none());
    }

    #[test]
    fn test_tool_chunks_mint_one_pending_id_and_replace_narration() {
        let mut agg = aggregator();
        let tools = vec![ToolInvocation::new("web_search").with_input("query", "weather")];

        assert_eq!(agg.apply(&Chunk::ToolCall { tools: tools.clone() }), Some(Applied::Tools));
        let tool_id = agg.session().tool_id().unwrap().to_string();
        assert!(!agg.session().tool_narration().unwrap().contains(TOOLS_DONE_MARKER));

        let results = vec![tools[0].clone().with_result("sunny")];
        assert_eq!(agg.apply(&Chunk::ToolResult { tools: results }), Some(Applied::Tools));
        assert_eq!(agg.session().tool_id(), Some(tool_id.as_str()));

        let narration = agg.session().tool_narration().unwrap();
        assert!(narration.starts_with(TOOLS_DONE_MARKER));
        assert_eq!(narration.matches("Using tool: web_search").count(), 1);
    }

    #[test]
    fn test_unknown_chunk_is_skipped() {
        let mut agg = aggregator();
        agg.apply(&Chunk::text("a"));
        assert_eq!(agg.apply(&Chunk::Unknown), None);
        assert_eq!(agg.session().answer_text(), "a");
    }
}
