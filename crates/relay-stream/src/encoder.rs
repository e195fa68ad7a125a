//! Frame emission policy and wire encoding
//!
//! Grammar: `frame := [ "streamId:" id "\n" ] body`, each frame followed by
//! [`STREAM_STOP`]. The first frame of a response carries no header and
//! creates the DOM anchors; every later frame replaces the content of an
//! anchor by id.

use crate::aggregator::Applied;
use crate::render::{FragmentRenderer, MessageView};
use crate::session::StreamSession;
use relay_common::{Result, STREAM_ID_HEADER, STREAM_STOP, clock_time, neutralize_delimiter};
use std::sync::Arc;
use tracing::debug;

/// One unit of the wire format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    target: Option<String>,
    body: String,
}

impl Frame {
    /// Header-less frame appended to the default target
    pub fn anchor(body: impl Into<String>) -> Self {
        Self {
            target: None,
            body: body.into(),
        }
    }

    /// Frame replacing the content of the element with id `target`
    pub fn addressed(target: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            body: body.into(),
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_anchor(&self) -> bool {
        self.target.is_none()
    }

    /// Serialize the frame, delimiter included
    pub fn to_wire(&self) -> String {
        let body = match neutralize_delimiter(&self.body) {
            Some(safe) => {
                debug!("Neutralized section signs in frame body");
                safe
            }
            None => self.body.clone(),
        };

        let mut wire = String::with_capacity(body.len() + STREAM_STOP.len() + 64);
        if let Some(target) = &self.target {
            wire.push_str(STREAM_ID_HEADER);
            wire.push_str(target);
            wire.push('\n');
        }
        wire.push_str(&body);
        wire.push_str(STREAM_STOP);
        wire
    }
}

/// Decides which frames a session update produces and renders them
#[derive(Clone)]
pub struct FrameEncoder {
    renderer: Arc<dyn FragmentRenderer>,
}

impl FrameEncoder {
    pub fn new(renderer: Arc<dyn FragmentRenderer>) -> Self {
        Self { renderer }
    }

    /// Frames for one processed chunk.
    ///
    /// The first call renders the full bubble and mints the stream id. Later
    /// calls re-render the answer text, plus the tool narration when the chunk
    /// touched tools and a tool id is pending; that tool id is cleared once
    /// its frame exists.
    pub fn encode(&self, session: &mut StreamSession, applied: Applied) -> Result<Vec<Frame>> {
        if !session.is_anchored() {
            let stream_id = session.ensure_stream_id().to_string();
            let time = clock_time();
            let body = self.renderer.render_message(&MessageView {
                message: session.answer_text(),
                time: &time,
                sent: false,
                stream_id: Some(&stream_id),
                tool_id: session.tool_id(),
                tool_narration: session.tool_narration(),
            })?;
            debug!(
                "Anchor frame for {} into #{} ({} bytes)",
                stream_id,
                session.default_target_id(),
                body.len()
            );
            return Ok(vec![Frame::anchor(body)]);
        }

        let stream_id = session.ensure_stream_id().to_string();
        let answer = self.renderer.render_answer(session.answer_text())?;
        let mut frames = vec![Frame::addressed(stream_id, answer)];

        if applied.touches_tools() {
            if let Some(tool_id) = session.take_tool_id() {
                let narration = session.tool_narration().unwrap_or_default().to_string();
                frames.push(Frame::addressed(tool_id, narration));
            }
        }

        Ok(frames)
    }
}
