//! Page-level owner of the DOM and of every in-flight response

use crate::decoder::{DecodedFrame, FrameDecoder};
use crate::dom::Dom;
use crate::router::{RouteOutcome, TargetRouter};
use relay_common::{RelayError, Result, is_stream_content_type};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Notifications about document updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    FrameApplied {
        handle: u64,
        outcome: RouteOutcome,
        content: String,
    },
    Completed {
        handle: u64,
        frames: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Framed protocol: decode on every tick
    Streaming,
    /// Any other content type: apply the body once at close
    OneShot,
}

/// State of one open request. Each request gets its own cursor.
#[derive(Debug)]
pub struct StreamHandle {
    id: u64,
    mode: Mode,
    /// Validated response text
    text: String,
    /// Trailing bytes of an incomplete character, or the whole body when one-shot
    pending: Vec<u8>,
    bytes: usize,
    decoder: FrameDecoder,
    router: TargetRouter,
    frames: usize,
}

impl StreamHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_streaming(&self) -> bool {
        self.mode == Mode::Streaming
    }

    /// Frames applied so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn bytes_received(&self) -> usize {
        self.bytes
    }
}

/// A chat page: one document, any number of concurrent responses
pub struct ChatPage<D: Dom> {
    dom: D,
    events: broadcast::Sender<PageEvent>,
    next_handle: u64,
}

impl<D: Dom> ChatPage<D> {
    pub fn new(dom: D) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            dom,
            events,
            next_handle: 0,
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    /// Start tracking a response. The decoder only runs when `content_type`
    /// names the framed protocol.
    pub fn open(&mut self, target_id: &str, content_type: Option<&str>) -> StreamHandle {
        let mode = match content_type {
            Some(value) if is_stream_content_type(value) => Mode::Streaming,
            other => {
                info!("Content type {:?} is not framed; rendering once at completion", other);
                Mode::OneShot
            }
        };

        self.next_handle += 1;
        debug!("Opened response {} ({:?}) into #{}", self.next_handle, mode, target_id);
        StreamHandle {
            id: self.next_handle,
            mode,
            text: String::new(),
            pending: Vec::new(),
            bytes: 0,
            decoder: FrameDecoder::new(),
            router: TargetRouter::new(target_id),
            frames: 0,
        }
    }

    /// Feed the next piece of the response body and run one decoder tick.
    /// Returns the number of frames applied. The cursor only moves past a
    /// frame once it is applied, so a failed tick can be retried.
    pub fn receive(&mut self, handle: &mut StreamHandle, bytes: &[u8]) -> Result<usize> {
        handle.bytes += bytes.len();
        handle.pending.extend_from_slice(bytes);
        if handle.mode == Mode::OneShot {
            return Ok(0);
        }

        // A read may end inside a multi-byte character; keep it for the next one.
        let valid = match std::str::from_utf8(&handle.pending) {
            Ok(text) => text.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                return Err(RelayError::Protocol(format!(
                    "invalid UTF-8 at byte {} of response {}",
                    handle.text.len() + e.valid_up_to(),
                    handle.id
                )));
            }
        };
        let complete: Vec<u8> = handle.pending.drain(..valid).collect();
        let complete = String::from_utf8(complete).map_err(|e| RelayError::Protocol(e.to_string()))?;
        handle.text.push_str(&complete);

        let mut applied = 0;
        for (end, frame) in handle.decoder.scan(&handle.text) {
            if let Some(frame) = frame {
                self.apply(handle.id, &handle.router, &frame)?;
                handle.frames += 1;
                applied += 1;
            }
            handle.decoder.commit(end);
        }
        if applied > 0 {
            debug!("Response {}: applied {} frame(s), cursor at {}", handle.id, applied, handle.decoder.cursor());
        }
        Ok(applied)
    }

    /// The response has ended: run the final tick.
    pub fn close(&mut self, mut handle: StreamHandle) -> Result<usize> {
        let mut text = std::mem::take(&mut handle.text);
        text.push_str(&String::from_utf8_lossy(&handle.pending));

        let frames = match handle.mode {
            Mode::Streaming => handle.decoder.finish(&text),
            Mode::OneShot if text.is_empty() => Vec::new(),
            Mode::OneShot => vec![DecodedFrame::Anchor { content: text }],
        };
        for frame in &frames {
            self.apply(handle.id, &handle.router, frame)?;
            handle.frames += 1;
        }

        info!(
            "Response {} complete: {} frame(s), {} bytes",
            handle.id, handle.frames, handle.bytes
        );
        let _ = self.events.send(PageEvent::Completed {
            handle: handle.id,
            frames: handle.frames,
        });
        Ok(handle.frames)
    }

    fn apply(&mut self, handle: u64, router: &TargetRouter, frame: &DecodedFrame) -> Result<()> {
        let outcome = router.apply(&mut self.dom, frame)?;
        if let RouteOutcome::Appended { fallback: true, .. } = outcome {
            warn!("Response {} addressed a missing element", handle);
        }
        // No subscribers is fine
        let _ = self.events.send(PageEvent::FrameApplied {
            handle,
            outcome,
            content: frame.content().to_string(),
        });
        Ok(())
    }
}
