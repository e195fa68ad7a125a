//! Incremental frame decoder
//!
//! The decoder is handed the full response text received so far on every
//! tick. It only ever consumes text up to the end of the last complete
//! delimiter, so a frame (or the delimiter itself) split across two network
//! reads is re-read in full on the next tick.

use relay_common::{STREAM_ID_HEADER, STREAM_STOP};
use tracing::{debug, warn};

/// A complete frame extracted from the response text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    /// Header-less frame, appended to the default target
    Anchor { content: String },
    /// Frame replacing the content of element `id`
    Addressed { id: String, content: String },
}

impl DecodedFrame {
    /// Parse one frame body (delimiter already stripped)
    pub fn parse(raw: &str) -> Option<Self> {
        let Some(rest) = raw.strip_prefix(STREAM_ID_HEADER) else {
            if raw.is_empty() {
                return None;
            }
            return Some(DecodedFrame::Anchor {
                content: raw.to_string(),
            });
        };

        let Some((id, content)) = rest.split_once('\n') else {
            warn!("Dropping addressed frame without a header line break");
            return None;
        };

        let id = id.trim();
        if id.is_empty() {
            warn!("Dropping addressed frame with an empty id");
            return None;
        }

        Some(DecodedFrame::Addressed {
            id: id.to_string(),
            content: content.to_string(),
        })
    }

    pub fn content(&self) -> &str {
        match self {
            DecodedFrame::Anchor { content } | DecodedFrame::Addressed { content, .. } => content,
        }
    }
}

/// Decoder state of one in-flight response
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    /// Bytes of response text already consumed into complete frames
    cursor: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Complete frames in `text[cursor..]`, each with the cursor position
    /// just past its delimiter. Frames that parse to nothing are listed as
    /// `None` so the cursor can still move past them. Does not move the cursor.
    pub fn scan(&self, text: &str) -> Vec<(usize, Option<DecodedFrame>)> {
        let Some(delta) = text.get(self.cursor..) else {
            warn!(
                "Response text shrank or split a character (cursor {}, length {})",
                self.cursor,
                text.len()
            );
            return Vec::new();
        };

        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = delta[consumed..].find(STREAM_STOP) {
            let raw = &delta[consumed..consumed + offset];
            consumed += offset + STREAM_STOP.len();
            frames.push((self.cursor + consumed, DecodedFrame::parse(raw)));
        }
        frames
    }

    /// Move the cursor to a position returned by [`FrameDecoder::scan`]
    pub fn commit(&mut self, cursor: usize) {
        if cursor > self.cursor {
            self.cursor = cursor;
        }
    }

    /// One tick: extract every complete frame from `text[cursor..]` and
    /// advance the cursor past the last delimiter. An unterminated tail is
    /// left for the next tick.
    pub fn decode(&mut self, text: &str) -> Vec<DecodedFrame> {
        let scanned = self.scan(text);
        if let Some((end, _)) = scanned.last() {
            self.commit(*end);
            debug!("Decoded {} frame(s), cursor at {}", scanned.len(), self.cursor);
        }
        scanned.into_iter().filter_map(|(_, frame)| frame).collect()
    }

    /// Final tick once the response has ended. A non-empty tail without a
    /// delimiter can no longer be completed, so it is decoded as a last frame.
    pub fn finish(&mut self, text: &str) -> Vec<DecodedFrame> {
        let mut frames = self.decode(text);

        if let Some(tail) = text.get(self.cursor..).filter(|tail| !tail.is_empty()) {
            warn!("Response ended with an unterminated frame ({} bytes)", tail.len());
            frames.extend(DecodedFrame::parse(tail));
            self.cursor = text.len();
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(frames: &[&str]) -> String {
        frames.iter().map(|f| format!("{}{}", f, STREAM_STOP)).collect()
    }

    fn anchor(content: &str) -> DecodedFrame {
        DecodedFrame::Anchor {
            content: content.to_string(),
        }
    }

    fn addressed(id: &str, content: &str) -> DecodedFrame {
        DecodedFrame::Addressed {
            id: id.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_parse_frames() {
        assert_eq!(DecodedFrame::parse("<div>x</div>"), Some(anchor("<div>x</div>")));
        assert_eq!(
            DecodedFrame::parse("streamId:stream-1\nHello\nworld"),
            Some(addressed("stream-1", "Hello\nworld"))
        );
        assert_eq!(DecodedFrame::parse("streamId: s \n"), Some(addressed("s", "")));
        assert_eq!(DecodedFrame::parse(""), None);
        assert_eq!(DecodedFrame::parse("streamId:no-newline"), None);
        assert_eq!(DecodedFrame::parse("streamId:\nbody"), None);
    }

    #[test]
    fn test_whole_response_in_one_tick() {
        let text = wire(&["<p>a</p>", "streamId:s\nab", "streamId:t\ntools"]);
        let mut decoder = FrameDecoder::new();

        let frames = decoder.decode(&text);
        assert_eq!(
            frames,
            vec![anchor("<p>a</p>"), addressed("s", "ab"), addressed("t", "tools")]
        );
        assert_eq!(decoder.cursor(), text.len());
    }

    #[test]
    fn test_partial_tail_is_not_consumed() {
        let text = wire(&["<p>a</p>"]) + "streamId:s\nab";
        let mut decoder = FrameDecoder::new();

        assert_eq!(decoder.decode(&text), vec![anchor("<p>a</p>")]);
        assert_eq!(decoder.cursor(), wire(&["<p>a</p>"]).len());

        let text = text + STREAM_STOP;
        assert_eq!(decoder.decode(&text), vec![addressed("s", "ab")]);
        assert_eq!(decoder.cursor(), text.len());
    }

    #[test]
    fn test_delimiter_split_across_ticks() {
        let full = wire(&["<p>a</p>", "streamId:s\nabc"]);
        let mut decoder = FrameDecoder::new();
        let mut seen = Vec::new();

        // every char-boundary prefix, as a slow network would deliver it
        let boundaries: Vec<usize> = full.char_indices().map(|(i, _)| i).chain([full.len()]).collect();
        for end in boundaries {
            seen.extend(decoder.decode(&full[..end]));
        }

        assert_eq!(seen, vec![anchor("<p>a</p>"), addressed("s", "abc")]);
        assert_eq!(decoder.cursor(), full.len());
    }

    #[test]
    fn test_tick_without_new_bytes_is_noop() {
        let text = wire(&["<p>a</p>"]) + "streamId:s\nab";
        let mut decoder = FrameDecoder::new();
        decoder.decode(&text);
        let cursor = decoder.cursor();

        assert!(decoder.decode(&text).is_empty());
        assert_eq!(decoder.cursor(), cursor);
    }

    #[test]
    fn test_empty_frames_are_skipped() {
        let text = format!("{}{}", STREAM_STOP, wire(&["x"]));
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.decode(&text), vec![anchor("x")]);
        assert_eq!(decoder.cursor(), text.len());
    }

    #[test]
    fn test_finish_flushes_unterminated_tail() {
        let text = wire(&["<p>a</p>"]) + "streamId:s\nlast";
        let mut decoder = FrameDecoder::new();

        assert_eq!(decoder.finish(&text), vec![anchor("<p>a</p>"), addressed("s", "last")]);
        assert_eq!(decoder.cursor(), text.len());
        assert!(decoder.finish(&text).is_empty());
    }

    #[test]
    fn test_scan_does_not_move_cursor() {
        let text = format!("{}{}", STREAM_STOP, wire(&["a", "streamId:s\nb"]));
        let mut decoder = FrameDecoder::new();

        let scanned = decoder.scan(&text);
        assert_eq!(decoder.cursor(), 0);
        assert_eq!(scanned.len(), 3);
        assert_eq!(scanned[0], (STREAM_STOP.len(), None));
        assert_eq!(scanned[1].1, Some(anchor("a")));
        assert_eq!(scanned[2], (text.len(), Some(addressed("s", "b"))));

        decoder.commit(scanned[1].0);
        assert_eq!(decoder.scan(&text), vec![(text.len(), Some(addressed("s", "b")))]);

        decoder.commit(0);
        assert_eq!(decoder.cursor(), scanned[1].0);
    }

    #[test]
    fn test_cursor_beyond_text_is_ignored() {
        let mut decoder = FrameDecoder::new();
        decoder.decode(&wire(&["abc"]));
        assert!(decoder.decode("a").is_empty());
    }
}
