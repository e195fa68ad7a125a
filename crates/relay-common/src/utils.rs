//! Common utility functions used across Relay components

use crate::constants::STREAM_CONTENT_TYPE;
use chrono::{DateTime, Local, TimeZone};
use uuid::Uuid;

/// Generate an opaque id usable as an HTML element id, e.g. `stream-3f2a...`
pub fn generate_prefixed_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Current local wall-clock time as shown in message bubbles
pub fn clock_time() -> String {
    format_clock_time(&Local::now())
}

/// Format a timestamp the way message bubbles display it (`HH:MM`)
pub fn format_clock_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%H:%M").to_string()
}

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Spell every `§` in a frame body as `&sect;`, which renders identically.
///
/// Every `§` goes, not only whole delimiters: partial delimiters at the body
/// edges or sharing a `\n` recombine with the framing into live ones.
/// Returns `None` when the body is already safe.
pub fn neutralize_delimiter(body: &str) -> Option<String> {
    if !body.contains('§') {
        return None;
    }
    Some(body.replace('§', "&sect;"))
}

/// Whether a `Content-Type` header value names the framed stream protocol.
/// Parameters such as `; charset=utf-8` are ignored.
pub fn is_stream_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(STREAM_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Truncate string to specified length with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STREAM_STOP;

    #[test]
    fn test_generate_prefixed_id() {
        let id1 = generate_prefixed_id("stream");
        let id2 = generate_prefixed_id("stream");
        assert_ne!(id1, id2);
        assert!(id1.starts_with("stream-"));
        assert_eq!(id1.len(), "stream-".len() + 32);
        assert!(!id1.contains('\n'));
    }

    #[test]
    fn test_format_clock_time() {
        let time = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 42).unwrap();
        assert_eq!(format_clock_time(&time), "07:05");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b && c > \"d\""), "a &lt; b &amp;&amp; c &gt; &quot;d&quot;");
        assert_eq!(escape_html("it's"), "it&#39;s");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_neutralize_delimiter() {
        assert_eq!(neutralize_delimiter("nothing to do"), None);

        let body = format!("before{}after", STREAM_STOP);
        let safe = neutralize_delimiter(&body).unwrap();
        assert!(!safe.contains(STREAM_STOP));
        assert_eq!(safe, "before\n&sect;STREAM-STOP&sect;\nafter");
    }

    #[test]
    fn test_neutralize_delimiters_sharing_a_newline() {
        let body = "a\n§STREAM-STOP§\n§STREAM-STOP§\nb";
        let safe = neutralize_delimiter(body).unwrap();
        assert!(!safe.contains('§'));
        assert_eq!(safe, "a\n&sect;STREAM-STOP&sect;\n&sect;STREAM-STOP&sect;\nb");
    }

    #[test]
    fn test_neutralize_half_delimiters() {
        assert_eq!(neutralize_delimiter("§STREAM-STOP§\nhi").unwrap(), "&sect;STREAM-STOP&sect;\nhi");
        assert_eq!(neutralize_delimiter("hi\n§STREAM-STOP§").unwrap(), "hi\n&sect;STREAM-STOP&sect;");
        assert_eq!(neutralize_delimiter("§ 12").unwrap(), "&sect; 12");
    }

    #[test]
    fn test_is_stream_content_type() {
        assert!(is_stream_content_type("text/stream"));
        assert!(is_stream_content_type("Text/Stream; charset=utf-8"));
        assert!(!is_stream_content_type("text/event-stream"));
        assert!(!is_stream_content_type("text/html"));
        assert!(!is_stream_content_type(""));
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("hi", 2), "hi");
        assert_eq!(truncate_string("hi", 1), "...");
    }
}
