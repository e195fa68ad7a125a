//! DOM seam used by the router, plus an in-memory implementation

use regex::Regex;
use relay_common::{RelayError, Result};
use std::ops::Range;
use std::sync::OnceLock;

/// The part of a document the router needs: id lookup and content updates
pub trait Dom {
    /// Whether an element with this id exists
    fn contains(&self, id: &str) -> bool;

    /// Replace the inner content of element `id`
    fn replace_inner(&mut self, id: &str, html: &str) -> Result<()>;

    /// Append to the inner content of element `id`
    fn append_inner(&mut self, id: &str, html: &str) -> Result<()>;
}

/// Document kept as HTML strings.
///
/// Roots are registered explicitly; any element carrying an `id` attribute
/// inside a root's content becomes addressable once it has been inserted.
#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
    roots: Vec<Root>,
}

#[derive(Debug, Clone)]
struct Root {
    id: String,
    html: String,
}

/// Where an element's inner content lives
struct Location {
    root: usize,
    inner: Range<usize>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(id: impl Into<String>) -> Self {
        let mut dom = Self::new();
        dom.add_root(id);
        dom
    }

    /// Register an empty top-level element
    pub fn add_root(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.roots.iter().any(|root| root.id == id) {
            self.roots.push(Root {
                id,
                html: String::new(),
            });
        }
    }

    /// Inner HTML of element `id`
    pub fn inner_html(&self, id: &str) -> Option<String> {
        let location = self.locate(id)?;
        Some(self.roots[location.root].html[location.inner].to_string())
    }

    /// Text of element `id` with tags stripped and entities decoded
    pub fn text_content(&self, id: &str) -> Option<String> {
        self.inner_html(id).map(|html| html_to_text(&html))
    }

    fn locate(&self, id: &str) -> Option<Location> {
        if let Some(root) = self.roots.iter().position(|root| root.id == id) {
            return Some(Location {
                root,
                inner: 0..self.roots[root].html.len(),
            });
        }

        let opening = opening_tag_pattern(id)?;
        self.roots.iter().enumerate().find_map(|(index, root)| {
            let captures = opening.captures(&root.html)?;
            let whole = captures.get(0)?;
            let tag = captures.get(1)?.as_str();
            let start = whole.end();
            let end = matching_close(&root.html, start, tag).unwrap_or(root.html.len());
            Some(Location {
                root: index,
                inner: start..end,
            })
        })
    }

    fn missing(id: &str) -> RelayError {
        RelayError::MissingTarget(id.to_string())
    }
}

impl Dom for MemoryDom {
    fn contains(&self, id: &str) -> bool {
        self.locate(id).is_some()
    }

    fn replace_inner(&mut self, id: &str, html: &str) -> Result<()> {
        let location = self.locate(id).ok_or_else(|| Self::missing(id))?;
        self.roots[location.root].html.replace_range(location.inner, html);
        Ok(())
    }

    fn append_inner(&mut self, id: &str, html: &str) -> Result<()> {
        let location = self.locate(id).ok_or_else(|| Self::missing(id))?;
        self.roots[location.root]
            .html
            .insert_str(location.inner.end, html);
        Ok(())
    }
}

/// Strip tags and decode the entities the server escapes
pub fn html_to_text(html: &str) -> String {
    decode_entities(&tag_pattern().replace_all(html, ""))
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"))
}

fn opening_tag_pattern(id: &str) -> Option<Regex> {
    let pattern = format!(
        r#"<([A-Za-z][A-Za-z0-9-]*)\b[^>]*?\sid\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(id)
    );
    Regex::new(&pattern).ok()
}

/// Offset of the closing tag balancing an element whose content starts at `from`
fn matching_close(html: &str, from: usize, tag: &str) -> Option<usize> {
    let pattern = Regex::new(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(tag))).ok()?;
    let mut depth = 1usize;

    for captures in pattern.captures_iter(&html[from..]) {
        let whole = captures.get(0)?;
        let closing = captures.get(1).is_some_and(|slash| !slash.as_str().is_empty());
        if closing {
            depth -= 1;
            if depth == 0 {
                return Some(from + whole.start());
            }
        } else if !whole.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    None
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&sect;", "§")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_append_and_replace() {
        let mut dom = MemoryDom::with_root("chat");
        assert!(dom.contains("chat"));
        assert!(!dom.contains("other"));

        dom.append_inner("chat", "<p>one</p>").unwrap();
        dom.append_inner("chat", "<p>two</p>").unwrap();
        assert_eq!(dom.inner_html("chat").unwrap(), "<p>one</p><p>two</p>");

        dom.replace_inner("chat", "").unwrap();
        assert_eq!(dom.inner_html("chat").unwrap(), "");
    }

    #[test]
    fn test_nested_ids_become_addressable() {
        let mut dom = MemoryDom::with_root("chat");
        dom.append_inner(
            "chat",
            "<div class=\"message\">\n<div class=\"tools\" id=\"tool-1\"></div>\n<div class=\"content\" id=\"stream-1\">Hel</div>\n</div>",
        )
        .unwrap();

        assert_eq!(dom.inner_html("stream-1").unwrap(), "Hel");
        dom.replace_inner("stream-1", "Hello &amp; <b>bye</b>").unwrap();
        dom.replace_inner("tool-1", "<ul><li>x</li></ul>").unwrap();

        assert_eq!(dom.text_content("stream-1").unwrap(), "Hello & bye");
        assert_eq!(dom.inner_html("tool-1").unwrap(), "<ul><li>x</li></ul>");
        assert!(dom.inner_html("chat").unwrap().ends_with("bye</b></div>\n</div>"));
    }

    #[test]
    fn test_balanced_scan_skips_inner_elements() {
        let mut dom = MemoryDom::with_root("chat");
        dom.append_inner("chat", "<div id=\"outer\"><div>a</div><div>b</div></div><p>after</p>")
            .unwrap();

        assert_eq!(dom.inner_html("outer").unwrap(), "<div>a</div><div>b</div>");
        dom.replace_inner("outer", "c").unwrap();
        assert_eq!(dom.inner_html("chat").unwrap(), "<div id=\"outer\">c</div><p>after</p>");
    }

    #[test]
    fn test_unclosed_element_runs_to_end() {
        let mut dom = MemoryDom::with_root("chat");
        dom.append_inner("chat", "<div id=\"open\">partial").unwrap();
        assert_eq!(dom.inner_html("open").unwrap(), "partial");
    }

    #[test]
    fn test_data_attributes_are_not_ids() {
        let mut dom = MemoryDom::with_root("chat");
        dom.append_inner("chat", "<div data-id=\"x\">no</div>").unwrap();
        assert!(!dom.contains("x"));
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let mut dom = MemoryDom::new();
        let err = dom.append_inner("nope", "x").unwrap_err();
        assert!(matches!(err, RelayError::MissingTarget(id) if id == "nope"));
    }
}
