//! Applies decoded frames to the document

use crate::decoder::DecodedFrame;
use crate::dom::Dom;
use relay_common::{RelayError, Result};
use tracing::{debug, warn};

/// What applying one frame did to the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Content of element `id` was replaced
    Replaced { id: String },
    /// Content was appended to the default target. `fallback` is set when
    /// the frame addressed an id that does not exist (yet).
    Appended { target: String, fallback: bool },
}

/// Routes frames of one response to their DOM region
#[derive(Debug, Clone)]
pub struct TargetRouter {
    default_target: String,
}

impl TargetRouter {
    pub fn new(default_target: impl Into<String>) -> Self {
        Self {
            default_target: default_target.into(),
        }
    }

    pub fn default_target(&self) -> &str {
        &self.default_target
    }

    /// Apply one frame. Replacing an id is idempotent: the last write wins.
    pub fn apply<D: Dom + ?Sized>(&self, dom: &mut D, frame: &DecodedFrame) -> Result<RouteOutcome> {
        match frame {
            DecodedFrame::Addressed { id, content } if dom.contains(id) => {
                dom.replace_inner(id, content)?;
                debug!("Replaced content of #{}", id);
                Ok(RouteOutcome::Replaced { id: id.clone() })
            }
            DecodedFrame::Addressed { id, content } => {
                warn!("No element #{}; appending to #{}", id, self.default_target);
                self.append(dom, content, true)
            }
            DecodedFrame::Anchor { content } => self.append(dom, content, false),
        }
    }

    fn append<D: Dom + ?Sized>(&self, dom: &mut D, content: &str, fallback: bool) -> Result<RouteOutcome> {
        if !dom.contains(&self.default_target) {
            return Err(RelayError::MissingTarget(self.default_target.clone()));
        }
        dom.append_inner(&self.default_target, content)?;
        Ok(RouteOutcome::Appended {
            target: self.default_target.clone(),
            fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    fn addressed(id: &str, content: &str) -> DecodedFrame {
        DecodedFrame::Addressed {
            id: id.to_string(),
            content: content.to_string(),
        }
    }

    fn anchor(content: &str) -> DecodedFrame {
        DecodedFrame::Anchor {
            content: content.to_string(),
        }
    }

    #[test]
    fn test_anchor_then_replacements() {
        let mut dom = MemoryDom::with_root("chat");
        let router = TargetRouter::new("chat");

        let outcome = router
            .apply(&mut dom, &anchor("<div id=\"s\">H</div>"))
            .unwrap();
        assert_eq!(
            outcome,
            RouteOutcome::Appended {
                target: "chat".to_string(),
                fallback: false
            }
        );

        for content in ["He", "Hel", "Hello"] {
            let outcome = router.apply(&mut dom, &addressed("s", content)).unwrap();
            assert_eq!(outcome, RouteOutcome::Replaced { id: "s".to_string() });
        }
        assert_eq!(dom.inner_html("chat").unwrap(), "<div id=\"s\">Hello</div>");
    }

    #[test]
    fn test_repeated_replacement_is_idempotent() {
        let mut dom = MemoryDom::with_root("chat");
        let router = TargetRouter::new("chat");
        router.apply(&mut dom, &anchor("<p id=\"s\"></p>")).unwrap();

        router.apply(&mut dom, &addressed("s", "same")).unwrap();
        let once = dom.inner_html("chat").unwrap();
        router.apply(&mut dom, &addressed("s", "same")).unwrap();
        assert_eq!(dom.inner_html("chat").unwrap(), once);
    }

    #[test]
    fn test_unknown_id_falls_back_to_default_target() {
        let mut dom = MemoryDom::with_root("chat");
        let router = TargetRouter::new("chat");

        let outcome = router.apply(&mut dom, &addressed("tool-9", "<ul></ul>")).unwrap();
        assert_eq!(
            outcome,
            RouteOutcome::Appended {
                target: "chat".to_string(),
                fallback: true
            }
        );
        assert_eq!(dom.inner_html("chat").unwrap(), "<ul></ul>");
    }

    #[test]
    fn test_missing_default_target() {
        let mut dom = MemoryDom::with_root("elsewhere");
        let router = TargetRouter::new("chat");

        let err = router.apply(&mut dom, &anchor("x")).unwrap_err();
        assert!(matches!(err, RelayError::MissingTarget(id) if id == "chat"));
    }
}
