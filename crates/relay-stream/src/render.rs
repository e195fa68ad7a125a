//! HTML fragment rendering
//!
//! The encoder only decides *what* to render; turning buffers into markup is
//! delegated to a [`FragmentRenderer`]. [`HtmlRenderer`] is the default
//! implementation used by the server.

use pulldown_cmark::{Options, Parser, html};
use relay_common::{RenderConfig, Result, escape_html};

/// Everything needed to render a complete message bubble
#[derive(Debug, Clone, Default)]
pub struct MessageView<'a> {
    /// Answer text accumulated so far
    pub message: &'a str,
    /// Display time, `HH:MM`
    pub time: &'a str,
    /// Sent by the user (`true`) or by the agent (`false`)
    pub sent: bool,
    /// Id of the answer region, if later frames will address it
    pub stream_id: Option<&'a str>,
    /// Id of the tool-activity region
    pub tool_id: Option<&'a str>,
    /// Current tool narration markup
    pub tool_narration: Option<&'a str>,
}

/// Turns session buffers into HTML fragments
pub trait FragmentRenderer: Send + Sync {
    /// Full message bubble: sender, time, answer region and tool region
    fn render_message(&self, view: &MessageView<'_>) -> Result<String>;

    /// Minimal re-render of the answer text, without bubble chrome
    fn render_answer(&self, message: &str) -> Result<String>;
}

/// Default renderer: markdown answers inside a simple bubble
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    markdown: bool,
    agent_name: String,
    user_name: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl HtmlRenderer {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            markdown: config.markdown,
            agent_name: config.agent_name.clone(),
            user_name: "You".to_string(),
        }
    }

    /// Renderer that escapes answer text instead of parsing markdown
    pub fn plain() -> Self {
        Self {
            markdown: false,
            ..Self::default()
        }
    }

    fn markdown_options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        options
    }
}

impl FragmentRenderer for HtmlRenderer {
    fn render_message(&self, view: &MessageView<'_>) -> Result<String> {
        let (class, sender) = if view.sent {
            ("message message--sent", self.user_name.as_str())
        } else {
            ("message message--received", self.agent_name.as_str())
        };

        let mut html = String::new();
        html.push_str(&format!("<div class=\"{}\">\n", class));
        html.push_str(&format!(
            "<div class=\"message__meta\"><span class=\"message__sender\">{}</span> <time class=\"message__time\">{}</time></div>\n",
            escape_html(sender),
            escape_html(view.time)
        ));

        if let Some(tool_id) = view.tool_id {
            html.push_str(&format!(
                "<div class=\"message__tools toolcall\" id=\"{}\">{}</div>\n",
                escape_html(tool_id),
                view.tool_narration.unwrap_or_default()
            ));
        } else if let Some(narration) = view.tool_narration {
            html.push_str(&format!("<div class=\"message__tools toolcall\">{}</div>\n", narration));
        }

        let answer = self.render_answer(view.message)?;
        match view.stream_id {
            Some(stream_id) => html.push_str(&format!(
                "<div class=\"message__content\" id=\"{}\">{}</div>\n",
                escape_html(stream_id),
                answer
            )),
            None => html.push_str(&format!("<div class=\"message__content\">{}</div>\n", answer)),
        }

        html.push_str("</div>");
        Ok(html)
    }

    fn render_answer(&self, message: &str) -> Result<String> {
        if !self.markdown {
            return Ok(escape_html(message));
        }

        let parser = Parser::new_ext(message, Self::markdown_options());
        let mut rendered = String::with_capacity(message.len() * 3 / 2);
        // May be empty for valid input, e.g. a lone link reference definition
        html::push_html(&mut rendered, parser);
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_embeds_region_ids() {
        let renderer = HtmlRenderer::plain();
        let html = renderer
            .render_message(&MessageView {
                message: "Bonjour",
                time: "09:30",
                stream_id: Some("stream-1"),
                tool_id: Some("tool-1"),
                tool_narration: Some("Using tool: x<br>"),
                ..MessageView::default()
            })
            .unwrap();

        assert!(html.contains(r#"id="stream-1">Bonjour</div>"#));
        assert!(html.contains(r#"id="tool-1">Using tool: x<br></div>"#));
        assert!(html.contains("<time class=\"message__time\">09:30</time>"));
        assert!(html.contains("message--received"));
        assert!(html.contains(">Agent</span>"));
    }

    #[test]
    fn test_message_without_ids() {
        let html = HtmlRenderer::plain()
            .render_message(&MessageView {
                message: "done",
                time: "10:00",
                ..MessageView::default()
            })
            .unwrap();

        assert!(!html.contains("id="));
        assert!(!html.contains("toolcall"));
        assert!(html.contains("<div class=\"message__content\">done</div>"));
    }

    #[test]
    fn test_markdown_answer() {
        let html = HtmlRenderer::default().render_answer("**bold** and ~~gone~~").unwrap();
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_plain_answer_is_escaped() {
        let html = HtmlRenderer::plain().render_answer("<b>x</b>").unwrap();
        assert_eq!(html, "&lt;b&gt;x&lt;/b&gt;");
    }

    #[test]
    fn test_empty_answer_renders_empty() {
        assert_eq!(HtmlRenderer::default().render_answer("").unwrap(), "");
    }

    #[test]
    fn test_invisible_markdown_renders_empty() {
        let renderer = HtmlRenderer::default();
        assert_eq!(renderer.render_answer("[1]: https://example.org").unwrap(), "");

        let html = renderer
            .render_answer("[1]: https://example.org\n\nSee the [source][1].")
            .unwrap();
        assert!(html.contains("<a href=\"https://example.org\">source</a>"));
    }
}
