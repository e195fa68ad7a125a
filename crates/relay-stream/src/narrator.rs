//! Human-readable narration of tool activity

use relay_common::{TOOLS_DONE_MARKER, ToolInvocation, escape_html};
use std::fmt::Write;

/// Renders tool-call and tool-result chunks into the markup shown in the
/// tool-activity region of a message.
#[derive(Debug, Clone, Default)]
pub struct ToolNarrator;

impl ToolNarrator {
    pub fn new() -> Self {
        Self
    }

    /// Narration for tools the agent is about to run
    pub fn narrate_calls(&self, tools: &[ToolInvocation]) -> String {
        let mut text = String::new();
        for tool in tools {
            self.write_invocation(&mut text, tool);
        }
        text
    }

    /// Narration for finished tools: the hidden done marker, then each tool
    /// followed by its result.
    pub fn narrate_results(&self, tools: &[ToolInvocation]) -> String {
        let mut text = String::new();
        text.push_str(TOOLS_DONE_MARKER);
        text.push('\n');

        for tool in tools {
            self.write_invocation(&mut text, tool);
            text.push_str("Response: <br>\n");
            if let Some(result) = tool.result.as_deref().filter(|r| !r.is_empty()) {
                let _ = writeln!(
                    text,
                    r#"<pre class="toolcall__result">{}</pre>"#,
                    escape_html(result)
                );
            }
        }
        text
    }

    fn write_invocation(&self, text: &mut String, tool: &ToolInvocation) {
        let _ = writeln!(text, "Using tool: {}<br>", escape_html(&tool.name));
        text.push_str("Parameters: <br>\n");
        text.push_str("<ul>\n");
        for input in &tool.inputs {
            let _ = writeln!(
                text,
                "<li>{} : {}</li>",
                escape_html(&input.name),
                escape_html(&input.display_value())
            );
        }
        text.push_str("</ul>\n");
    }
}
