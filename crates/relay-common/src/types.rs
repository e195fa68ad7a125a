//! Chunk data model produced by the agent runtime

use serde::{Deserialize, Serialize};

/// One typed unit of model output pulled from the agent runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chunk {
    /// Answer text
    Text { content: String },
    /// Internal reasoning text
    Reasoning { content: String },
    /// The agent is invoking tools
    ToolCall { tools: Vec<ToolInvocation> },
    /// Tool invocations finished
    ToolResult { tools: Vec<ToolInvocation> },
    /// Any kind this crate does not know about
    #[serde(other)]
    Unknown,
}

/// Discriminant of a [`Chunk`], handy for logging and counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkKind {
    Text,
    Reasoning,
    ToolCall,
    ToolResult,
    Unknown,
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkKind::Text => write!(f, "text"),
            ChunkKind::Reasoning => write!(f, "reasoning"),
            ChunkKind::ToolCall => write!(f, "tool_call"),
            ChunkKind::ToolResult => write!(f, "tool_result"),
            ChunkKind::Unknown => write!(f, "unknown"),
        }
    }
}

impl Chunk {
    pub fn text(content: impl Into<String>) -> Self {
        Chunk::Text {
            content: content.into(),
        }
    }

    pub fn reasoning(content: impl Into<String>) -> Self {
        Chunk::Reasoning {
            content: content.into(),
        }
    }

    pub fn kind(&self) -> ChunkKind {
        match self {
            Chunk::Text { .. } => ChunkKind::Text,
            Chunk::Reasoning { .. } => ChunkKind::Reasoning,
            Chunk::ToolCall { .. } => ChunkKind::ToolCall,
            Chunk::ToolResult { .. } => ChunkKind::ToolResult,
            Chunk::Unknown => ChunkKind::Unknown,
        }
    }
}

/// A tool invocation as reported by the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    /// Named inputs, in the order the runtime supplied them
    #[serde(default)]
    pub inputs: Vec<ToolInput>,
    /// Result text, only meaningful on tool results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInput {
    pub name: String,
    pub value: serde_json::Value,
}

impl ToolInput {
    /// Display form of the value: strings without quotes, everything else as compact JSON
    pub fn display_value(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            result: None,
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.inputs.push(ToolInput {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }
}
