//! Agent runtime seam and a scripted runtime for demos and tests
//!
//! The real model/agent runtime lives outside this crate; the pipeline only
//! needs an ordered, fallible pull-sequence of [`Chunk`]s.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures::Stream;
use futures_util::StreamExt;
use relay_common::{Chunk, ToolInvocation};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info};

/// Ordered chunk sequence of one agent answer
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Chunk>> + Send>>;

/// Produces chunk sequences for user messages
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Start answering `message`. Dropping the returned stream must release
    /// whatever the runtime holds open for it.
    async fn stream(&self, message: &str) -> Result<ChunkStream>;

    /// Complete answer in one go. Drains [`AgentRuntime::stream`] by default.
    async fn chat(&self, message: &str) -> Result<String> {
        let mut stream = self.stream(message).await?;
        let mut answer = String::new();

        while let Some(chunk) = stream.next().await {
            match chunk? {
                Chunk::Text { content } | Chunk::Reasoning { content } => answer.push_str(&content),
                _ => {}
            }
        }

        Ok(answer)
    }
}

/// One step of a scripted answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScenarioStep {
    /// Make the stream fail with this message
    Fail { fail: String },
    Chunk(Chunk),
}

/// Named, replayable chunk sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub description: String,
    pub steps: Vec<ScenarioStep>,
}

/// Runtime replaying scripted scenarios with a fixed delay between chunks.
///
/// A message starting with `/<scenario-id>` selects that scenario; any other
/// message is echoed back word by word.
#[derive(Debug, Clone)]
pub struct ScriptedRuntime {
    scenarios: Vec<Scenario>,
    delay: Duration,
}

impl Default for ScriptedRuntime {
    fn default() -> Self {
        Self::builtin(Duration::ZERO)
    }
}

impl ScriptedRuntime {
    /// Runtime with the built-in scenarios
    pub fn builtin(delay: Duration) -> Self {
        Self {
            scenarios: builtin_scenarios(),
            delay,
        }
    }

    /// Add scenarios; a scenario with an existing id replaces the old one.
    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        for scenario in scenarios {
            self.scenarios.retain(|s| s.id != scenario.id);
            self.scenarios.push(scenario);
        }
        self
    }

    /// Load scenarios from a JSON array file
    pub fn load_scenarios<P: AsRef<Path>>(path: P) -> Result<Vec<Scenario>> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {:?}", path))?;
        let scenarios: Vec<Scenario> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scenario file: {:?}", path))?;
        info!("Loaded {} scenario(s) from {:?}", scenarios.len(), path);
        Ok(scenarios)
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Steps answering `message`
    pub fn select(&self, message: &str) -> Vec<ScenarioStep> {
        if let Some(command) = message.strip_prefix('/') {
            let id = command.split_whitespace().next().unwrap_or_default();
            if let Some(scenario) = self.scenario(id) {
                debug!("Replaying scenario '{}'", scenario.id);
                return scenario.steps.clone();
            }
            return echo_steps(&format!("Unknown scenario: {}", id));
        }
        echo_steps(&format!("You said: {}", message))
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn stream(&self, message: &str) -> Result<ChunkStream> {
        let steps = self.select(message);
        let delay = self.delay;

        let stream = futures::stream::iter(steps).then(move |step| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match step {
                ScenarioStep::Chunk(chunk) => Ok(chunk),
                ScenarioStep::Fail { fail } => Err(anyhow!(fail)),
            }
        });

        Ok(Box::pin(stream))
    }
}

fn echo_steps(text: &str) -> Vec<ScenarioStep> {
    text.split_inclusive(' ')
        .map(|word| ScenarioStep::Chunk(Chunk::text(word)))
        .collect()
}

fn text_steps(words: &[&str]) -> Vec<ScenarioStep> {
    words
        .iter()
        .map(|w| ScenarioStep::Chunk(Chunk::text(*w)))
        .collect()
}

fn builtin_scenarios() -> Vec<Scenario> {
    let search = ToolInvocation::new("web_search").with_input("query", "weather in Lyon");
    let calc = ToolInvocation::new("calculator").with_input("expression", "21 * 2");
    let clock = ToolInvocation::new("clock").with_input("timezone", "Europe/Paris");

    let mut web_search = vec![
        ScenarioStep::Chunk(Chunk::reasoning("Looking up the forecast. ")),
        ScenarioStep::Chunk(Chunk::ToolCall {
            tools: vec![search.clone()],
        }),
        ScenarioStep::Chunk(Chunk::ToolResult {
            tools: vec![search.with_result("Sunny, 24°C, light wind")],
        }),
    ];
    web_search.extend(text_steps(&["It is ", "sunny ", "in Lyon ", "today."]));

    let mut multiple_tools = text_steps(&["Let me ", "work that out. "]);
    multiple_tools.extend([
        ScenarioStep::Chunk(Chunk::ToolCall {
            tools: vec![calc.clone(), clock.clone()],
        }),
        ScenarioStep::Chunk(Chunk::ToolResult {
            tools: vec![calc.with_result("42"), clock.with_result("14:05")],
        }),
    ]);
    multiple_tools.extend(text_steps(&["The answer ", "is 42 ", "and it is ", "14:05."]));

    let mut upstream_error = text_steps(&["Starting ", "the answer "]);
    upstream_error.push(ScenarioStep::Fail {
        fail: "model connection reset".to_string(),
    });

    vec![
        Scenario {
            id: "basic".to_string(),
            description: "Plain text streamed token by token".to_string(),
            steps: text_steps(&["Streaming ", "works ", "token ", "by ", "token."]),
        },
        Scenario {
            id: "web-search".to_string(),
            description: "Reasoning, one tool round, then the answer".to_string(),
            steps: web_search,
        },
        Scenario {
            id: "multiple-tools".to_string(),
            description: "Two tools in one round between answer text".to_string(),
            steps: multiple_tools,
        },
        Scenario {
            id: "upstream-error".to_string(),
            description: "The model connection fails mid-answer".to_string(),
            steps: upstream_error,
        },
    ]
}
