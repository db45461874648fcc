//! Bounded oracle tool loop.
//!
//! The oracle is driven with three tools (structured query, semantic
//! search, chart rendering) through an explicit finite-state loop. The
//! loop is capped at a fixed number of tool round-trips and terminates
//! with an explicit answer when the budget is exhausted.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::chat::{Answer, Orchestrator, Role, Turn};
use crate::oracle::{ChatMessage, Oracle, ToolCall, ToolSpec};

/// Default cap on tool round-trips.
pub const MAX_TOOL_ROUNDS: usize = 5;

const EXHAUSTED_ANSWER: &str =
    "I could not complete this request within the allotted number of tool calls. \
     Try narrowing the question or asking for one thing at a time.";

const AGENT_SYSTEM_PROMPT: &str =
    "You are a customer insights assistant with access to tools. Use \
     structured_query for counts, breakdowns and rankings over the customer \
     table, semantic_search for descriptive questions about individual \
     customers, and render_chart to visualize grouped numbers. Answer from \
     tool results only.";

/// Loop state for the bounded tool round-trip.
#[derive(Debug)]
enum LoopState {
    /// Waiting on the next oracle completion.
    AwaitingResponse,
    /// Executing the tool calls the oracle requested.
    ExecutingTools(Vec<ToolCall>),
    /// The oracle produced a final text answer.
    Done(String),
    /// The round budget ran out before a final answer.
    Exhausted,
}

/// Tool specifications offered to the oracle.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "structured_query".to_string(),
            description: "Run an analytics question against the customer table. \
                          Returns counts, breakdowns, rankings or row summaries as text."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The analytics question, in natural language"
                    }
                },
                "required": ["question"]
            }),
        },
        ToolSpec {
            name: "semantic_search".to_string(),
            description: "Retrieve customer knowledge-base entries relevant to a \
                          descriptive question."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The descriptive question or topic"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolSpec {
            name: "render_chart".to_string(),
            description: "Render labeled values as a text bar chart.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "labels": {"type": "array", "items": {"type": "string"}},
                    "values": {"type": "array", "items": {"type": "number"}}
                },
                "required": ["labels", "values"]
            }),
        },
    ]
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StructuredQueryArgs {
    question: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SemanticSearchArgs {
    query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RenderChartArgs {
    title: String,
    labels: Vec<String>,
    values: Vec<f64>,
}

/// Drives the oracle through the bounded tool loop.
pub struct ToolAgent {
    oracle: Arc<dyn Oracle>,
    orchestrator: Arc<Orchestrator>,
    max_rounds: usize,
}

impl ToolAgent {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        orchestrator: Arc<Orchestrator>,
        max_rounds: usize,
    ) -> Self {
        Self {
            oracle,
            orchestrator,
            max_rounds: if max_rounds == 0 { MAX_TOOL_ROUNDS } else { max_rounds },
        }
    }

    /// Answer a question through the tool loop.
    pub async fn run(&self, question: &str, history: &[Turn]) -> Answer {
        let tools = tool_specs();
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(AGENT_SYSTEM_PROMPT));
        for turn in history {
            messages.push(match turn.role {
                Role::User => ChatMessage::user(turn.content.clone()),
                Role::Assistant => ChatMessage::assistant(turn.content.clone()),
            });
        }
        messages.push(ChatMessage::user(question.to_string()));

        let mut rounds = 0;
        let mut state = LoopState::AwaitingResponse;

        loop {
            state = match state {
                LoopState::AwaitingResponse => {
                    if rounds >= self.max_rounds {
                        LoopState::Exhausted
                    } else {
                        match self.oracle.complete(&messages, Some(&tools)).await {
                            Ok(completion) if completion.tool_calls.is_empty() => {
                                LoopState::Done(completion.content)
                            }
                            Ok(completion) => {
                                messages.push(ChatMessage::assistant_tool_calls(
                                    completion.tool_calls.clone(),
                                ));
                                LoopState::ExecutingTools(completion.tool_calls)
                            }
                            Err(e) => {
                                tracing::warn!("Agent completion failed: {}", e);
                                LoopState::Done(format!("Language model error: {}", e))
                            }
                        }
                    }
                }
                LoopState::ExecutingTools(calls) => {
                    for call in calls {
                        let result = self.dispatch(&call).await;
                        tracing::debug!("Tool {} returned {} chars", call.name, result.len());
                        messages.push(ChatMessage::tool(call.id, result));
                    }
                    rounds += 1;
                    LoopState::AwaitingResponse
                }
                LoopState::Done(text) => return Answer::new(text),
                LoopState::Exhausted => return Answer::new(EXHAUSTED_ANSWER),
            };
        }
    }

    /// Execute a single tool call. Never fails; problems come back as text.
    async fn dispatch(&self, call: &ToolCall) -> String {
        match call.name.as_str() {
            "structured_query" => {
                let args: StructuredQueryArgs =
                    serde_json::from_str(&call.arguments).unwrap_or_default();
                if args.question.is_empty() {
                    return "structured_query requires a question argument".to_string();
                }
                self.orchestrator.structured_answer(&args.question).await
            }
            "semantic_search" => {
                let args: SemanticSearchArgs =
                    serde_json::from_str(&call.arguments).unwrap_or_default();
                if args.query.is_empty() {
                    return "semantic_search requires a query argument".to_string();
                }
                self.orchestrator.semantic_context(&args.query).await
            }
            "render_chart" => {
                let args: RenderChartArgs =
                    serde_json::from_str(&call.arguments).unwrap_or_default();
                render_bar_chart(&args.title, &args.labels, &args.values)
            }
            other => format!("Unknown tool: {}", other),
        }
    }
}

/// Render labeled values as a fixed-width text bar chart.
fn render_bar_chart(title: &str, labels: &[String], values: &[f64]) -> String {
    if labels.is_empty() || labels.len() != values.len() {
        return "render_chart requires matching non-empty labels and values".to_string();
    }

    let max_value = values.iter().cloned().fold(f64::MIN, f64::max).max(0.0);
    let label_width = labels.iter().map(|l| l.len()).max().unwrap_or(0);

    let mut out = String::new();
    if !title.is_empty() {
        out.push_str(title);
        out.push('\n');
    }
    for (label, value) in labels.iter().zip(values) {
        let bar_len = if max_value > 0.0 {
            ((value / max_value) * 30.0).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{:<width$} | {} {}\n",
            label,
            "#".repeat(bar_len),
            value,
            width = label_width
        ));
    }
    out.trim_end().to_string()
}
