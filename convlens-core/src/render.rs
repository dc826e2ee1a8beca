//! Transcript rendering
//!
//! Walks a decoded conversation and produces one [`ExchangeBlock`] per
//! exchange. Blocks carry plain text tagged with a [`TranscriptKind`] so each
//! front-end can decorate them its own way.

use serde::Serialize;

use crate::config::DisplayConfig;
use crate::format::{format_time_of_day, truncate};
use crate::types::{
    AssistantContent, ConversationData, EnvContext, MessageExchange, RequestMetadata,
    ToolInvocation, UserContent,
};

/// Separator between tool names in a tool-use summary.
pub const TOOL_SEPARATOR: &str = ", ";

pub const USER_ICON: &str = "👤";
pub const ASSISTANT_ICON: &str = "🤖";
pub const TOOL_ICON: &str = "🔧";

/// Widths and switches for transcript rendering.
#[derive(Debug, Clone)]
pub struct TranscriptOptions {
    pub prompt_width: usize,
    pub response_width: usize,
    pub command_width: usize,
    /// Show the first tool's command under a tool-use turn
    pub show_tool_detail: bool,
    /// Show the user's OS and working directory
    pub show_context: bool,
}

impl Default for TranscriptOptions {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

impl From<&DisplayConfig> for TranscriptOptions {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            prompt_width: display.prompt_width,
            response_width: display.response_width,
            command_width: display.command_width,
            show_tool_detail: display.show_tool_detail,
            show_context: display.show_context,
        }
    }
}

/// What a transcript line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptKind {
    User,
    Assistant,
    ToolDetail,
    Performance,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptLine {
    pub kind: TranscriptKind,
    pub text: String,
}

impl TranscriptLine {
    fn new(kind: TranscriptKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Rendered form of one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeBlock {
    /// Zero-based position in the conversation
    pub index: usize,
    /// Local time-of-day of the user turn
    pub time: String,
    pub lines: Vec<TranscriptLine>,
}

/// Render every exchange of `data`, in order.
pub fn render_transcript(data: &ConversationData, options: &TranscriptOptions) -> Vec<ExchangeBlock> {
    data.history
        .iter()
        .enumerate()
        .map(|(index, exchange)| render_exchange(index, exchange, options))
        .collect()
}

/// Render a single exchange. Request metadata is only shown for index 0.
pub fn render_exchange(
    index: usize,
    exchange: &MessageExchange,
    options: &TranscriptOptions,
) -> ExchangeBlock {
    let mut lines = Vec::with_capacity(4);

    if options.show_context {
        if let Some(ctx) = &exchange.user.env_context {
            lines.push(TranscriptLine::new(TranscriptKind::Context, render_context(ctx)));
        }
    }

    lines.push(TranscriptLine::new(
        TranscriptKind::User,
        render_user(&exchange.user.content, options.prompt_width),
    ));

    lines.push(TranscriptLine::new(
        TranscriptKind::Assistant,
        render_assistant(&exchange.assistant, options.response_width),
    ));

    if options.show_tool_detail {
        if let Some(detail) = render_tool_detail(&exchange.assistant, options.command_width) {
            lines.push(TranscriptLine::new(TranscriptKind::ToolDetail, detail));
        }
    }

    if index == 0 {
        if let Some(meta) = &exchange.request_metadata {
            lines.push(TranscriptLine::new(
                TranscriptKind::Performance,
                render_performance(meta),
            ));
        }
    }

    ExchangeBlock {
        index,
        time: format_time_of_day(exchange.user.timestamp_utc()),
        lines,
    }
}

/// One-line summary of the user turn.
pub fn render_user(content: &UserContent, prompt_width: usize) -> String {
    match content {
        UserContent::Prompt { prompt } => {
            format!("{} {}", USER_ICON, truncate(prompt, prompt_width))
        }
        UserContent::ToolUseResults { results } => {
            format!("{} [Tool results: {}]", USER_ICON, results.len())
        }
        UserContent::Unrecognized => format!("{} [Unrecognized user input]", USER_ICON),
    }
}

/// One-line summary of the assistant turn.
pub fn render_assistant(content: &AssistantContent, response_width: usize) -> String {
    match content {
        AssistantContent::Response { content } => {
            format!("{} {}", ASSISTANT_ICON, truncate(content, response_width))
        }
        AssistantContent::ToolUse { tool_uses } => {
            format!("{} [Tools: {}]", ASSISTANT_ICON, tool_names(tool_uses))
        }
        AssistantContent::Unrecognized => format!("{} [Unrecognized response]", ASSISTANT_ICON),
    }
}

/// The first tool's command, when the turn is a tool use and it has one.
pub fn render_tool_detail(content: &AssistantContent, command_width: usize) -> Option<String> {
    let AssistantContent::ToolUse { tool_uses } = content else {
        return None;
    };
    let command = tool_uses.first()?.command.as_deref()?;
    Some(format!("{} $ {}", TOOL_ICON, truncate(command, command_width)))
}

fn tool_names(tool_uses: &[ToolInvocation]) -> String {
    if tool_uses.is_empty() {
        return "none".to_string();
    }
    tool_uses
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(TOOL_SEPARATOR)
}

fn render_performance(meta: &RequestMetadata) -> String {
    format!(
        "⏱  First chunk: {:.2}s | Type: {}",
        meta.time_to_first_chunk_seconds,
        meta.conversation_type.as_deref().unwrap_or("unknown")
    )
}

fn render_context(ctx: &EnvContext) -> String {
    match (&ctx.current_working_directory, &ctx.operating_system) {
        (Some(cwd), Some(os)) => format!("📂 {} ({})", cwd, os),
        (Some(cwd), None) => format!("📂 {}", cwd),
        (None, Some(os)) => format!("📂 ({})", os),
        (None, None) => "📂".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolResult, UserTurn};

    fn turn(content: UserContent) -> UserTurn {
        UserTurn {
            content,
            timestamp: Some("2024-03-01T12:30:45Z".to_string()),
            env_context: None,
        }
    }

    fn prompt_exchange(prompt: &str, reply: &str) -> MessageExchange {
        MessageExchange {
            user: turn(UserContent::Prompt {
                prompt: prompt.to_string(),
            }),
            assistant: AssistantContent::Response {
                content: reply.to_string(),
            },
            request_metadata: Some(RequestMetadata {
                time_to_first_chunk_seconds: 1.234,
                conversation_type: Some("NotToolUse".to_string()),
            }),
        }
    }

    fn texts(block: &ExchangeBlock) -> Vec<&str> {
        block.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_prompt_rendering_starts_with_text() {
        let long = "x".repeat(500);
        for text in ["", "T", "hi", "ünïcödé ✨", long.as_str()] {
            let rendered = render_user(
                &UserContent::Prompt {
                    prompt: text.to_string(),
                },
                150,
            );
            let body = rendered.strip_prefix("👤 ").unwrap();
            let expected = truncate(text, 150);
            assert_eq!(body, expected);
            assert!(text.starts_with(body.trim_end_matches("...")));
        }
    }

    #[test]
    fn test_user_variants() {
        let results = UserContent::ToolUseResults {
            results: vec![
                ToolResult {
                    tool_use_id: None,
                    status: None
                };
                3
            ],
        };
        assert_eq!(render_user(&results, 150), "👤 [Tool results: 3]");
        assert_eq!(
            render_user(&UserContent::Unrecognized, 150),
            "👤 [Unrecognized user input]"
        );
    }

    #[test]
    fn test_response_truncated_to_width() {
        let long = "a".repeat(250);
        let rendered = render_assistant(&AssistantContent::Response { content: long }, 200);
        assert_eq!(rendered, format!("🤖 {}...", "a".repeat(200)));
    }

    #[test]
    fn test_tool_use_names_and_first_command() {
        let content = AssistantContent::ToolUse {
            tool_uses: vec![
                ToolInvocation {
                    name: "search".to_string(),
                    command: Some("rg needle".to_string()),
                },
                ToolInvocation {
                    name: "edit".to_string(),
                    command: Some("ignored".to_string()),
                },
            ],
        };
        assert_eq!(render_assistant(&content, 200), "🤖 [Tools: search, edit]");
        assert_eq!(
            render_tool_detail(&content, 100).as_deref(),
            Some("🔧 $ rg needle")
        );
    }

    #[test]
    fn test_tool_detail_truncated_and_optional() {
        let long = AssistantContent::ToolUse {
            tool_uses: vec![ToolInvocation {
                name: "execute_bash".to_string(),
                command: Some("c".repeat(150)),
            }],
        };
        let detail = render_tool_detail(&long, 100).unwrap();
        assert_eq!(detail, format!("🔧 $ {}...", "c".repeat(100)));

        let no_command = AssistantContent::ToolUse {
            tool_uses: vec![ToolInvocation {
                name: "fs_read".to_string(),
                command: None,
            }],
        };
        assert!(render_tool_detail(&no_command, 100).is_none());
        assert!(render_tool_detail(&AssistantContent::Unrecognized, 100).is_none());
        assert_eq!(
            render_assistant(&AssistantContent::ToolUse { tool_uses: vec![] }, 200),
            "🤖 [Tools: none]"
        );
    }

    #[test]
    fn test_performance_only_on_first_exchange() {
        let data = ConversationData {
            conversation_id: None,
            history: vec![prompt_exchange("one", "1"), prompt_exchange("two", "2")],
        };
        let blocks = render_transcript(&data, &TranscriptOptions::default());
        assert_eq!(blocks.len(), 2);

        assert_eq!(
            texts(&blocks[0]),
            vec!["👤 one", "🤖 1", "⏱  First chunk: 1.23s | Type: NotToolUse"]
        );
        assert_eq!(texts(&blocks[1]), vec!["👤 two", "🤖 2"]);
        assert_eq!(blocks[1].index, 1);
    }

    #[test]
    fn test_block_time_is_local_time_of_day() {
        let block = render_exchange(0, &prompt_exchange("hi", "hello"), &TranscriptOptions::default());
        let expected = format_time_of_day(
            chrono::DateTime::parse_from_rfc3339("2024-03-01T12:30:45Z")
                .ok()
                .map(|dt| dt.with_timezone(&chrono::Utc)),
        );
        assert_eq!(block.time, expected);

        let unrecognized = render_exchange(3, &MessageExchange::unrecognized(), &TranscriptOptions::default());
        assert_eq!(unrecognized.time, crate::format::UNKNOWN_TIME);
        assert_eq!(
            texts(&unrecognized),
            vec!["👤 [Unrecognized user input]", "🤖 [Unrecognized response]"]
        );
    }

    #[test]
    fn test_options_toggle_detail_and_context() {
        let mut exchange = MessageExchange {
            user: turn(UserContent::Prompt {
                prompt: "run it".to_string(),
            }),
            assistant: AssistantContent::ToolUse {
                tool_uses: vec![ToolInvocation {
                    name: "execute_bash".to_string(),
                    command: Some("cargo fmt".to_string()),
                }],
            },
            request_metadata: None,
        };
        exchange.user.env_context = Some(EnvContext {
            operating_system: Some("linux".to_string()),
            current_working_directory: Some("/proj".to_string()),
        });

        let quiet = TranscriptOptions {
            show_tool_detail: false,
            ..TranscriptOptions::default()
        };
        assert_eq!(
            texts(&render_exchange(1, &exchange, &quiet)),
            vec!["👤 run it", "🤖 [Tools: execute_bash]"]
        );

        let loud = TranscriptOptions {
            show_context: true,
            ..TranscriptOptions::default()
        };
        let block = render_exchange(1, &exchange, &loud);
        assert_eq!(block.lines[0].kind, TranscriptKind::Context);
        assert_eq!(
            texts(&block),
            vec![
                "📂 /proj (linux)",
                "👤 run it",
                "🤖 [Tools: execute_bash]",
                "🔧 $ cargo fmt"
            ]
        );
    }
}
