//! Conversation payload decoder
//!
//! Turns the JSON document stored in `conversations_v2.value` into a
//! [`ConversationData`].
//!
//! # Error Handling
//!
//! Failures are isolated to the smallest unit that contains them:
//!
//! - **Unusable document** (invalid JSON, not an object, no `history` array):
//!   [`DecodeError::MalformedPayload`]. The caller skips the record.
//!
//! - **Unusable exchange** (neither an object nor a `[user, assistant]` pair):
//!   decoded as an exchange with both turns `Unrecognized`, so the exchange
//!   still counts and its neighbours still render.
//!
//! - **Unknown turn shape**: the turn becomes `Unrecognized`. Variant selection
//!   looks at which known key is present (`Prompt` / `ToolUseResults` for the
//!   user, `Response` / `ToolUse` for the assistant); the body under that key
//!   is then read with a lenient serde struct. A body that does not fit also
//!   yields `Unrecognized`.
//!
//! - **Missing optional fields** (timestamp, environment, request metadata):
//!   left as `None`; a missing first-chunk latency reads as 0.
//!
//! Keys are accepted both in the store's snake_case spelling and in camelCase.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::types::{
    AssistantContent, ConversationData, ConversationRecord, EnvContext, MessageExchange,
    RequestMetadata, ToolInvocation, ToolResult, UserContent, UserTurn,
};

// ============================================
// Raw variant bodies (serde deserialization)
// ============================================

#[derive(Debug, Deserialize)]
struct RawPrompt {
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct RawToolUseResults {
    #[serde(alias = "toolUseResults", alias = "results")]
    tool_use_results: Vec<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawToolResult {
    #[serde(alias = "toolUseId")]
    tool_use_id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RawToolUse {
    #[serde(alias = "toolUses")]
    tool_uses: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawToolInvocation {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawEnvState {
    #[serde(alias = "operatingSystem")]
    operating_system: Option<String>,
    #[serde(alias = "currentWorkingDirectory")]
    current_working_directory: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawRequestMetadata {
    #[serde(
        alias = "time_to_first_chunk_seconds",
        alias = "timeToFirstChunk",
        alias = "timeToFirstChunkSeconds"
    )]
    time_to_first_chunk: Option<Value>,
    #[serde(
        alias = "conversation_type",
        alias = "chatConversationType",
        alias = "conversationType"
    )]
    chat_conversation_type: Option<String>,
}

// ============================================
// Public entry points
// ============================================

/// Decode a stored conversation document.
pub fn decode_conversation(raw: &str) -> Result<ConversationData, DecodeError> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|e| DecodeError::malformed(format!("invalid JSON: {}", e)))?;

    let Value::Object(root) = document else {
        return Err(DecodeError::malformed("top-level value is not an object"));
    };

    let history = match root.get("history") {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(DecodeError::malformed("`history` is not an array")),
        None => return Err(DecodeError::malformed("missing `history` field")),
    };

    let conversation_id = field(&root, &["conversation_id", "conversationId"])
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ConversationData {
        conversation_id,
        history: history.iter().map(decode_exchange).collect(),
    })
}

impl ConversationRecord {
    /// Decode this record's payload. See [`decode_conversation`].
    pub fn decode(&self) -> Result<ConversationData, DecodeError> {
        decode_conversation(&self.raw_payload)
    }
}

// ============================================
// Exchanges and turns
// ============================================

fn decode_exchange(value: &Value) -> MessageExchange {
    match value {
        Value::Object(map) => MessageExchange {
            user: field(map, &["user"])
                .map(decode_user_turn)
                .unwrap_or_else(unrecognized_user),
            assistant: field(map, &["assistant"])
                .map(decode_assistant)
                .unwrap_or(AssistantContent::Unrecognized),
            request_metadata: field(map, &["request_metadata", "requestMetadata"])
                .and_then(decode_request_metadata),
        },
        // Older stores kept each exchange as a bare `[user, assistant]` pair.
        Value::Array(pair) if pair.len() == 2 => MessageExchange {
            user: decode_user_turn(&pair[0]),
            assistant: decode_assistant(&pair[1]),
            request_metadata: None,
        },
        other => {
            tracing::debug!(kind = json_kind(other), "Unrecognized exchange encoding");
            MessageExchange::unrecognized()
        }
    }
}

fn unrecognized_user() -> UserTurn {
    UserTurn {
        content: UserContent::Unrecognized,
        timestamp: None,
        env_context: None,
    }
}

fn decode_user_turn(value: &Value) -> UserTurn {
    let Value::Object(map) = value else {
        return unrecognized_user();
    };

    UserTurn {
        content: field(map, &["content"])
            .map(decode_user_content)
            .unwrap_or(UserContent::Unrecognized),
        timestamp: field(map, &["timestamp"])
            .and_then(Value::as_str)
            .map(str::to_string),
        env_context: field(map, &["env_context", "envContext"]).and_then(decode_env_context),
    }
}

/// Resolve the user content union by which known key is present.
fn decode_user_content(value: &Value) -> UserContent {
    let Value::Object(map) = value else {
        return UserContent::Unrecognized;
    };

    if let Some(body) = map.get("Prompt") {
        return match RawPrompt::deserialize(body) {
            Ok(raw) => UserContent::Prompt { prompt: raw.prompt },
            Err(e) => {
                tracing::trace!(error = %e, "Prompt body did not match");
                UserContent::Unrecognized
            }
        };
    }

    if let Some(body) = map.get("ToolUseResults") {
        return match RawToolUseResults::deserialize(body) {
            Ok(raw) => UserContent::ToolUseResults {
                results: raw
                    .tool_use_results
                    .iter()
                    .map(|result| {
                        let raw = RawToolResult::deserialize(result).unwrap_or_default();
                        ToolResult {
                            tool_use_id: raw.tool_use_id,
                            status: raw.status,
                        }
                    })
                    .collect(),
            },
            Err(e) => {
                tracing::trace!(error = %e, "ToolUseResults body did not match");
                UserContent::Unrecognized
            }
        };
    }

    UserContent::Unrecognized
}

/// Resolve the assistant content union by which known key is present.
fn decode_assistant(value: &Value) -> AssistantContent {
    let Value::Object(map) = value else {
        return AssistantContent::Unrecognized;
    };

    if let Some(body) = map.get("Response") {
        if let Value::String(content) = body {
            return AssistantContent::Response {
                content: content.clone(),
            };
        }
        return match RawResponse::deserialize(body) {
            Ok(raw) => AssistantContent::Response {
                content: raw.content,
            },
            Err(e) => {
                tracing::trace!(error = %e, "Response body did not match");
                AssistantContent::Unrecognized
            }
        };
    }

    if let Some(body) = map.get("ToolUse") {
        return match RawToolUse::deserialize(body) {
            Ok(raw) => AssistantContent::ToolUse {
                tool_uses: raw
                    .tool_uses
                    .iter()
                    .filter_map(|invocation| RawToolInvocation::deserialize(invocation).ok())
                    .map(|raw| ToolInvocation {
                        command: raw
                            .args
                            .get("command")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        name: raw.name,
                    })
                    .collect(),
            },
            Err(e) => {
                tracing::trace!(error = %e, "ToolUse body did not match");
                AssistantContent::Unrecognized
            }
        };
    }

    AssistantContent::Unrecognized
}

fn decode_env_context(value: &Value) -> Option<EnvContext> {
    let state = match value {
        Value::Object(map) => field(map, &["env_state", "envState"]).unwrap_or(value),
        _ => return None,
    };
    let raw = RawEnvState::deserialize(state).ok()?;
    let context = EnvContext {
        operating_system: raw.operating_system,
        current_working_directory: raw.current_working_directory,
    };
    (!context.is_empty()).then_some(context)
}

fn decode_request_metadata(value: &Value) -> Option<RequestMetadata> {
    if !value.is_object() {
        return None;
    }
    let raw = RawRequestMetadata::deserialize(value).ok()?;

    Some(RequestMetadata {
        time_to_first_chunk_seconds: raw
            .time_to_first_chunk
            .as_ref()
            .and_then(duration_seconds)
            .unwrap_or(0.0),
        conversation_type: raw.chat_conversation_type,
    })
}

/// Seconds from either a plain number or a `{secs, nanos}` duration object.
/// Negative values are clamped to zero.
fn duration_seconds(value: &Value) -> Option<f64> {
    let seconds = match value {
        Value::Number(n) => n.as_f64()?,
        Value::Object(map) => {
            let secs = map.get("secs").and_then(Value::as_f64).unwrap_or(0.0);
            let nanos = map.get("nanos").and_then(Value::as_f64).unwrap_or(0.0);
            secs + nanos / 1_000_000_000.0
        }
        _ => return None,
    };
    Some(seconds.max(0.0))
}

// ============================================
// Helpers
// ============================================

/// First non-null value among `names`.
fn field<'a>(map: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| map.get(*name))
        .find(|value| !value.is_null())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exchange(user_content: Value, assistant: Value) -> Value {
        json!({
            "user": {
                "content": user_content,
                "timestamp": "2024-03-01T12:30:45.123Z",
            },
            "assistant": assistant,
        })
    }

    fn decode_one(ex: Value) -> MessageExchange {
        let doc = json!({ "conversation_id": "c1", "history": [ex] });
        let mut data = decode_conversation(&doc.to_string()).unwrap();
        assert_eq!(data.history.len(), 1);
        data.history.remove(0)
    }

    #[test]
    fn test_prompt_and_response() {
        let ex = decode_one(exchange(
            json!({ "Prompt": { "prompt": "hi" } }),
            json!({ "Response": { "message_id": "m1", "content": "hello" } }),
        ));
        assert_eq!(
            ex.user.content,
            UserContent::Prompt {
                prompt: "hi".to_string()
            }
        );
        assert_eq!(
            ex.assistant,
            AssistantContent::Response {
                content: "hello".to_string()
            }
        );
        assert_eq!(ex.user.timestamp.as_deref(), Some("2024-03-01T12:30:45.123Z"));
        assert!(ex.request_metadata.is_none());
    }

    #[test]
    fn test_conversation_id_is_informational() {
        let data = decode_conversation(r#"{"conversation_id":"abc","history":[]}"#).unwrap();
        assert_eq!(data.conversation_id.as_deref(), Some("abc"));
        assert!(data.history.is_empty());

        let data = decode_conversation(r#"{"history":[]}"#).unwrap();
        assert!(data.conversation_id.is_none());
    }

    #[test]
    fn test_tool_use_results_are_counted() {
        let ex = decode_one(exchange(
            json!({ "ToolUseResults": { "tool_use_results": [
                { "tool_use_id": "t1", "content": [{ "Text": "ok" }], "status": "Success" },
                { "tool_use_id": "t2", "content": [], "status": "Error" },
                "not even an object"
            ] } }),
            json!({ "Response": { "content": "done" } }),
        ));
        match ex.user.content {
            UserContent::ToolUseResults { results } => {
                assert_eq!(results.len(), 3);
                assert_eq!(results[0].tool_use_id.as_deref(), Some("t1"));
                assert_eq!(results[1].status.as_deref(), Some("Error"));
                assert_eq!(results[2], ToolResult { tool_use_id: None, status: None });
            }
            other => panic!("expected ToolUseResults, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_use_keeps_order_and_first_command() {
        let ex = decode_one(exchange(
            json!({ "Prompt": { "prompt": "find and fix" } }),
            json!({ "ToolUse": { "message_id": "m", "content": "", "tool_uses": [
                { "id": "1", "name": "search", "args": { "command": "grep -r foo ." } },
                { "id": "2", "name": "edit", "args": { "path": "src/lib.rs" } }
            ] } }),
        ));
        match ex.assistant {
            AssistantContent::ToolUse { tool_uses } => {
                let names: Vec<_> = tool_uses.iter().map(|t| t.name.as_str()).collect();
                assert_eq!(names, vec!["search", "edit"]);
                assert_eq!(tool_uses[0].command.as_deref(), Some("grep -r foo ."));
                assert!(tool_uses[1].command.is_none());
            }
            other => panic!("expected ToolUse, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_shapes_are_unrecognized() {
        let ex = decode_one(exchange(
            json!({ "CancelledToolUses": { "prompt": "x" } }),
            json!({ "Thinking": { "content": "hmm" } }),
        ));
        assert_eq!(ex.user.content, UserContent::Unrecognized);
        assert_eq!(ex.assistant, AssistantContent::Unrecognized);

        // right key, wrong body
        let ex = decode_one(exchange(
            json!({ "Prompt": { "prompt": 42 } }),
            json!({ "ToolUse": { "tool_uses": "nope" } }),
        ));
        assert_eq!(ex.user.content, UserContent::Unrecognized);
        assert_eq!(ex.assistant, AssistantContent::Unrecognized);

        // not objects at all
        let ex = decode_one(exchange(json!("hi"), json!(null)));
        assert_eq!(ex.user.content, UserContent::Unrecognized);
        assert_eq!(ex.assistant, AssistantContent::Unrecognized);
    }

    #[test]
    fn test_missing_history_is_malformed() {
        let err = decode_conversation(r#"{"conversation_id":"c1"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload { .. }));
        assert!(err.to_string().contains("history"));
    }

    #[test]
    fn test_invalid_documents_are_malformed() {
        for raw in ["", "not json", "[1,2,3]", "\"text\"", r#"{"history":{}}"#, r#"{"history":null}"#] {
            assert!(
                matches!(decode_conversation(raw), Err(DecodeError::MalformedPayload { .. })),
                "expected MalformedPayload for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_malformed_exchange_among_valid_ones() {
        let doc = json!({
            "history": [
                exchange(json!({ "Prompt": { "prompt": "first" } }), json!({ "Response": { "content": "one" } })),
                42,
                exchange(json!({ "Prompt": { "prompt": "third" } }), json!({ "Response": { "content": "three" } })),
            ]
        });
        let data = decode_conversation(&doc.to_string()).unwrap();
        assert_eq!(data.history.len(), 3);
        assert_eq!(data.history[1], MessageExchange::unrecognized());
        assert_eq!(
            data.history[2].user.content,
            UserContent::Prompt {
                prompt: "third".to_string()
            }
        );
    }

    #[test]
    fn test_legacy_pair_exchange() {
        let doc = json!({
            "history": [[
                { "content": { "Prompt": { "prompt": "old" } }, "timestamp": null },
                { "Response": { "content": "style" } }
            ]]
        });
        let data = decode_conversation(&doc.to_string()).unwrap();
        let ex = &data.history[0];
        assert_eq!(
            ex.user.content,
            UserContent::Prompt {
                prompt: "old".to_string()
            }
        );
        assert!(ex.user.timestamp.is_none());
        assert_eq!(
            ex.assistant,
            AssistantContent::Response {
                content: "style".to_string()
            }
        );
    }

    #[test]
    fn test_request_metadata_duration_object() {
        let mut ex = exchange(
            json!({ "Prompt": { "prompt": "hi" } }),
            json!({ "Response": { "content": "hello" } }),
        );
        ex["request_metadata"] = json!({
            "time_to_first_chunk": { "secs": 1, "nanos": 500_000_000 },
            "chat_conversation_type": "NotToolUse"
        });
        let meta = decode_one(ex).request_metadata.unwrap();
        assert!((meta.time_to_first_chunk_seconds - 1.5).abs() < 1e-9);
        assert_eq!(meta.conversation_type.as_deref(), Some("NotToolUse"));
    }

    #[test]
    fn test_request_metadata_camel_case_and_defaults() {
        let mut ex = exchange(
            json!({ "Prompt": { "prompt": "hi" } }),
            json!({ "Response": { "content": "hello" } }),
        );
        ex["requestMetadata"] = json!({ "timeToFirstChunkSeconds": 0.25, "conversationType": "ToolUse" });
        let meta = decode_one(ex).request_metadata.unwrap();
        assert!((meta.time_to_first_chunk_seconds - 0.25).abs() < 1e-9);
        assert_eq!(meta.conversation_type.as_deref(), Some("ToolUse"));

        let mut ex = exchange(
            json!({ "Prompt": { "prompt": "hi" } }),
            json!({ "Response": { "content": "hello" } }),
        );
        ex["request_metadata"] = json!({ "request_id": "r1" });
        let meta = decode_one(ex).request_metadata.unwrap();
        assert_eq!(meta.time_to_first_chunk_seconds, 0.0);
        assert!(meta.conversation_type.is_none());
    }

    #[test]
    fn test_env_context() {
        let ex = decode_one(json!({
            "user": {
                "content": { "Prompt": { "prompt": "hi" } },
                "env_context": { "env_state": {
                    "operating_system": "linux",
                    "current_working_directory": "/proj",
                    "environment_variables": []
                } }
            },
            "assistant": { "Response": { "content": "hello" } }
        }));
        let ctx = ex.user.env_context.unwrap();
        assert_eq!(ctx.operating_system.as_deref(), Some("linux"));
        assert_eq!(ctx.current_working_directory.as_deref(), Some("/proj"));
    }

    #[test]
    fn test_camel_case_tool_use() {
        let ex = decode_one(exchange(
            json!({ "ToolUseResults": { "results": [{ "toolUseId": "a" }] } }),
            json!({ "ToolUse": { "toolUses": [{ "name": "fs_read", "args": {} }] } }),
        ));
        assert!(matches!(ex.user.content, UserContent::ToolUseResults { ref results } if results.len() == 1));
        assert!(matches!(ex.assistant, AssistantContent::ToolUse { ref tool_uses } if tool_uses[0].name == "fs_read"));
    }

    #[test]
    fn test_any_prompt_text_decodes() {
        for text in ["", " ", "T", "ünïcödé ✨", "line\nbreaks\tand tabs", "\"quoted\""] {
            let ex = decode_one(exchange(
                json!({ "Prompt": { "prompt": text } }),
                json!({ "Response": { "content": "" } }),
            ));
            assert_eq!(
                ex.user.content,
                UserContent::Prompt {
                    prompt: text.to_string()
                }
            );
        }
    }
}
