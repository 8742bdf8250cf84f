//! Chat endpoint request/response shapes

use crate::error::{exit_codes, ConciergeError};
use crate::llm::Message;
use crate::ratelimit::RateLimitDecision;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Inbound chat turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Prior turns, in the order the caller wants them replayed
    #[serde(default)]
    pub history: Vec<Message>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// Remaining budget reported with every successful reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl From<RateLimitDecision> for RateLimitStatus {
    fn from(decision: RateLimitDecision) -> Self {
        Self {
            remaining: decision.remaining,
            reset_at: decision.reset_at,
        }
    }
}

/// Completed chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    /// Names of the tools executed this turn, in call order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<String>,
    pub rate_limit: RateLimitStatus,
    /// Set when the follow-up completion failed and a fallback answer was used
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

/// Turn-level failures
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("Rate limit exceeded")]
    RateLimited {
        reset_at: DateTime<Utc>,
        retry_after_secs: u64,
    },

    #[error("Message is required")]
    EmptyMessage,

    #[error("Failed to process chat message: {0}")]
    Completion(#[source] ConciergeError),
}

impl TurnError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RateLimited { .. } => exit_codes::RATE_LIMITED,
            Self::EmptyMessage => exit_codes::INVALID_INPUT,
            Self::Completion(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

/// Message shown to visitors when the model cannot be reached
pub const USER_SAFE_FAILURE: &str =
    "The assistant is temporarily unavailable. Please try again in a moment.";

/// HTTP-shaped rendering of a chat turn for transport adapters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEndpointResponse {
    pub status: u16,
    /// Value of the `Retry-After` header, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    pub body: Value,
}

impl ChatEndpointResponse {
    pub fn from_result(result: &Result<ChatReply, TurnError>) -> Self {
        match result {
            Ok(reply) => Self {
                status: 200,
                retry_after: None,
                body: serde_json::to_value(reply).unwrap_or_else(|_| json!({})),
            },
            Err(TurnError::RateLimited {
                reset_at,
                retry_after_secs,
            }) => Self {
                status: 429,
                retry_after: Some(*retry_after_secs),
                body: json!({
                    "error": "Rate limit exceeded",
                    "resetAt": reset_at.to_rfc3339(),
                }),
            },
            Err(TurnError::EmptyMessage) => Self {
                status: 400,
                retry_after: None,
                body: json!({ "error": "Message is required" }),
            },
            Err(TurnError::Completion(_)) => Self {
                status: 500,
                retry_after: None,
                body: json!({
                    "error": "Failed to process chat message",
                    "message": USER_SAFE_FAILURE,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:01:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_success_body_shape() {
        let reply = ChatReply {
            message: "Hello!".to_string(),
            tool_calls: vec!["search_knowledge_base".to_string()],
            rate_limit: RateLimitStatus {
                remaining: 19,
                reset_at: reset(),
            },
            degraded: false,
        };
        let response = ChatEndpointResponse::from_result(&Ok(reply));
        assert_eq!(response.status, 200);
        assert_eq!(response.body["message"], "Hello!");
        assert_eq!(response.body["toolCalls"][0], "search_knowledge_base");
        assert_eq!(response.body["rateLimit"]["remaining"], 19);
        assert!(response.body["rateLimit"]["resetAt"].is_string());
        assert!(response.body.get("degraded").is_none());
    }

    #[test]
    fn test_tool_calls_omitted_when_empty() {
        let reply = ChatReply {
            message: "Hi".to_string(),
            tool_calls: Vec::new(),
            rate_limit: RateLimitStatus {
                remaining: 1,
                reset_at: reset(),
            },
            degraded: true,
        };
        let body = ChatEndpointResponse::from_result(&Ok(reply)).body;
        assert!(body.get("toolCalls").is_none());
        assert_eq!(body["degraded"], true);
    }

    #[test]
    fn test_error_shapes() {
        let limited = ChatEndpointResponse::from_result(&Err(TurnError::RateLimited {
            reset_at: reset(),
            retry_after_secs: 42,
        }));
        assert_eq!(limited.status, 429);
        assert_eq!(limited.retry_after, Some(42));
        assert_eq!(limited.body["error"], "Rate limit exceeded");

        let empty = ChatEndpointResponse::from_result(&Err(TurnError::EmptyMessage));
        assert_eq!(empty.status, 400);
        assert_eq!(empty.body["error"], "Message is required");

        let failed = ChatEndpointResponse::from_result(&Err(TurnError::Completion(
            ConciergeError::Llm("secret upstream detail".to_string()),
        )));
        assert_eq!(failed.status, 500);
        assert!(!failed.body.to_string().contains("secret upstream detail"));
    }
}
