//! Chat turn orchestration
//!
//! A turn moves through a fixed sequence of states. Every transition
//! consumes the previous state, so a follow-up completion can only be built
//! from a `ToolsExecuted` value and tool results can only exist once every
//! requested call has finished.
//!
//! ```text
//! Admitted -> Grounded -> Answered ------------------------------> Done
//!                      \-> ToolsRequested -> ToolsExecuted -> Done
//! ```
//!
//! Only admission (rate limit, empty message) and the first completion can
//! fail a turn. Grounding is best-effort, tool failures become tool result
//! text and a failed follow-up falls back to a degraded answer.

mod prompt;
mod response;

pub use prompt::{assemble_conversation, build_system_prompt};
pub use response::{
    ChatEndpointResponse, ChatReply, ChatRequest, RateLimitStatus, TurnError, USER_SAFE_FAILURE,
};

use crate::config::{AssistantConfig, RateLimitConfig};
use crate::error::{ConciergeError, Result};
use crate::llm::{ChatModel, Message, ToolCall, ToolChoice};
use crate::ratelimit::{RateLimitDecision, RateLimitStore};
use crate::search::SemanticSearchService;
use crate::tools::ToolRegistry;
use chrono::Utc;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Final answer used when the follow-up fails and the first completion had no text
pub const DEGRADED_NOTICE: &str = "Sorry, I couldn't finish putting that answer together. \
     Please try asking again, or leave your contact details and the team will follow up.";

/// Run `future` under its own deadline
async fn with_deadline<T, F>(operation: &'static str, limit: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(ConciergeError::Timeout(operation, limit)),
    }
}

/// Drives a single chat turn from admission to reply
///
/// Holds no per-conversation state. Concurrent turns share only the rate
/// limiter; dropping the future returned by [`ChatOrchestrator::handle`]
/// cancels every in-flight sub-call of that turn.
#[derive(Clone)]
pub struct ChatOrchestrator {
    model: Arc<dyn ChatModel>,
    rate_limiter: Arc<dyn RateLimitStore>,
    search: Option<SemanticSearchService>,
    tools: ToolRegistry,
    rate_limit: RateLimitConfig,
    assistant: AssistantConfig,
}

impl ChatOrchestrator {
    pub fn new(model: Arc<dyn ChatModel>, rate_limiter: Arc<dyn RateLimitStore>) -> Self {
        Self {
            model,
            rate_limiter,
            search: None,
            tools: ToolRegistry::new(),
            rate_limit: RateLimitConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }

    /// Enable knowledge-base grounding of the system prompt
    pub fn with_search(mut self, search: SemanticSearchService) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    pub fn with_assistant(mut self, config: AssistantConfig) -> Self {
        self.assistant = config;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Current budget for `key` without spending a request
    pub fn rate_limit_status(&self, key: &str) -> RateLimitDecision {
        self.rate_limiter
            .peek(key, self.rate_limit.max_requests, self.rate_limit.window())
    }

    /// Forget rate-limit windows that have already closed
    pub fn evict_expired_rate_limits(&self) -> usize {
        let removed = self.rate_limiter.sweep_expired();
        if removed > 0 {
            tracing::debug!("Evicted {} expired rate-limit entries", removed);
        }
        removed
    }

    /// Handle one chat turn for the caller identified by `key`
    pub async fn handle(
        &self,
        key: &str,
        request: ChatRequest,
    ) -> std::result::Result<ChatReply, TurnError> {
        let admitted = self.admit(key, request)?;
        let grounded = admitted.ground(self).await;

        let done = match grounded.complete(self).await? {
            FirstCompletion::Answered(done) => done,
            FirstCompletion::ToolsRequested(pending) => {
                pending.execute(self).await.follow_up(self).await
            }
        };

        tracing::info!(
            "Chat turn for {} completed (tools: {:?}, degraded: {}, remaining: {})",
            key,
            done.tool_names,
            done.degraded,
            done.rate_limit.remaining
        );
        Ok(done.into_reply())
    }

    /// Handle a turn and render it for an HTTP-style transport
    pub async fn respond(&self, key: &str, request: ChatRequest) -> ChatEndpointResponse {
        ChatEndpointResponse::from_result(&self.handle(key, request).await)
    }

    fn admit(&self, key: &str, request: ChatRequest) -> std::result::Result<Admitted, TurnError> {
        let decision = self.rate_limiter.check(
            key,
            self.rate_limit.max_requests,
            self.rate_limit.window(),
        );

        if !decision.allowed {
            tracing::warn!("Rate limit exceeded for {}", key);
            return Err(TurnError::RateLimited {
                reset_at: decision.reset_at,
                retry_after_secs: decision.retry_after_secs(Utc::now()),
            });
        }

        if request.message.trim().is_empty() {
            return Err(TurnError::EmptyMessage);
        }

        Ok(Admitted {
            message: request.message,
            history: request.history,
            rate_limit: decision,
        })
    }
}

struct Admitted {
    message: String,
    history: Vec<Message>,
    rate_limit: RateLimitDecision,
}

struct Grounded {
    conversation: Vec<Message>,
    rate_limit: RateLimitDecision,
}

enum FirstCompletion {
    Answered(Done),
    ToolsRequested(PendingTools),
}

struct PendingTools {
    conversation: Vec<Message>,
    first_content: String,
    calls: Vec<ToolCall>,
    rate_limit: RateLimitDecision,
}

struct ToolsExecuted {
    conversation: Vec<Message>,
    first_content: String,
    tool_names: Vec<String>,
    rate_limit: RateLimitDecision,
}

struct Done {
    message: String,
    tool_names: Vec<String>,
    rate_limit: RateLimitDecision,
    degraded: bool,
}

impl Admitted {
    async fn ground(self, orchestrator: &ChatOrchestrator) -> Grounded {
        let assistant = &orchestrator.assistant;

        let grounding = match &orchestrator.search {
            Some(search) if assistant.grounding_limit > 0 => {
                let lookup = search.search(&self.message, assistant.grounding_limit);
                match with_deadline("knowledge grounding", assistant.embedding_timeout(), lookup)
                    .await
                {
                    Ok(entries) => entries,
                    Err(e) => {
                        tracing::warn!("Grounding search failed, answering without context: {}", e);
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };

        tracing::debug!("Grounding with {} knowledge entries", grounding.len());

        let system = build_system_prompt(assistant, &grounding);
        Grounded {
            conversation: assemble_conversation(system, self.history, &self.message),
            rate_limit: self.rate_limit,
        }
    }
}

impl Grounded {
    async fn complete(
        self,
        orchestrator: &ChatOrchestrator,
    ) -> std::result::Result<FirstCompletion, TurnError> {
        let request = orchestrator.model.complete(
            &self.conversation,
            orchestrator.tools.definitions(),
            ToolChoice::Auto,
        );
        let completion = with_deadline(
            "chat completion",
            orchestrator.assistant.completion_timeout(),
            request,
        )
        .await
        .map_err(|e| {
            tracing::error!(
                "First completion from {} failed: {}",
                orchestrator.model.model_name(),
                e
            );
            TurnError::Completion(e)
        })?;

        if completion.tool_calls.is_empty() {
            let Some(message) = completion.content else {
                tracing::error!("First completion returned neither content nor tool calls");
                return Err(TurnError::Completion(ConciergeError::Completion(
                    "assistant message has no content".to_string(),
                )));
            };
            return Ok(FirstCompletion::Answered(Done {
                message,
                tool_names: Vec::new(),
                rate_limit: self.rate_limit,
                degraded: false,
            }));
        }

        Ok(FirstCompletion::ToolsRequested(PendingTools {
            conversation: self.conversation,
            first_content: completion.content.unwrap_or_default(),
            calls: completion.tool_calls,
            rate_limit: self.rate_limit,
        }))
    }
}

impl PendingTools {
    /// Dispatch every call concurrently and wait for all of them
    async fn execute(self, orchestrator: &ChatOrchestrator) -> ToolsExecuted {
        let limit = orchestrator.assistant.tool_timeout();

        let results = join_all(self.calls.iter().map(|call| async move {
            let dispatch = orchestrator.tools.dispatch(call.name(), call.arguments());
            let text = match with_deadline("tool call", limit, dispatch).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Tool call {} ({}) failed: {}", call.id, call.name(), e);
                    format!("Error executing {}: {}", call.name(), e)
                }
            };
            Message::tool(call.id.clone(), text)
        }))
        .await;

        let tool_names = self.calls.iter().map(|c| c.name().to_string()).collect();

        let mut conversation = self.conversation;
        conversation.reserve(results.len() + 1);
        conversation.push(Message::assistant_with_tools(
            self.first_content.clone(),
            self.calls,
        ));
        conversation.extend(results);

        ToolsExecuted {
            conversation,
            first_content: self.first_content,
            tool_names,
            rate_limit: self.rate_limit,
        }
    }
}

impl ToolsExecuted {
    async fn follow_up(self, orchestrator: &ChatOrchestrator) -> Done {
        let request = orchestrator.model.complete(
            &self.conversation,
            orchestrator.tools.definitions(),
            ToolChoice::None,
        );
        let answer = match with_deadline(
            "follow-up completion",
            orchestrator.assistant.completion_timeout(),
            request,
        )
        .await
        {
            Ok(completion) => completion.content.filter(|text| !text.trim().is_empty()),
            Err(e) => {
                tracing::warn!(
                    "Follow-up completion from {} failed: {}",
                    orchestrator.model.model_name(),
                    e
                );
                None
            }
        };

        let (message, degraded) = match answer {
            Some(text) => (text, false),
            None if !self.first_content.trim().is_empty() => (self.first_content, true),
            None => (DEGRADED_NOTICE.to_string(), true),
        };

        Done {
            message,
            tool_names: self.tool_names,
            rate_limit: self.rate_limit,
            degraded,
        }
    }
}

impl Done {
    fn into_reply(self) -> ChatReply {
        ChatReply {
            message: self.message,
            tool_calls: self.tool_names,
            rate_limit: self.rate_limit.into(),
            degraded: self.degraded,
        }
    }
}
