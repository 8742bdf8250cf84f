//! Stdio JSON-RPC server

use crate::protocol::*;
use anyhow::Result;
use concierge_core::{ChatOrchestrator, OpenAiCompatClient};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

/// Rate-limit key used when a request does not name one
pub const DEFAULT_CLIENT_KEY: &str = "stdio";

/// How often closed rate-limit windows are evicted while serving
pub const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

pub struct ChatServer {
    orchestrator: ChatOrchestrator,
    llm: Option<Arc<OpenAiCompatClient>>,
}

impl ChatServer {
    pub fn new(orchestrator: ChatOrchestrator) -> Self {
        Self {
            orchestrator,
            llm: None,
        }
    }

    /// Report this client's request metrics from the `stats` method
    pub fn with_llm_metrics(mut self, client: Arc<OpenAiCompatClient>) -> Self {
        self.llm = Some(client);
        self
    }

    /// Serve stdin/stdout until stdin closes
    pub async fn run(&self) -> Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = BufWriter::new(tokio::io::stdout());
        self.serve(reader, writer).await
    }

    /// Serve any line-oriented stream pair until the reader hits EOF
    ///
    /// Requests run concurrently, so a slow chat turn does not hold up the
    /// lines behind it. Responses are written as they finish and are matched
    /// to requests by id. Pending requests are drained after EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, JsonRpcResponse>> =
            FuturesUnordered::new();
        let mut reading = true;
        let mut eviction = tokio::time::interval_at(
            tokio::time::Instant::now() + EVICTION_INTERVAL,
            EVICTION_INTERVAL,
        );
        eviction.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                    write_response(&mut writer, &response).await?;
                }
                line = lines.next_line(), if reading => {
                    let Some(line) = line? else {
                        reading = false;
                        continue;
                    };

                    match parse_line(&line) {
                        Incoming::Skip => {}
                        Incoming::Invalid(response) => {
                            write_response(&mut writer, &response).await?;
                        }
                        Incoming::Call(request) => {
                            in_flight.push(self.handle_owned(request).boxed_local());
                        }
                    }
                }
                _ = eviction.tick(), if reading => {
                    self.orchestrator.evict_expired_rate_limits();
                }
                else => break,
            }
        }

        Ok(())
    }

    async fn handle_owned(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.handle_request(&request).await
    }

    pub async fn handle_request(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!("Handling {}", request.method);
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "chat" => self.handle_chat(request).await,
            "tools/list" => self.handle_tools_list(request),
            "rate_limit/peek" => self.handle_peek(request),
            "stats" => self.handle_stats(request),
            _ => JsonRpcResponse::error(
                request.id.clone(),
                codes::METHOD_NOT_FOUND,
                &format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let result = serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "chat": {},
                "tools": { "listChanged": false },
                "rateLimit": {},
                "stats": {}
            },
            "serverInfo": {
                "name": "concierge",
                "version": env!("CARGO_PKG_VERSION")
            }
        });
        JsonRpcResponse::success(request.id.clone(), result)
    }

    async fn handle_chat(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let params: ChatParams = match parse_params(request) {
            Ok(p) => p,
            Err(response) => return response,
        };
        let key = params.key.as_deref().unwrap_or(DEFAULT_CLIENT_KEY);

        let response = self.orchestrator.respond(key, params.request).await;
        to_success(request, &response)
    }

    fn handle_tools_list(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let tools: Vec<ToolDescriptor> = self
            .orchestrator
            .tools()
            .definitions()
            .iter()
            .map(ToolDescriptor::from)
            .collect();

        JsonRpcResponse::success(request.id.clone(), serde_json::json!({ "tools": tools }))
    }

    fn handle_peek(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let params: PeekParams = match parse_params(request) {
            Ok(p) => p,
            Err(response) => return response,
        };
        let key = params.key.as_deref().unwrap_or(DEFAULT_CLIENT_KEY);
        to_success(request, &self.orchestrator.rate_limit_status(key))
    }

    fn handle_stats(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let llm = self.llm.as_ref().map(|client| client.metrics());
        to_success(request, &serde_json::json!({ "llm": llm }))
    }
}

enum Incoming {
    Skip,
    Invalid(JsonRpcResponse),
    Call(JsonRpcRequest),
}

fn parse_line(line: &str) -> Incoming {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Incoming::Skip;
    }

    match serde_json::from_str::<JsonRpcRequest>(trimmed) {
        Ok(request) if request.is_notification() => {
            tracing::debug!("Ignoring notification {}", request.method);
            Incoming::Skip
        }
        Ok(request) => Incoming::Call(request),
        Err(e) => Incoming::Invalid(JsonRpcResponse::error(
            None,
            codes::PARSE_ERROR,
            &format!("Parse error: {}", e),
        )),
    }
}

/// Decode `params`, treating a missing value as an empty object
fn parse_params<T: DeserializeOwned>(
    request: &JsonRpcRequest,
) -> std::result::Result<T, JsonRpcResponse> {
    let params = match &request.params {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(params).map_err(|e| {
        JsonRpcResponse::error(
            request.id.clone(),
            codes::INVALID_PARAMS,
            &format!("Invalid params: {}", e),
        )
    })
}

fn to_success<T: serde::Serialize>(request: &JsonRpcRequest, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(request.id.clone(), value),
        Err(e) => JsonRpcResponse::error(
            request.id.clone(),
            codes::INTERNAL_ERROR,
            &format!("Serialization error: {}", e),
        ),
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<()> {
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

pub async fn start_server(server: ChatServer) -> Result<()> {
    tracing::info!("Concierge server listening on stdio");
    server.run().await?;

    if let Some(client) = &server.llm {
        tracing::info!("LLM usage at shutdown: {:?}", client.metrics());
    }
    Ok(())
}
