//! Wire types

use concierge_core::{ChatRequest, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard JSON-RPC error codes
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Any request without an id is a notification and gets no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }
}

/// Parameters of the `chat` method
#[derive(Debug, Deserialize)]
pub struct ChatParams {
    #[serde(flatten)]
    pub request: ChatRequest,
    /// Rate-limit key, usually the visitor's address
    #[serde(default)]
    pub key: Option<String>,
}

/// Parameters of the `rate_limit/peek` method
#[derive(Debug, Deserialize)]
pub struct PeekParams {
    #[serde(default)]
    pub key: Option<String>,
}

/// Tool as advertised by `tools/list`
#[derive(Debug, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl From<&ToolDefinition> for ToolDescriptor {
    fn from(definition: &ToolDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            description: definition.description.clone(),
            input_schema: definition.parameters.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_params_flatten() {
        let params: ChatParams = serde_json::from_value(json!({
            "message": "hi",
            "history": [{ "role": "assistant", "content": "hello" }],
            "key": "10.0.0.1"
        }))
        .unwrap();
        assert_eq!(params.request.message, "hi");
        assert_eq!(params.request.history.len(), 1);
        assert_eq!(params.key.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_notification_detection() {
        let note: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .unwrap();
        assert!(note.is_notification());

        let chat_without_id: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "chat",
            "params": { "message": "hi" }
        }))
        .unwrap();
        assert!(chat_without_id.is_notification());

        let call: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "notifications/initialized"
        }))
        .unwrap();
        assert!(!call.is_notification());
    }

    #[test]
    fn test_error_response_omits_result() {
        let response = JsonRpcResponse::error(Some(json!(1)), codes::METHOD_NOT_FOUND, "nope");
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32601);
    }
}
