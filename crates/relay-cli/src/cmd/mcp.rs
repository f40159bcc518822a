use relay_core::dispatch::Dispatcher;
use relay_core::types::ResultEnvelope;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::io::{BufRead, Write};
use std::path::Path;

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct ToolContent {
    r#type: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
struct ToolCallResult {
    content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    is_error: bool,
}

// ---------------------------------------------------------------------------
// Server loop
// ---------------------------------------------------------------------------

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let dispatcher = super::load_dispatcher(config_path)?;
    let rt = tokio::runtime::Runtime::new()?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    tracing::info!(tools = dispatcher.descriptors().len(), "mcp server ready");

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let raw: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                write_response(&stdout, &JsonRpcResponse::err(None, -32700, format!("parse error: {e}")))?;
                continue;
            }
        };

        // Notifications have no "id" key: do not respond
        if !raw.as_object().is_some_and(|o| o.contains_key("id")) {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                write_response(&stdout, &JsonRpcResponse::err(None, -32600, format!("invalid request: {e}")))?;
                continue;
            }
        };

        let response = rt.block_on(handle_request(&request, &dispatcher));
        write_response(&stdout, &response)?;
    }

    Ok(())
}

fn write_response(stdout: &std::io::Stdout, response: &JsonRpcResponse) -> anyhow::Result<()> {
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Request dispatch (pub for unit tests)
// ---------------------------------------------------------------------------

pub async fn handle_request(req: &JsonRpcRequest, dispatcher: &Dispatcher) -> JsonRpcResponse {
    match req.method.as_str() {
        "initialize" => JsonRpcResponse::ok(
            req.id.clone(),
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "relay",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),

        "tools/list" => {
            let tool_list: Vec<Value> = dispatcher
                .descriptors()
                .iter()
                .map(|d| {
                    json!({
                        "name": d.tool_name(),
                        "description": d.description,
                        "inputSchema": d.input_schema()
                    })
                })
                .collect();
            JsonRpcResponse::ok(req.id.clone(), json!({ "tools": tool_list }))
        }

        "tools/call" => {
            let Some(params) = &req.params else {
                return JsonRpcResponse::err(req.id.clone(), -32602, "missing params");
            };
            let Some(tool_name) = params["name"].as_str() else {
                return JsonRpcResponse::err(req.id.clone(), -32602, "missing tool name in params");
            };
            let arguments = match params.get("arguments") {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(m)) => m.clone(),
                Some(_) => {
                    return JsonRpcResponse::err(req.id.clone(), -32602, "arguments must be an object");
                }
            };

            let Some(command) = dispatcher.command_for_tool(tool_name, &arguments) else {
                return JsonRpcResponse::err(req.id.clone(), -32601, format!("tool not found: {tool_name}"));
            };

            let envelope = dispatcher.dispatch(&command).await;
            let call_result = ToolCallResult {
                content: vec![ToolContent {
                    r#type: "text",
                    text: envelope_text(&envelope),
                }],
                is_error: !envelope.success,
            };
            JsonRpcResponse::ok(
                req.id.clone(),
                serde_json::to_value(&call_result).unwrap_or_else(|e| json!({"error": e.to_string()})),
            )
        }

        other => JsonRpcResponse::err(req.id.clone(), -32601, format!("method not found: {other}")),
    }
}

fn envelope_text(envelope: &ResultEnvelope) -> String {
    serde_json::to_string_pretty(envelope).unwrap_or_else(|e| format!("serialization error: {e}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
