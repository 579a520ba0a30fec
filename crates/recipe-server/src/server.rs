use crate::config::ServerConfig;
use crate::methods::{self, MethodError};
use anyhow::Result;
use recipe_core::{DefinitionStore, RecipeService};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::timeout;

static RID: AtomicU64 = AtomicU64::new(1);

fn next_rid() -> String {
    let n = RID.fetch_add(1, Ordering::Relaxed);
    format!("r-{n:06}")
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Option<Value>,
    id: Option<Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MethodError>,
    id: Option<Value>,
}

impl JsonRpcResponse {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    fn error(id: Option<Value>, error: MethodError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

pub struct Server<S> {
    svc: RecipeService<S>,
    cfg: ServerConfig,
}

impl<S: DefinitionStore + Clone + 'static> Server<S> {
    pub fn new(svc: RecipeService<S>, cfg: ServerConfig) -> Self {
        Self { svc, cfg }
    }

    pub async fn run(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;
            if let Some(resp) = self.handle_line(&line).await {
                writeln!(stdout, "{}", resp)?;
                stdout.flush()?;
            }
        }

        tracing::info!(event = "server_stop");
        Ok(())
    }

    /// Handles one protocol line; `None` means nothing is written back.
    /// Requests without an `id` are notifications: they run but get no reply.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let rid = next_rid();

        if line.len() > self.cfg.max_msg_bytes {
            tracing::warn!(
                event = "limit_exceeded",
                rid = %rid,
                bytes_in = line.len(),
                max = self.cfg.max_msg_bytes
            );
            let resp = JsonRpcResponse::error(
                None,
                MethodError::app(
                    "E_LIMIT_EXCEEDED",
                    format!("message bytes={} > max={}", line.len(), self.cfg.max_msg_bytes),
                ),
            );
            return Some(encode(&resp));
        }

        if line.trim().is_empty() {
            return None;
        }

        let req: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(event = "json_parse_error", rid = %rid, error = %e);
                return None;
            }
        };

        let notification = req.id.is_none();
        let resp = match req.method.as_str() {
            "initialize" => JsonRpcResponse::ok(
                req.id,
                serde_json::json!({
                    "serverInfo": {
                        "name": "recipe-server",
                        "version": env!("CARGO_PKG_VERSION")
                    },
                    "methods": methods::list_methods()
                }),
            ),
            "methods/list" => JsonRpcResponse::ok(
                req.id,
                serde_json::json!({ "methods": methods::list_methods() }),
            ),
            name if methods::is_method(name) => {
                let params = req.params.unwrap_or(Value::Null);
                match self.call(&rid, name, params).await {
                    Ok(v) => JsonRpcResponse::ok(req.id, v),
                    Err(e) => JsonRpcResponse::error(req.id, e),
                }
            }
            other => JsonRpcResponse::error(
                req.id,
                MethodError::new(
                    methods::METHOD_NOT_FOUND,
                    format!("Method not found: {}", other),
                ),
            ),
        };

        if notification {
            tracing::debug!(event = "notification", rid = %rid, method = %req.method);
            return None;
        }
        Some(encode(&resp))
    }

    async fn call(&self, rid: &str, name: &str, params: Value) -> Result<Value, MethodError> {
        let start = std::time::Instant::now();
        tracing::info!(event = "call_start", rid = rid, method = name);

        let svc = self.svc.clone();
        let method = name.to_string();
        let task = tokio::task::spawn_blocking(move || methods::call(&svc, &method, params));

        let result = match timeout(Duration::from_millis(self.cfg.timeout_ms), task).await {
            Ok(Ok(res)) => res,
            Ok(Err(join_err)) => {
                tracing::error!(
                    event = "call_crash",
                    rid = rid,
                    method = name,
                    error = %join_err
                );
                Err(MethodError::app("E_INTERNAL", join_err.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    event = "call_timeout",
                    rid = rid,
                    method = name,
                    timeout_ms = self.cfg.timeout_ms
                );
                Err(MethodError::app(
                    "E_TIMEOUT",
                    format!("Request exceeded {}ms", self.cfg.timeout_ms),
                ))
            }
        };

        let dur = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::info!(
                event = "call_done",
                rid = rid,
                method = name,
                duration_ms = dur,
                outcome = "ok"
            ),
            Err(e) => tracing::info!(
                event = "call_done",
                rid = rid,
                method = name,
                duration_ms = dur,
                outcome = "error",
                code = e.code,
                message = %e.message
            ),
        }
        result
    }
}

fn encode(resp: &JsonRpcResponse) -> String {
    serde_json::to_string(resp).unwrap_or_else(|e| {
        serde_json::json!({
            "jsonrpc": "2.0",
            "error": { "code": -32603, "message": format!("encode failed: {e}") },
            "id": null
        })
        .to_string()
    })
}
