//! Minimal MCP filesystem server for integration tests: speaks the same
//! newline-delimited JSON-RPC 2.0 stdio protocol as `engine::mcp::McpClient`
//! expects (initialize → notifications/initialized → tools/list, then
//! tools/call), backed by real file reads/writes under the current
//! directory (the client spawns it with `current_dir` set to the test
//! workspace).

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

fn main() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) if !l.trim().is_empty() => l,
            Ok(_) => continue,
            Err(_) => break,
        };

        let request: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(_) => continue,
        };

        let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
        let id = request.get("id").cloned();

        // Notifications (no "id") get no reply.
        let Some(id) = id else { continue };

        let response = match method {
            "initialize" => ok_response(id, json!({ "protocolVersion": "2025-06-18", "serverInfo": { "name": "fake-fs", "version": "0.0.0" } })),
            "tools/list" => ok_response(id, json!({ "tools": [{ "name": "write_file" }, { "name": "read_file" }] })),
            "tools/call" => handle_tool_call(id, request.get("params").cloned().unwrap_or(Value::Null)),
            other => error_response(id, -32601, &format!("method not found: {other}")),
        };

        let text = serde_json::to_string(&response).expect("response always serializes");
        let _ = writeln!(stdout, "{text}");
        let _ = stdout.flush();
    }
}

fn handle_tool_call(id: Value, params: Value) -> Value {
    let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
    let args = params.get("arguments").cloned().unwrap_or(Value::Null);

    match name {
        "write_file" => {
            let path = args.get("path").and_then(Value::as_str).unwrap_or_default();
            let content = args.get("content").and_then(Value::as_str).unwrap_or_default();
            if let Some(parent) = std::path::Path::new(path).parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return error_response(id, -32000, &e.to_string());
                }
            }
            match std::fs::write(path, content) {
                Ok(()) => ok_response(id, json!({ "content": null })),
                Err(e) => error_response(id, -32000, &e.to_string()),
            }
        }
        "read_file" => {
            let path = args.get("path").and_then(Value::as_str).unwrap_or_default();
            match std::fs::read_to_string(path) {
                Ok(content) => ok_response(id, json!({ "content": content })),
                Err(e) => error_response(id, -32000, &e.to_string()),
            }
        }
        other => error_response(id, -32601, &format!("unknown tool: {other}")),
    }
}

fn ok_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}
