// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Messages that cross the native message queue.
//!
//! The adapter enqueues them as JSON text and the foreground loop decodes
//! them again, so only bytes cross the thread boundary:
//!
//! ```text
//! {"msg_type":"execute_request","content":{"code":"#eval 1","execution_count":3}}
//! {"msg_type":"shutdown_request","content":{}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "msg_type", content = "content", rename_all = "snake_case")]
enum WireRequest {
    ExecuteRequest { code: String, execution_count: u32 },
    ShutdownRequest {},
}

/// A request taken off the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuedRequest {
    Execute { code: String, execution_count: u32 },
    Shutdown,
    /// Anything else, with whatever message type could be recovered.
    Unrecognized(String),
}

impl QueuedRequest {
    pub fn encode(&self) -> String {
        let wire = match self {
            QueuedRequest::Execute {
                code,
                execution_count,
            } => WireRequest::ExecuteRequest {
                code: code.clone(),
                execution_count: *execution_count,
            },
            QueuedRequest::Shutdown => WireRequest::ShutdownRequest {},
            QueuedRequest::Unrecognized(msg_type) => {
                return serde_json::json!({ "msg_type": msg_type, "content": {} }).to_string();
            }
        };
        serde_json::to_string(&wire).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<WireRequest>(raw) {
            Ok(WireRequest::ExecuteRequest {
                code,
                execution_count,
            }) => QueuedRequest::Execute {
                code,
                execution_count,
            },
            Ok(WireRequest::ShutdownRequest {}) => QueuedRequest::Shutdown,
            Err(_) => {
                let msg_type = serde_json::from_str::<Value>(raw)
                    .ok()
                    .and_then(|v| v.get("msg_type").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_else(|| "<malformed>".to_string());
                QueuedRequest::Unrecognized(msg_type)
            }
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            QueuedRequest::Execute { .. } => "execute_request",
            QueuedRequest::Shutdown => "shutdown_request",
            QueuedRequest::Unrecognized(msg_type) => msg_type,
        }
    }
}
