// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reply constructors for the Jupyter messaging protocol.

use serde_json::{json, Value};

use crate::config::consts::PROTOCOL_VERSION;
use crate::config::KernelInfoConfig;

/// `execute_reply` content for a successful execution.
pub fn create_successful_reply() -> Value {
    json!({
        "status": "ok",
        "payload": [],
        "user_expressions": {},
    })
}

/// `execute_reply` content for a failed execution.
pub fn create_error_reply(evalue: &str, ename: &str, traceback: Vec<String>) -> Value {
    json!({
        "status": "error",
        "ename": ename,
        "evalue": evalue,
        "traceback": traceback,
    })
}

/// `complete_reply` content.
pub fn create_complete_reply(matches: Vec<String>, cursor_start: usize, cursor_end: usize) -> Value {
    json!({
        "status": "ok",
        "matches": matches,
        "cursor_start": cursor_start,
        "cursor_end": cursor_end,
        "metadata": {},
    })
}

/// `inspect_reply` content. `found = false` carries no data.
pub fn create_inspect_reply(found: bool) -> Value {
    json!({
        "status": "ok",
        "found": found,
        "data": {},
        "metadata": {},
    })
}

/// `is_complete_reply` content.
pub fn create_is_complete_reply(status: &str, indent: &str) -> Value {
    let mut reply = json!({ "status": status });
    if status == "incomplete" {
        reply["indent"] = Value::String(indent.to_string());
    }
    reply
}

/// `kernel_info_reply` content.
pub fn create_info_reply(info: &KernelInfoConfig) -> Value {
    json!({
        "status": "ok",
        "protocol_version": PROTOCOL_VERSION,
        "implementation": info.implementation,
        "implementation_version": info.implementation_version,
        "language_info": {
            "name": info.language_name,
            "version": info.language_version,
            "mimetype": info.mimetype,
            "file_extension": info.file_extension,
            "pygments_lexer": info.pygments_lexer,
            "codemirror_mode": info.codemirror_mode,
            "nbconvert_exporter": info.nbconvert_exporter,
        },
        "banner": info.banner,
        "debugger": false,
        "help_links": info.help_links,
    })
}
