// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Output formatting policy shared by both topologies.
//!
//! * no messages: empty payload (the cell shows nothing)
//! * only info messages: their text joined with newlines
//! * any warning or error: the whole structured result as compact JSON, so
//!   severity and positions reach the client intact
//!
//! # Examples
//!
//! ```rust
//! use xlean_bridge::engine::format::render_reply;
//! use xlean_bridge::session::{CommandOutput, EnvId, Message};
//!
//! let output = CommandOutput {
//!     env: EnvId(2),
//!     messages: vec![Message::info("43")],
//!     goals: vec![],
//! };
//!
//! assert_eq!(render_reply(&output.messages, &output), "43");
//! ```

use crate::session::{Message, Severity};
use serde::Serialize;

/// Render the reply payload for one evaluation.
///
/// Pure: the same input always renders to the same bytes.
pub fn render_reply<T: Serialize + ?Sized>(messages: &[Message], structured: &T) -> String {
    if messages.is_empty() {
        return String::new();
    }

    if messages.iter().all(|m| m.severity == Severity::Info) {
        return join_info(messages);
    }

    serde_json::to_string(structured).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize structured result, falling back to text");
        join_info(messages)
    })
}

fn join_info(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
