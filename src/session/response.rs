// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Decoding of evaluator responses.
//!
//! Both topologies receive the same JSON from the evaluator:
//!
//! ```text
//! {"env": 2, "messages": [{"severity": "info", "data": "43", "pos": {...}}], "sorries": [{"goal": "⊢ p"}]}
//! {"message": "Unknown environment."}
//! ```
//!
//! A response is a failure when the evaluator rejected the command outright
//! (`message` / `error`), when any message has error severity, or when it
//! cannot be read at all. Only successes carry an environment forward.

use crate::session::result::{CommandFailure, CommandOutput, Message, Severity};
use crate::session::state::EnvId;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawResponse {
    env: Option<EnvId>,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    sorries: Vec<RawSorry>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSorry {
    #[serde(default)]
    goal: Option<String>,
}

/// Decode one raw evaluator response.
pub fn decode_response(raw: &str) -> Result<CommandOutput, CommandFailure> {
    let response: RawResponse = serde_json::from_str(raw).map_err(|e| {
        CommandFailure::from_error(format!("Malformed evaluator response ({e}): {raw}"))
    })?;

    if let Some(reason) = response.error.or(response.message) {
        return Err(CommandFailure::from_error(reason));
    }

    if response
        .messages
        .iter()
        .any(|m| m.severity == Severity::Error)
    {
        return Err(CommandFailure {
            messages: response.messages,
        });
    }

    let env = response.env.ok_or_else(|| {
        CommandFailure::from_error(format!("Evaluator response carried no environment: {raw}"))
    })?;

    let goals = response
        .sorries
        .into_iter()
        .filter_map(|sorry| sorry.goal)
        .collect();

    Ok(CommandOutput {
        env,
        messages: response.messages,
        goals,
    })
}
