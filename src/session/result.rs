// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::format::render_reply;
use crate::session::state::EnvId;
use serde::{Deserialize, Serialize};

/// Message severity as reported by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Source position attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// One evaluator message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub severity: Severity,
    #[serde(rename = "data", default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Position>,
    #[serde(rename = "endPos", default, skip_serializing_if = "Option::is_none")]
    pub end_pos: Option<Position>,
}

impl Message {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
            pos: None,
            end_pos: None,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }
}

/// Successful evaluation: the new environment plus whatever the command printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub env: EnvId,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub goals: Vec<String>,
}

impl CommandOutput {
    /// Reply payload under the output formatting policy.
    pub fn render(&self) -> String {
        render_reply(&self.messages, self)
    }
}

/// Failed evaluation. Never carries an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandFailure {
    pub messages: Vec<Message>,
}

impl CommandFailure {
    /// Failure described by a single error message.
    pub fn from_error(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::error(text)],
        }
    }

    /// Reply payload under the output formatting policy.
    pub fn render(&self) -> String {
        render_reply(&self.messages, self)
    }
}
