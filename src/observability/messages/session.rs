// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for evaluations and the foreground loop.

use crate::observability::messages::StructuredLog;
use crate::session::EnvId;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Evaluation of one cell started.
///
/// # Log Level
/// `debug!` - Per-request detail
///
/// # Example
/// ```
/// use xlean_bridge::observability::messages::session::EvaluationStarted;
/// use xlean_bridge::session::EnvId;
///
/// let msg = EvaluationStarted {
///     execution_count: 2,
///     prior_env: Some(EnvId(1)),
///     code_len: 10,
/// };
///
/// assert_eq!(msg.to_string(), "Evaluating execution 2 (10 bytes) against env 1");
/// ```
pub struct EvaluationStarted {
    pub execution_count: u32,
    pub prior_env: Option<EnvId>,
    pub code_len: usize,
}

impl Display for EvaluationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.prior_env {
            Some(env) => write!(
                f,
                "Evaluating execution {} ({} bytes) against env {}",
                self.execution_count, self.code_len, env
            ),
            None => write!(
                f,
                "Evaluating execution {} ({} bytes) in a fresh env",
                self.execution_count, self.code_len
            ),
        }
    }
}

impl StructuredLog for EvaluationStarted {
    fn log(&self) {
        tracing::debug!(
            execution_count = self.execution_count,
            prior_env = ?self.prior_env,
            code_len = self.code_len,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "evaluation",
            span_name = name,
            execution_count = self.execution_count,
            prior_env = ?self.prior_env,
        )
    }
}

/// Evaluation succeeded and produced a new environment.
///
/// # Log Level
/// `debug!` - Per-request detail
pub struct EvaluationCompleted {
    pub execution_count: u32,
    pub env: EnvId,
    pub message_count: usize,
    pub duration: Duration,
}

impl Display for EvaluationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Execution {} produced env {} with {} messages in {:?}",
            self.execution_count, self.env, self.message_count, self.duration
        )
    }
}

impl StructuredLog for EvaluationCompleted {
    fn log(&self) {
        tracing::debug!(
            execution_count = self.execution_count,
            env = self.env.0,
            message_count = self.message_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "evaluation_completed",
            span_name = name,
            execution_count = self.execution_count,
            env = self.env.0,
        )
    }
}

/// Evaluation failed; the environment is unchanged.
///
/// # Log Level
/// `debug!` - A failed cell is user data, not a bridge fault
pub struct EvaluationFailed {
    pub execution_count: u32,
    pub message_count: usize,
    pub duration: Duration,
}

impl Display for EvaluationFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Execution {} failed with {} messages in {:?}",
            self.execution_count, self.message_count, self.duration
        )
    }
}

impl StructuredLog for EvaluationFailed {
    fn log(&self) {
        tracing::debug!(
            execution_count = self.execution_count,
            message_count = self.message_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "evaluation_failed",
            span_name = name,
            execution_count = self.execution_count,
        )
    }
}

/// Foreground loop received a message it does not handle.
///
/// # Log Level
/// `warn!` - Unexpected input, loop continues
pub struct UnrecognizedRequest<'a> {
    pub kind: &'a str,
}

impl Display for UnrecognizedRequest<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Skipping unrecognized request: {}", self.kind)
    }
}

impl StructuredLog for UnrecognizedRequest<'_> {
    fn log(&self) {
        tracing::warn!(kind = self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("unrecognized_request", span_name = name, kind = self.kind)
    }
}

/// Foreground loop exited.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ForegroundStopped<'a> {
    pub reason: &'a str,
    pub evaluator: &'a str,
    pub evaluations: u64,
}

impl Display for ForegroundStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Foreground loop stopped ({}) after {} {} evaluations",
            self.reason, self.evaluations, self.evaluator
        )
    }
}

impl StructuredLog for ForegroundStopped<'_> {
    fn log(&self) {
        tracing::info!(
            reason = self.reason,
            evaluator = self.evaluator,
            evaluations = self.evaluations,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "foreground_stopped",
            span_name = name,
            reason = self.reason,
            evaluator = self.evaluator,
        )
    }
}

/// Evaluator process started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EvaluatorSpawned<'a> {
    pub command: &'a str,
    pub pid: u32,
}

impl Display for EvaluatorSpawned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Started evaluator '{}' (pid {})", self.command, self.pid)
    }
}

impl StructuredLog for EvaluatorSpawned<'_> {
    fn log(&self) {
        tracing::info!(command = self.command, pid = self.pid, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "evaluator",
            span_name = name,
            command = self.command,
            pid = self.pid,
        )
    }
}

/// Talking to the evaluator process failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct EvaluatorIoFailed<'a> {
    pub command: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for EvaluatorIoFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Lost contact with evaluator '{}': {}",
            self.command, self.error
        )
    }
}

impl StructuredLog for EvaluatorIoFailed<'_> {
    fn log(&self) {
        tracing::error!(command = self.command, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "evaluator_io_failed",
            span_name = name,
            command = self.command,
        )
    }
}
