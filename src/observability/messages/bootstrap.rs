// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the single-threaded runtime bootstrap.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// One bootstrap stage finished.
///
/// # Log Level
/// `debug!` - Lifecycle detail
///
/// # Example
/// ```
/// use xlean_bridge::observability::messages::bootstrap::StageCompleted;
///
/// let msg = StageCompleted { stage: "runtime globals" };
/// assert_eq!(msg.to_string(), "Bootstrap stage complete: runtime globals");
/// ```
pub struct StageCompleted<'a> {
    pub stage: &'a str,
}

impl Display for StageCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Bootstrap stage complete: {}", self.stage)
    }
}

impl StructuredLog for StageCompleted<'_> {
    fn log(&self) {
        tracing::debug!(stage = self.stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("bootstrap_stage", span_name = name, stage = self.stage)
    }
}

/// One evaluator module initialised.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct ModuleInitialized<'a> {
    pub module: &'a str,
    pub position: usize,
    pub total: usize,
}

impl Display for ModuleInitialized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Initialized evaluator module {} ({}/{})",
            self.module, self.position, self.total
        )
    }
}

impl StructuredLog for ModuleInitialized<'_> {
    fn log(&self) {
        tracing::debug!(
            module = self.module,
            position = self.position,
            total = self.total,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("module_init", span_name = name, module = self.module)
    }
}

/// Bootstrap finished; the session is ready for requests.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BootstrapReady {
    pub module_count: usize,
}

impl Display for BootstrapReady {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Runtime ready: {} evaluator modules initialized, session created",
            self.module_count
        )
    }
}

impl StructuredLog for BootstrapReady {
    fn log(&self) {
        tracing::info!(module_count = self.module_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "bootstrap",
            span_name = name,
            module_count = self.module_count,
        )
    }
}

/// Bootstrap aborted.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct BootstrapFailed<'a> {
    pub stage: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for BootstrapFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Bootstrap aborted at {}: {}", self.stage, self.error)
    }
}

impl StructuredLog for BootstrapFailed<'_> {
    fn log(&self) {
        tracing::error!(stage = self.stage, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "bootstrap_failed",
            span_name = name,
            stage = self.stage,
            error = %self.error,
        )
    }
}
