// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] for the level and fields it is emitted with.
//!
//! # Organization
//!
//! * `kernel` - handle lifecycle, protocol thread, FFI crossings
//! * `queue` - message queue and pending reply bookkeeping
//! * `session` - evaluations and the foreground loop
//! * `bootstrap` - single-threaded runtime bootstrap
//!
//! # Usage Pattern
//!
//! ```rust
//! use xlean_bridge::observability::messages::session::EvaluationStarted;
//! use xlean_bridge::observability::messages::StructuredLog;
//!
//! let msg = EvaluationStarted {
//!     execution_count: 3,
//!     prior_env: None,
//!     code_len: 12,
//! };
//!
//! let span = msg.span("evaluation");
//! let _guard = span.enter();
//! msg.log();
//! ```

use tracing::Span;

pub mod bootstrap;
pub mod kernel;
pub mod queue;
pub mod session;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// A span carrying the message's fields, for grouping the events that follow.
    fn span(&self, name: &str) -> Span;
}
