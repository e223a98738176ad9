// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the cross-thread request queue and pending replies.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Request pushed onto the queue by the protocol thread.
///
/// # Log Level
/// `debug!` - Per-request detail
///
/// # Example
/// ```
/// use xlean_bridge::observability::messages::queue::RequestEnqueued;
///
/// let msg = RequestEnqueued {
///     kind: "execute_request",
///     depth: 2,
/// };
///
/// assert_eq!(msg.to_string(), "Queued execute_request (queue depth 2)");
/// ```
pub struct RequestEnqueued<'a> {
    pub kind: &'a str,
    pub depth: usize,
}

impl Display for RequestEnqueued<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Queued {} (queue depth {})", self.kind, self.depth)
    }
}

impl StructuredLog for RequestEnqueued<'_> {
    fn log(&self) {
        tracing::debug!(kind = self.kind, depth = self.depth, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "request_enqueued",
            span_name = name,
            kind = self.kind,
            depth = self.depth,
        )
    }
}

/// Reply delivered for a pending execute request.
///
/// # Log Level
/// `debug!` - Per-request detail
pub struct ReplyDelivered<'a> {
    pub execution_count: u32,
    pub status: &'a str,
    pub still_pending: usize,
}

impl Display for ReplyDelivered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Delivered {} reply for execution {} ({} still pending)",
            self.status, self.execution_count, self.still_pending
        )
    }
}

impl StructuredLog for ReplyDelivered<'_> {
    fn log(&self) {
        tracing::debug!(
            execution_count = self.execution_count,
            status = self.status,
            still_pending = self.still_pending,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "reply_delivered",
            span_name = name,
            execution_count = self.execution_count,
            status = self.status,
        )
    }
}

/// A result arrived for an execution nothing is waiting on.
///
/// # Log Level
/// `warn!` - Dropped, no reply sent
pub struct UnmatchedReply {
    pub execution_count: u32,
}

impl Display for UnmatchedReply {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No pending request for execution {}; dropping result",
            self.execution_count
        )
    }
}

impl StructuredLog for UnmatchedReply {
    fn log(&self) {
        tracing::warn!(execution_count = self.execution_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "unmatched_reply",
            span_name = name,
            execution_count = self.execution_count,
        )
    }
}

/// Shutdown requested through the protocol.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ShutdownRequested {
    pub pending_replies: usize,
}

impl Display for ShutdownRequested {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Shutdown requested with {} replies pending",
            self.pending_replies
        )
    }
}

impl StructuredLog for ShutdownRequested {
    fn log(&self) {
        tracing::info!(pending_replies = self.pending_replies, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "shutdown_requested",
            span_name = name,
            pending_replies = self.pending_replies,
        )
    }
}

/// Pending replies released without an answer when the kernel is torn down.
///
/// # Log Level
/// `warn!` - Clients see these requests aborted
pub struct RepliesAbandoned {
    pub count: usize,
}

impl Display for RepliesAbandoned {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Abandoned {} unanswered execute requests", self.count)
    }
}

impl StructuredLog for RepliesAbandoned {
    fn log(&self) {
        tracing::warn!(count = self.count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("replies_abandoned", span_name = name, count = self.count)
    }
}
