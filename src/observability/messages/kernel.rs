// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for kernel handle and transport events.
//!
//! This module contains message types for logging events related to:
//! * Kernel handle creation and finalization
//! * The background protocol thread
//! * Requests the transport could not route
//! * Calls crossing the foreign-function boundary

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Protocol thread spawned for a connection.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use xlean_bridge::observability::messages::kernel::ProtocolThreadStarted;
///
/// let msg = ProtocolThreadStarted {
///     connection_path: "/tmp/kernel-1.json",
///     transport: "stdio",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ProtocolThreadStarted<'a> {
    pub connection_path: &'a str,
    pub transport: &'a str,
}

impl Display for ProtocolThreadStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Protocol thread started for {} ({} transport)",
            self.connection_path, self.transport
        )
    }
}

impl StructuredLog for ProtocolThreadStarted<'_> {
    fn log(&self) {
        tracing::info!(
            connection_path = self.connection_path,
            transport = self.transport,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "protocol_thread",
            span_name = name,
            connection_path = self.connection_path,
            transport = self.transport,
        )
    }
}

/// Protocol thread's server loop returned.
///
/// # Log Level
/// `info!` on a clean exit, `error!` when the server reported a failure
pub struct ProtocolThreadStopped<'a> {
    pub error: Option<&'a dyn std::error::Error>,
}

impl Display for ProtocolThreadStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.error {
            Some(error) => write!(f, "Protocol thread stopped with error: {}", error),
            None => write!(f, "Protocol thread stopped"),
        }
    }
}

impl StructuredLog for ProtocolThreadStopped<'_> {
    fn log(&self) {
        match self.error {
            Some(error) => tracing::error!(error = %error, "{}", self),
            None => tracing::info!("{}", self),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "protocol_thread_stopped",
            span_name = name,
            failed = self.error.is_some(),
        )
    }
}

/// Kernel handle could not be created.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use xlean_bridge::observability::messages::kernel::KernelCreateFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
/// let msg = KernelCreateFailed {
///     connection_path: "/tmp/missing.json",
///     error: &error,
/// };
///
/// assert!(msg.to_string().contains("/tmp/missing.json"));
/// ```
pub struct KernelCreateFailed<'a> {
    pub connection_path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for KernelCreateFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to create kernel for '{}': {}",
            self.connection_path, self.error
        )
    }
}

impl StructuredLog for KernelCreateFailed<'_> {
    fn log(&self) {
        tracing::error!(
            connection_path = self.connection_path,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "kernel_create_failed",
            span_name = name,
            connection_path = self.connection_path,
            error = %self.error,
        )
    }
}

/// Kernel handle released by its owner.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct KernelFinalized {
    pub protocol_thread_joined: bool,
}

impl Display for KernelFinalized {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.protocol_thread_joined {
            write!(f, "Kernel handle finalized")
        } else {
            write!(f, "Kernel handle finalized; protocol thread had panicked")
        }
    }
}

impl StructuredLog for KernelFinalized {
    fn log(&self) {
        tracing::debug!(
            protocol_thread_joined = self.protocol_thread_joined,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "kernel_finalized",
            span_name = name,
            protocol_thread_joined = self.protocol_thread_joined,
        )
    }
}

/// Transport dropped a request it could not route.
///
/// # Log Level
/// `warn!` - Unexpected input, processing continues
pub struct RequestIgnored<'a> {
    pub msg_type: &'a str,
    pub reason: &'a str,
}

impl Display for RequestIgnored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Ignoring {} request: {}", self.msg_type, self.reason)
    }
}

impl StructuredLog for RequestIgnored<'_> {
    fn log(&self) {
        tracing::warn!(msg_type = self.msg_type, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "request_ignored",
            span_name = name,
            msg_type = self.msg_type,
        )
    }
}

/// Transport loop exited.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct TransportStopped<'a> {
    pub reason: &'a str,
}

impl Display for TransportStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Transport stopped: {}", self.reason)
    }
}

impl StructuredLog for TransportStopped<'_> {
    fn log(&self) {
        tracing::debug!(reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("transport_stopped", span_name = name, reason = self.reason)
    }
}

/// A foreign caller passed a null pointer where a value was required.
///
/// # Log Level
/// `warn!` - Contract violation by the host, safe default returned
pub struct NullArgument<'a> {
    pub entry_point: &'a str,
    pub argument: &'a str,
}

impl Display for NullArgument<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} called with null {}; returning default",
            self.entry_point, self.argument
        )
    }
}

impl StructuredLog for NullArgument<'_> {
    fn log(&self) {
        tracing::warn!(
            entry_point = self.entry_point,
            argument = self.argument,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "null_argument",
            span_name = name,
            entry_point = self.entry_point,
        )
    }
}

/// A panic was caught at the foreign-function boundary.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct PanicAtBoundary<'a> {
    pub entry_point: &'a str,
    pub detail: &'a str,
}

impl Display for PanicAtBoundary<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Panic caught in {}: {}; returning default",
            self.entry_point, self.detail
        )
    }
}

impl StructuredLog for PanicAtBoundary<'_> {
    fn log(&self) {
        tracing::error!(
            entry_point = self.entry_point,
            detail = self.detail,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "panic_at_boundary",
            span_name = name,
            entry_point = self.entry_point,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_stopped_mentions_error() {
        let error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let msg = ProtocolThreadStopped {
            error: Some(&error),
        };
        assert_eq!(msg.to_string(), "Protocol thread stopped with error: pipe closed");
        assert_eq!(
            ProtocolThreadStopped { error: None }.to_string(),
            "Protocol thread stopped"
        );
    }

    #[test]
    fn null_argument_names_entry_point() {
        let msg = NullArgument {
            entry_point: "xlean_kernel_poll",
            argument: "handle",
        };
        assert_eq!(
            msg.to_string(),
            "xlean_kernel_poll called with null handle; returning default"
        );
    }
}
