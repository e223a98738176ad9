// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic output of the bridge goes through message types defined
//! in [`messages`]. Each message is a small struct with a `Display`
//! implementation and a [`messages::StructuredLog`] implementation that
//! picks the log level and attaches the message's fields to the event.
//!
//! Logging is off by default: only errors reach stderr unless `XLEAN_DEBUG`
//! or `RUST_LOG` says otherwise (see [`logging::init_tracing`]). Output goes
//! to stderr because stdout may carry protocol traffic.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::kernel` - handle lifecycle, protocol thread, FFI crossings
//! * `messages::queue` - message queue and pending reply bookkeeping
//! * `messages::session` - evaluations and the foreground loop
//! * `messages::bootstrap` - single-threaded runtime bootstrap
//!
//! # Usage
//!
//! ```rust
//! use xlean_bridge::observability::messages::queue::RequestEnqueued;
//! use xlean_bridge::observability::messages::StructuredLog;
//!
//! RequestEnqueued {
//!     kind: "execute_request",
//!     depth: 1,
//! }
//! .log();
//! ```

pub mod logging;
pub mod messages;

pub use logging::init_tracing;
