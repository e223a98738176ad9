// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Evaluation-side machinery shared by both topologies.
//!
//! * `format` - output formatting policy
//! * `reply` - turning a rendered payload into publications and a reply
//! * `foreground` - the native poll / evaluate / reply loop

pub mod foreground;
pub mod format;
pub mod reply;

pub use foreground::{ForegroundLoop, LoopState};
pub use reply::PendingReply;
