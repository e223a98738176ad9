// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Protocol-facing pieces of the bridge.
//!
//! * `replies` - reply constructors in the shape the protocol library expects
//! * `request` - messages that cross the native queue
//! * `stdio` - line-delimited JSON reference transport

pub mod replies;
pub mod request;
#[cfg(not(target_arch = "wasm32"))]
pub mod stdio;

pub use request::QueuedRequest;
#[cfg(not(target_arch = "wasm32"))]
pub use stdio::{StdioProtocolFactory, StdioServer};
