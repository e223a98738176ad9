// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Native (two-thread) topology.
//!
//! ```text
//!  protocol thread                         foreground thread
//!  ---------------                         -----------------
//!  ProtocolServer::run                     ForegroundLoop::run
//!    QueueingInterpreter                     KernelHandle::poll
//!      execute_request --push--> MessageQueue --pop-->
//!                                            Evaluator::run_command
//!      reply callback <---- AdapterShared <-- send_result / send_error
//! ```
//!
//! The queue lock is the only shared mutable state besides the pending
//! reply list, and neither is held while the evaluator runs.

pub mod adapter;
pub mod ffi;
pub mod handle;
pub mod queue;

pub use adapter::{AdapterShared, QueueingInterpreter};
pub use handle::KernelHandle;
pub use queue::MessageQueue;
