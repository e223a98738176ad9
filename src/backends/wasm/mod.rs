// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Single-threaded (WASM) topology.
//!
//! There is one thread of control and no queue. The language runtime is
//! bootstrapped once, in a fixed order, and the interpreter calls the
//! evaluator directly on every execute request:
//!
//! ```text
//! pointer width check
//!   -> runtime module (scheduler with no workers)
//!   -> runtime globals
//!   -> evaluator modules, lowest level first
//!   -> end-of-initialization latch
//!   -> evaluator search path
//!   -> session
//! ```
//!
//! A failed step aborts construction; nothing partially bootstrapped is
//! ever handed out.

//!
//! On `wasm32` the runtime is the statically linked Lean build and the
//! browser host drives a [`WasmKernel`] through the entry points in `lean`.

pub mod bootstrap;
pub mod direct;
pub mod kernel;
#[cfg(target_arch = "wasm32")]
pub mod lean;
pub mod runtime;

pub use bootstrap::{Bootstrap, BootstrapStage, Bootstrapped};
pub use direct::DirectCallInterpreter;
pub use kernel::WasmKernel;
pub use runtime::LanguageRuntime;
