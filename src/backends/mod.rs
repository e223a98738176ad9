// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bridge back ends for the two deployment topologies.
//!
//! ## Native
//! A protocol thread and a foreground thread joined by a message queue,
//! wrapped in a [`native::KernelHandle`] and exported over a C ABI.
//!
//! ## WASM
//! One thread: a linear runtime bootstrap followed by direct evaluator
//! calls from [`wasm::DirectCallInterpreter`].
//!
//! ## REPL
//! [`repl::ReplProcess`], an evaluator that drives an external REPL binary.
//! Native only.
//!
//! ## Boundary
//! Panic and null-pointer guards shared by both C surfaces.
//!
//! ## Stub (test-only)
//! Scripted evaluator, scripted protocol server and a fake language
//! runtime for exercising both topologies without real collaborators.

pub mod boundary;
#[cfg(not(target_arch = "wasm32"))]
pub mod native;
#[cfg(not(target_arch = "wasm32"))]
pub mod repl;
#[cfg(test)]
pub mod stub;
pub mod wasm;
