// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Evaluator back end that drives an external REPL process.

pub mod process;

pub use process::ReplProcess;
