// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;       // native queue/handle, WASM direct calls, REPL process, stubs
pub mod config;         // bridge config + connection descriptor
pub mod engine;         // foreground loop + output policy
pub mod errors;         // error handling
pub mod observability;
pub mod protocol;       // reply constructors, queued requests, reference transport
pub mod session;        // session state + evaluation results
pub mod traits;         // interpreter / evaluator / protocol seams
