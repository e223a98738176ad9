// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while standing up or driving the native kernel bridge.
//!
//! None of these ever cross the C ABI: the FFI layer converts them into
//! safe defaults (null handle, empty string, `false`).

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the native topology outside of evaluation itself.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The connection file could not be read.
    #[error("Failed to read connection file '{path}': {source}")]
    ConnectionFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The connection file was read but is not a valid descriptor.
    #[error("Invalid connection descriptor: {0}")]
    InvalidDescriptor(#[from] serde_json::Error),

    /// The protocol library has no transport for this descriptor.
    #[error("Unsupported transport '{0}'")]
    UnsupportedTransport(String),

    /// The background protocol thread could not be created.
    #[error("Failed to spawn protocol thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// The protocol event loop failed while running.
    #[error("Transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// The evaluator process could not be started.
    #[error("Failed to start evaluator process '{command}': {source}")]
    EvaluatorSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
