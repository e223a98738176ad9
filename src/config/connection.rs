// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{BridgeError, BridgeResult};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Connection descriptor handed to the kernel at startup.
///
/// This is the Jupyter connection file. The bridge only reads it and hands
/// it to the protocol library; `transport` selects which server the
/// library stands up.
///
/// # Example
/// ```json
/// {
///   "transport": "tcp",
///   "ip": "127.0.0.1",
///   "shell_port": 57503,
///   "iopub_port": 40885,
///   "stdin_port": 52597,
///   "control_port": 50160,
///   "hb_port": 42540,
///   "signature_scheme": "hmac-sha256",
///   "key": "a0436f6c-1916-11e5-ab5e-60f81dc9b60b"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConnectionDescriptor {
    pub transport: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub shell_port: u16,
    #[serde(default)]
    pub iopub_port: u16,
    #[serde(default)]
    pub stdin_port: u16,
    #[serde(default)]
    pub control_port: u16,
    #[serde(default)]
    pub hb_port: u16,
    #[serde(default)]
    pub signature_scheme: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub kernel_name: Option<String>,
}

/// Load a connection descriptor from a JSON connection file
pub fn load_connection<P: AsRef<Path>>(path: P) -> BridgeResult<ConnectionDescriptor> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| BridgeError::ConnectionFile {
        path: path.to_path_buf(),
        source,
    })?;
    let descriptor: ConnectionDescriptor = serde_json::from_str(&content)?;
    Ok(descriptor)
}
