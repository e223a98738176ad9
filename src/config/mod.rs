// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod connection;
mod loader;

pub mod consts;

pub use connection::{load_connection, ConnectionDescriptor};
pub use loader::{
    debug_enabled, load_config, BridgeConfig, HelpLink, KernelInfoConfig, ReplConfig, WasmConfig,
};
