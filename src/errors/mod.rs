// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod bootstrap;
mod bridge;
mod config;

pub use bootstrap::{BootstrapError, RuntimeFault};
pub use bridge::{BridgeError, BridgeResult};
pub use config::ConfigError;
