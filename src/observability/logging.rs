// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tracing_subscriber::EnvFilter;

use crate::config::debug_enabled;

/// Filter used when `XLEAN_DEBUG` is set and `RUST_LOG` is not.
pub const DEBUG_FILTER: &str = "xlean_bridge=debug";

/// Filter used when neither variable is set.
pub const QUIET_FILTER: &str = "error";

fn default_filter(debug: bool) -> &'static str {
    if debug {
        DEBUG_FILTER
    } else {
        QUIET_FILTER
    }
}

/// Install the global stderr subscriber.
///
/// `RUST_LOG` wins when present; otherwise `XLEAN_DEBUG` selects between
/// debug output for this crate and errors only. Safe to call more than
/// once (the FFI initializer and the binary both call it); later calls are
/// no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug_enabled())));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
