// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEBUG_ENV_VAR, DEFAULT_ERROR_NAME, DEFAULT_POINTER_WIDTH, DEFAULT_POLL_TIMEOUT_MS,
    DEFAULT_REPL_COMMAND, DEFAULT_STARTUP_WAIT_MS, WASM_SCHEDULER_WORKERS,
};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Main configuration structure for the kernel bridge.
///
/// Every field is optional in the YAML file; anything left out falls back to
/// the built-in defaults in [`crate::config::consts`].
///
/// # Fields
/// * `poll_timeout_ms` - Bounded wait of one foreground poll cycle
/// * `startup_wait_ms` - Pause after the protocol thread is spawned
/// * `error_name` - Error name reported to clients for failed cells
/// * `kernel_info` - Static metadata returned for kernel info requests
/// * `repl` - How to start the evaluator process (native topology)
/// * `wasm` - Bootstrap settings for the single-threaded topology
///
/// # Example
/// ```yaml
/// poll_timeout_ms: 50
/// error_name: LeanError
/// repl:
///   command: /opt/lean/bin/repl
///   args: []
/// wasm:
///   modules: [REPL, REPL.Main, WasmRepl]
///   expected_pointer_width: 64
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub poll_timeout_ms: u64,
    pub startup_wait_ms: u64,
    pub error_name: String,
    pub kernel_info: KernelInfoConfig,
    pub repl: ReplConfig,
    pub wasm: WasmConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            startup_wait_ms: DEFAULT_STARTUP_WAIT_MS,
            error_name: DEFAULT_ERROR_NAME.to_string(),
            kernel_info: KernelInfoConfig::default(),
            repl: ReplConfig::default(),
            wasm: WasmConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn startup_wait(&self) -> Duration {
        Duration::from_millis(self.startup_wait_ms)
    }
}

/// Kernel metadata returned verbatim for kernel info requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KernelInfoConfig {
    pub implementation: String,
    pub implementation_version: String,
    pub language_name: String,
    pub language_version: String,
    pub mimetype: String,
    pub file_extension: String,
    pub pygments_lexer: String,
    pub codemirror_mode: String,
    pub nbconvert_exporter: String,
    pub banner: String,
    pub help_links: Vec<HelpLink>,
}

impl Default for KernelInfoConfig {
    fn default() -> Self {
        Self {
            implementation: "xlean".to_string(),
            implementation_version: env!("CARGO_PKG_VERSION").to_string(),
            language_name: "lean".to_string(),
            language_version: "4.0".to_string(),
            mimetype: "text/x-lean".to_string(),
            file_extension: ".lean".to_string(),
            pygments_lexer: "lean".to_string(),
            codemirror_mode: "lean4".to_string(),
            nbconvert_exporter: String::new(),
            banner: "xlean: A Jupyter kernel for Lean 4".to_string(),
            help_links: vec![
                HelpLink {
                    text: "Lean Documentation".to_string(),
                    url: "https://lean-lang.org/documentation/".to_string(),
                },
                HelpLink {
                    text: "Lean Zulip Chat".to_string(),
                    url: "https://leanprover.zulipchat.com/".to_string(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HelpLink {
    pub text: String,
    pub url: String,
}

/// How to start the evaluator process.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReplConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_REPL_COMMAND.to_string(),
            args: Vec::new(),
            working_dir: None,
        }
    }
}

/// Bootstrap settings for the single-threaded (WASM) topology.
///
/// # Fields
/// * `modules` - Evaluator modules, lowest-level first
/// * `scheduler_workers` - Task manager workers (0 = inline execution)
/// * `expected_pointer_width` - Pointer width the compiled module data assumes
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WasmConfig {
    pub modules: Vec<String>,
    pub scheduler_workers: usize,
    pub expected_pointer_width: u32,
}

impl Default for WasmConfig {
    fn default() -> Self {
        Self {
            modules: vec![
                "REPL".to_string(),
                "REPL.Main".to_string(),
                "WasmRepl".to_string(),
            ],
            scheduler_workers: WASM_SCHEDULER_WORKERS,
            expected_pointer_width: DEFAULT_POINTER_WIDTH,
        }
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BridgeConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether diagnostic logging was requested through `XLEAN_DEBUG`.
///
/// Read once per process.
pub fn debug_enabled() -> bool {
    static DEBUG: OnceLock<bool> = OnceLock::new();
    *DEBUG.get_or_init(|| {
        std::env::var(DEBUG_ENV_VAR)
            .map(|value| is_truthy(&value))
            .unwrap_or(false)
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_yaml_uses_defaults() {
        let cfg: BridgeConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(cfg.poll_timeout(), Duration::from_millis(100));
        assert_eq!(cfg.startup_wait(), Duration::from_millis(100));
        assert_eq!(cfg.error_name, "LeanError");
        assert_eq!(cfg.repl.command, "repl");
        assert_eq!(cfg.wasm.modules, vec!["REPL", "REPL.Main", "WasmRepl"]);
        assert_eq!(cfg.wasm.scheduler_workers, 0);
        assert_eq!(cfg.wasm.expected_pointer_width, 64);
    }

    #[test]
    fn partial_override() {
        let yaml = r#"
poll_timeout_ms: 25
repl:
  command: /opt/lean/bin/repl
  args: ["--quiet"]
kernel_info:
  language_version: "4.12.0"
"#;
        let cfg: BridgeConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(cfg.poll_timeout_ms, 25);
        assert_eq!(cfg.startup_wait_ms, 100);
        assert_eq!(cfg.repl.command, "/opt/lean/bin/repl");
        assert_eq!(cfg.repl.args, vec!["--quiet"]);
        assert_eq!(cfg.repl.working_dir, None);
        assert_eq!(cfg.kernel_info.language_version, "4.12.0");
        // Untouched kernel info fields keep their defaults
        assert_eq!(cfg.kernel_info.implementation, "xlean");
        assert_eq!(cfg.kernel_info.help_links.len(), 2);
    }

    #[test]
    fn load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "error_name: ReplError").unwrap();
        writeln!(file, "wasm:").unwrap();
        writeln!(file, "  modules: [Core]").unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.error_name, "ReplError");
        assert_eq!(cfg.wasm.modules, vec!["Core"]);
        assert_eq!(cfg.wasm.expected_pointer_width, 64);
    }

    #[test]
    fn load_config_reports_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "poll_timeout_ms: [not, a, number]").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_config_reports_missing_file() {
        let err = load_config("/nonexistent/xlean.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(is_truthy(value), "{value:?} should enable debug");
        }
        for value in ["", "0", "false", "off", "debug"] {
            assert!(!is_truthy(value), "{value:?} should not enable debug");
        }
    }
}
