/// Environment variable that turns on diagnostic logging
pub const DEBUG_ENV_VAR: &str = "XLEAN_DEBUG";
/// Environment variable naming a YAML config file for kernels created over the C ABI
pub const CONFIG_ENV_VAR: &str = "XLEAN_CONFIG";
/// Default bounded wait of one foreground poll cycle (milliseconds)
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;
/// Default pause after spawning the protocol thread (milliseconds)
pub const DEFAULT_STARTUP_WAIT_MS: u64 = 100;
/// Error name reported to clients for failed cells
pub const DEFAULT_ERROR_NAME: &str = "LeanError";
/// Default evaluator process command
pub const DEFAULT_REPL_COMMAND: &str = "repl";
/// Pointer width the evaluator's compiled module data assumes
pub const DEFAULT_POINTER_WIDTH: u32 = 64;
/// Scheduler workers in the WASM runtime (0 = run tasks inline)
pub const WASM_SCHEDULER_WORKERS: usize = 0;
/// Transport served by the built-in reference protocol server
pub const STDIO_TRANSPORT: &str = "stdio";
/// Jupyter messaging protocol version advertised in kernel info
pub const PROTOCOL_VERSION: &str = "5.3";
