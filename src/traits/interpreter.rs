use serde_json::Value;
use std::sync::Arc;

use crate::traits::protocol::Publisher;

/// Reply for one execute request. `FnOnce` makes a second delivery impossible.
pub type ReplyCallback = Box<dyn FnOnce(Value) + Send>;

/// Per-request execution flags forwarded by the protocol library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteRequestConfig {
    pub silent: bool,
    pub store_history: bool,
    pub allow_stdin: bool,
}

impl Default for ExecuteRequestConfig {
    fn default() -> Self {
        Self {
            silent: false,
            store_history: true,
            allow_stdin: false,
        }
    }
}

/// Capability set the protocol library expects from a kernel.
///
/// The protocol server owns its interpreter and calls these from its own
/// thread of control. Request/reply shapes follow the Jupyter messaging
/// protocol; see [`crate::protocol::replies`] for the constructors.
pub trait Interpreter {
    /// Hand over the channel used for `execute_result` / `error` publications.
    /// Called by the server before `configure`.
    fn register_publisher(&mut self, publisher: Arc<dyn Publisher>);

    fn configure(&mut self);

    /// Execute `code`. `reply` must be invoked exactly once, now or later.
    fn execute_request(
        &mut self,
        reply: ReplyCallback,
        execution_count: u32,
        code: &str,
        config: ExecuteRequestConfig,
        user_expressions: Value,
    );

    fn complete_request(&mut self, code: &str, cursor_pos: usize) -> Value;

    fn inspect_request(&mut self, code: &str, cursor_pos: usize, detail_level: u8) -> Value;

    fn is_complete_request(&mut self, code: &str) -> Value;

    fn kernel_info_request(&mut self) -> Value;

    fn shutdown_request(&mut self);
}

impl<T: Interpreter + ?Sized> Interpreter for Box<T> {
    fn register_publisher(&mut self, publisher: Arc<dyn Publisher>) {
        (**self).register_publisher(publisher)
    }

    fn configure(&mut self) {
        (**self).configure()
    }

    fn execute_request(
        &mut self,
        reply: ReplyCallback,
        execution_count: u32,
        code: &str,
        config: ExecuteRequestConfig,
        user_expressions: Value,
    ) {
        (**self).execute_request(reply, execution_count, code, config, user_expressions)
    }

    fn complete_request(&mut self, code: &str, cursor_pos: usize) -> Value {
        (**self).complete_request(code, cursor_pos)
    }

    fn inspect_request(&mut self, code: &str, cursor_pos: usize, detail_level: u8) -> Value {
        (**self).inspect_request(code, cursor_pos, detail_level)
    }

    fn is_complete_request(&mut self, code: &str) -> Value {
        (**self).is_complete_request(code)
    }

    fn kernel_info_request(&mut self) -> Value {
        (**self).kernel_info_request()
    }

    fn shutdown_request(&mut self) {
        (**self).shutdown_request()
    }
}
