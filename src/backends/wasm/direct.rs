// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::backends::wasm::bootstrap::{Bootstrap, Bootstrapped};
use crate::backends::wasm::runtime::LanguageRuntime;
use crate::config::{BridgeConfig, KernelInfoConfig};
use crate::engine::PendingReply;
use crate::errors::BootstrapError;
use crate::observability::messages::session::{
    EvaluationCompleted, EvaluationFailed, EvaluationStarted,
};
use crate::observability::messages::StructuredLog;
use crate::protocol::replies::{
    create_complete_reply, create_info_reply, create_inspect_reply, create_is_complete_reply,
};
use crate::session::{decode_response, CommandFailure, CommandOutput, SessionState};
use crate::traits::{ExecuteRequestConfig, Interpreter, Publisher, ReplyCallback};

/// Interpreter for the single-threaded topology: evaluates in line.
///
/// Only constructible from a successful bootstrap, so every execute request
/// it sees runs against a fully initialised runtime. The session reference
/// lives as long as the interpreter.
pub struct DirectCallInterpreter<R: LanguageRuntime> {
    runtime: R,
    session: R::Session,
    state: SessionState,
    publisher: Option<Arc<dyn Publisher>>,
    error_name: String,
    kernel_info: KernelInfoConfig,
    shutdown_requested: bool,
}

impl<R: LanguageRuntime> DirectCallInterpreter<R> {
    /// Bootstrap `runtime` and wrap it. Fails if any bootstrap stage fails.
    pub fn new(runtime: R, config: &BridgeConfig) -> Result<Self, BootstrapError> {
        let Bootstrapped { runtime, session } = Bootstrap::new(runtime, &config.wasm).run()?;
        Ok(Self {
            runtime,
            session,
            state: SessionState::new(),
            publisher: None,
            error_name: config.error_name.clone(),
            kernel_info: config.kernel_info.clone(),
            shutdown_requested: false,
        })
    }

    /// Session state the next execute request will run against.
    pub fn session_state(&self) -> SessionState {
        self.state
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    fn evaluate(&mut self, code: &str) -> Result<CommandOutput, CommandFailure> {
        self.runtime
            .execute(&self.session, code, self.state.env())
            .map_err(|fault| CommandFailure::from_error(fault.to_string()))
            .and_then(|raw| decode_response(&raw))
    }
}

impl<R: LanguageRuntime> Interpreter for DirectCallInterpreter<R> {
    fn register_publisher(&mut self, publisher: Arc<dyn Publisher>) {
        self.publisher = Some(publisher);
    }

    fn configure(&mut self) {
        tracing::debug!("Direct call interpreter ready");
    }

    fn execute_request(
        &mut self,
        reply: ReplyCallback,
        execution_count: u32,
        code: &str,
        config: ExecuteRequestConfig,
        _user_expressions: Value,
    ) {
        let started = EvaluationStarted {
            execution_count,
            prior_env: self.state.env(),
            code_len: code.len(),
        };
        let span = started.span("evaluation");
        let _guard = span.enter();
        started.log();

        let start_time = Instant::now();
        let outcome = self.evaluate(code);
        let duration = start_time.elapsed();
        self.state = self.state.after(&outcome);

        let pending = PendingReply::new(execution_count, config.silent, reply);
        let publisher = self.publisher.as_deref();
        match outcome {
            Ok(output) => {
                EvaluationCompleted {
                    execution_count,
                    env: output.env,
                    message_count: output.messages.len(),
                    duration,
                }
                .log();
                pending.succeed(publisher, &output.render());
            }
            Err(failure) => {
                EvaluationFailed {
                    execution_count,
                    message_count: failure.messages.len(),
                    duration,
                }
                .log();
                pending.fail(publisher, &self.error_name, &failure.render());
            }
        }
    }

    fn complete_request(&mut self, _code: &str, cursor_pos: usize) -> Value {
        create_complete_reply(Vec::new(), cursor_pos, cursor_pos)
    }

    fn inspect_request(&mut self, _code: &str, _cursor_pos: usize, _detail_level: u8) -> Value {
        create_inspect_reply(false)
    }

    fn is_complete_request(&mut self, _code: &str) -> Value {
        create_is_complete_reply("complete", "")
    }

    fn kernel_info_request(&mut self) -> Value {
        create_info_reply(&self.kernel_info)
    }

    fn shutdown_request(&mut self) {
        tracing::info!("Shutdown requested; session is released with the interpreter");
        self.shutdown_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::FakeRuntime;
    use crate::backends::wasm::bootstrap::host_pointer_width;
    use crate::session::EnvId;
    use serde_json::json;
    use std::sync::Mutex;

    fn config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.wasm.expected_pointer_width = host_pointer_width();
        config
    }

    fn capture() -> (ReplyCallback, Arc<Mutex<Vec<Value>>>) {
        let replies = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&replies);
        (
            Box::new(move |reply| sink.lock().unwrap().push(reply)),
            replies,
        )
    }

    fn run(interpreter: &mut DirectCallInterpreter<FakeRuntime>, count: u32, code: &str) -> Value {
        let (reply, replies) = capture();
        interpreter.execute_request(reply, count, code, ExecuteRequestConfig::default(), json!({}));
        let mut replies = replies.lock().unwrap();
        assert_eq!(replies.len(), 1, "exactly one reply per execute request");
        replies.remove(0)
    }

    #[test]
    fn environment_follows_successes_only() {
        let runtime = FakeRuntime::new(vec![
            r#"{"env": 1}"#,
            r#"{"env": 2, "messages": [{"severity": "info", "data": "43"}]}"#,
            r#"{"env": 3, "messages": [{"severity": "error", "data": "type mismatch"}]}"#,
            r#"{"env": 4}"#,
        ]);
        let executions = runtime.executions();
        let mut interpreter = DirectCallInterpreter::new(runtime, &config()).unwrap();

        assert_eq!(run(&mut interpreter, 1, "def x := 42")["status"], "ok");
        assert_eq!(run(&mut interpreter, 2, "#eval x + 1")["status"], "ok");
        assert_eq!(run(&mut interpreter, 3, "#eval 1 + \"s\"")["status"], "error");
        assert_eq!(interpreter.session_state().env(), Some(EnvId(2)));
        assert_eq!(run(&mut interpreter, 4, "#eval x")["status"], "ok");

        let prior: Vec<Option<EnvId>> = executions.lock().unwrap().iter().map(|(_, env)| *env).collect();
        assert_eq!(prior, vec![None, Some(EnvId(1)), Some(EnvId(2)), Some(EnvId(2))]);
        assert_eq!(interpreter.session_state().env(), Some(EnvId(4)));
    }

    #[test]
    fn runtime_fault_is_an_error_reply() {
        let runtime = FakeRuntime::new(vec![]);
        let mut interpreter = DirectCallInterpreter::new(runtime, &config()).unwrap();

        let reply = run(&mut interpreter, 1, "#eval 1");
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["ename"], "LeanError");
        assert_eq!(interpreter.session_state().env(), None);
    }

    #[test]
    fn bootstrap_failure_prevents_construction() {
        let runtime = FakeRuntime::new(vec![r#"{"env": 1}"#]).failing_module("REPL");
        let executions = runtime.executions();

        let result = DirectCallInterpreter::new(runtime, &config());
        assert!(result.is_err());
        assert!(executions.lock().unwrap().is_empty());
    }

    #[test]
    fn shutdown_only_records() {
        let mut interpreter = DirectCallInterpreter::new(FakeRuntime::new(vec![]), &config()).unwrap();
        assert!(!interpreter.shutdown_requested());
        interpreter.shutdown_request();
        assert!(interpreter.shutdown_requested());
    }
}
