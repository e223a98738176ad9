// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! What the browser host holds between calls: one bootstrapped
//! [`DirectCallInterpreter`] plus a buffer for what it publishes.
//!
//! Every call returns the frames it produced, in order, as a JSON array of
//! `{"msg_type", "content"}` objects, the same shape the stdio transport
//! writes. The host forwards them to its own protocol library.

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::backends::wasm::direct::DirectCallInterpreter;
use crate::backends::wasm::runtime::LanguageRuntime;
use crate::config::BridgeConfig;
use crate::errors::BootstrapError;
use crate::traits::{ExecuteRequestConfig, Interpreter, Publisher, ReplyCallback};

fn frame(msg_type: &str, content: Value) -> Value {
    json!({ "msg_type": msg_type, "content": content })
}

#[derive(Default)]
struct PublicationBuffer {
    frames: Mutex<Vec<Value>>,
}

impl Publisher for PublicationBuffer {
    fn publish_execution_result(&self, execution_count: u32, data: Value, metadata: Value) {
        self.frames.lock().push(frame(
            "execute_result",
            json!({ "execution_count": execution_count, "data": data, "metadata": metadata }),
        ));
    }

    fn publish_execution_error(&self, ename: &str, evalue: &str, traceback: Vec<String>) {
        self.frames.lock().push(frame(
            "error",
            json!({ "ename": ename, "evalue": evalue, "traceback": traceback }),
        ));
    }
}

pub struct WasmKernel<R: LanguageRuntime> {
    interpreter: DirectCallInterpreter<R>,
    published: Arc<PublicationBuffer>,
}

impl<R: LanguageRuntime> WasmKernel<R> {
    /// Bootstrap `runtime` and wire the interpreter's publisher.
    pub fn new(runtime: R, config: &BridgeConfig) -> Result<Self, BootstrapError> {
        let mut interpreter = DirectCallInterpreter::new(runtime, config)?;
        let published = Arc::new(PublicationBuffer::default());
        interpreter.register_publisher(Arc::clone(&published) as Arc<dyn Publisher>);
        interpreter.configure();
        Ok(Self {
            interpreter,
            published,
        })
    }

    /// Evaluate one cell. Publications come first, the `execute_reply` last.
    pub fn execute(&mut self, execution_count: u32, code: &str, silent: bool) -> Value {
        let answer = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&answer);
        let reply: ReplyCallback = Box::new(move |reply| *sink.lock() = Some(reply));

        let config = ExecuteRequestConfig {
            silent,
            store_history: !silent,
            allow_stdin: false,
        };
        self.interpreter
            .execute_request(reply, execution_count, code, config, json!({}));

        let mut frames = std::mem::take(&mut *self.published.frames.lock());
        let mut reply = answer
            .lock()
            .take()
            .unwrap_or_else(|| json!({ "status": "abort" }));
        reply["execution_count"] = json!(execution_count);
        frames.push(frame("execute_reply", reply));
        Value::Array(frames)
    }

    pub fn kernel_info(&mut self) -> Value {
        frame("kernel_info_reply", self.interpreter.kernel_info_request())
    }

    pub fn shutdown(&mut self) -> Value {
        self.interpreter.shutdown_request();
        frame("shutdown_reply", json!({ "status": "ok", "restart": false }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::FakeRuntime;
    use crate::backends::wasm::bootstrap::host_pointer_width;
    use crate::backends::wasm::BootstrapStage;

    fn config() -> BridgeConfig {
        let mut config = BridgeConfig::default();
        config.wasm.expected_pointer_width = host_pointer_width();
        config
    }

    fn types(frames: &Value) -> Vec<&str> {
        frames
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["msg_type"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn cells_return_publications_then_reply() {
        let runtime = FakeRuntime::new(vec![
            r#"{"env": 1}"#,
            r#"{"env": 2, "messages": [{"severity": "info", "data": "43"}]}"#,
            r#"{"env": 3, "messages": [{"severity": "error", "data": "unknown identifier 'y'"}]}"#,
        ]);
        let mut kernel = WasmKernel::new(runtime, &config()).unwrap();

        let define = kernel.execute(1, "def x := 42", false);
        assert_eq!(types(&define), vec!["execute_reply"]);
        assert_eq!(define[0]["content"]["status"], "ok");

        let eval = kernel.execute(2, "#eval x + 1", false);
        assert_eq!(types(&eval), vec!["execute_result", "execute_reply"]);
        assert_eq!(eval[0]["content"]["data"]["text/plain"], "43");
        assert_eq!(eval[1]["content"]["execution_count"], 2);

        let failed = kernel.execute(3, "#eval y", false);
        assert_eq!(types(&failed), vec!["error", "execute_reply"]);
        assert_eq!(failed[0]["content"]["ename"], "LeanError");
        assert_eq!(failed[1]["content"]["status"], "error");
    }

    #[test]
    fn silent_cells_publish_nothing() {
        let runtime = FakeRuntime::new(vec![r#"{"env": 1, "messages": [{"severity": "info", "data": "1"}]}"#]);
        let mut kernel = WasmKernel::new(runtime, &config()).unwrap();

        let frames = kernel.execute(0, "#eval 1", true);
        assert_eq!(types(&frames), vec!["execute_reply"]);
    }

    #[test]
    fn failed_bootstrap_yields_no_kernel() {
        let runtime = FakeRuntime::new(vec![]).failing_at(BootstrapStage::SearchPath);
        let err = WasmKernel::new(runtime, &config()).err().unwrap();
        assert_eq!(err.stage(), BootstrapStage::SearchPath);
    }

    #[test]
    fn info_and_shutdown_frames() {
        let mut kernel = WasmKernel::new(FakeRuntime::new(vec![]), &config()).unwrap();
        assert_eq!(kernel.kernel_info()["msg_type"], "kernel_info_reply");
        assert_eq!(kernel.shutdown()["content"]["status"], "ok");
    }
}
