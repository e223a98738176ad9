// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles for the bridge's external collaborators.
//!
//! * [`ScriptedEvaluator`] - an evaluator that replays canned outcomes
//! * [`ScriptedProtocolFactory`] / [`ScriptedServer`] - a protocol library
//!   that plays a fixed request script against the interpreter
//! * [`FakeRuntime`] - a language runtime with injectable bootstrap failures

use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::backends::wasm::{BootstrapStage, LanguageRuntime};
use crate::config::ConnectionDescriptor;
use crate::errors::{BridgeError, BridgeResult, RuntimeFault};
use crate::session::{CommandFailure, CommandOutput, EnvId};
use crate::traits::{
    Evaluator, ExecuteRequestConfig, Interpreter, ProtocolFactory, ProtocolServer, Publisher,
};

/// Every evaluator call: the code and the environment it ran against.
pub type CallLog = Arc<Mutex<Vec<(String, Option<EnvId>)>>>;

/// Evaluator that replays scripted outcomes in order.
pub struct ScriptedEvaluator {
    outcomes: VecDeque<Result<CommandOutput, CommandFailure>>,
    calls: CallLog,
    delay: Duration,
}

impl ScriptedEvaluator {
    pub fn new(outcomes: Vec<Result<CommandOutput, CommandFailure>>) -> Self {
        Self {
            outcomes: outcomes.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    /// Make every evaluation take at least `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }
}

impl Evaluator for ScriptedEvaluator {
    fn run_command(
        &mut self,
        code: &str,
        prior_env: Option<EnvId>,
    ) -> Result<CommandOutput, CommandFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((code.to_string(), prior_env));
        thread::sleep(self.delay);
        self.outcomes
            .pop_front()
            .unwrap_or_else(|| Err(CommandFailure::from_error("no scripted outcome left")))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// One action of a [`ScriptedServer`].
#[derive(Debug, Clone)]
pub enum ServerStep {
    Execute { code: String, silent: bool },
    Shutdown,
    /// Block until at least this many execute replies have arrived.
    WaitForReplies(usize),
    Pause(Duration),
}

impl ServerStep {
    pub fn execute(code: &str) -> Self {
        ServerStep::Execute {
            code: code.to_string(),
            silent: false,
        }
    }

    pub fn silent(code: &str) -> Self {
        ServerStep::Execute {
            code: code.to_string(),
            silent: true,
        }
    }
}

/// An execute reply as the protocol library received it.
#[derive(Debug, Clone)]
pub struct RecordedReply {
    pub execution_count: u32,
    pub content: Value,
}

pub type ReplyLog = Arc<Mutex<Vec<RecordedReply>>>;
pub type PublicationLog = Arc<Mutex<Vec<Value>>>;

const REPLY_WAIT_LIMIT: Duration = Duration::from_secs(10);

struct RecordingPublisher {
    publications: PublicationLog,
}

impl Publisher for RecordingPublisher {
    fn publish_execution_result(&self, execution_count: u32, data: Value, metadata: Value) {
        self.publications.lock().unwrap().push(json!({
            "msg_type": "execute_result",
            "execution_count": execution_count,
            "data": data,
            "metadata": metadata,
        }));
    }

    fn publish_execution_error(&self, ename: &str, evalue: &str, traceback: Vec<String>) {
        self.publications.lock().unwrap().push(json!({
            "msg_type": "error",
            "ename": ename,
            "evalue": evalue,
            "traceback": traceback,
        }));
    }
}

/// Protocol server that plays a script against its interpreter.
pub struct ScriptedServer {
    interpreter: Box<dyn Interpreter + Send>,
    script: Vec<ServerStep>,
    replies: ReplyLog,
    execution_count: u32,
}

impl ProtocolServer for ScriptedServer {
    fn run(mut self: Box<Self>) -> BridgeResult<()> {
        let script = std::mem::take(&mut self.script);
        for step in script {
            match step {
                ServerStep::Execute { code, silent } => {
                    if !silent {
                        self.execution_count += 1;
                    }
                    let execution_count = self.execution_count;
                    let replies = Arc::clone(&self.replies);
                    self.interpreter.execute_request(
                        Box::new(move |content| {
                            replies.lock().unwrap().push(RecordedReply {
                                execution_count,
                                content,
                            })
                        }),
                        execution_count,
                        &code,
                        ExecuteRequestConfig {
                            silent,
                            ..ExecuteRequestConfig::default()
                        },
                        json!({}),
                    );
                }
                ServerStep::Shutdown => self.interpreter.shutdown_request(),
                ServerStep::WaitForReplies(count) => {
                    let deadline = Instant::now() + REPLY_WAIT_LIMIT;
                    while self.replies.lock().unwrap().len() < count && Instant::now() < deadline {
                        thread::sleep(Duration::from_millis(2));
                    }
                }
                ServerStep::Pause(duration) => thread::sleep(duration),
            }
        }
        Ok(())
    }
}

/// Factory for [`ScriptedServer`]s. Shares its logs with every server it builds.
pub struct ScriptedProtocolFactory {
    script: Vec<ServerStep>,
    accepted_transport: Option<String>,
    replies: ReplyLog,
    publications: PublicationLog,
}

impl ScriptedProtocolFactory {
    pub fn new(script: Vec<ServerStep>) -> Self {
        Self {
            script,
            accepted_transport: None,
            replies: Arc::new(Mutex::new(Vec::new())),
            publications: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reject descriptors whose transport is not `transport`.
    pub fn accepting(mut self, transport: &str) -> Self {
        self.accepted_transport = Some(transport.to_string());
        self
    }

    pub fn replies(&self) -> ReplyLog {
        Arc::clone(&self.replies)
    }

    pub fn publications(&self) -> PublicationLog {
        Arc::clone(&self.publications)
    }
}

impl ProtocolFactory for ScriptedProtocolFactory {
    fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
        mut interpreter: Box<dyn Interpreter + Send>,
    ) -> BridgeResult<Box<dyn ProtocolServer>> {
        if let Some(accepted) = &self.accepted_transport {
            if &descriptor.transport != accepted {
                return Err(BridgeError::UnsupportedTransport(descriptor.transport.clone()));
            }
        }
        interpreter.register_publisher(Arc::new(RecordingPublisher {
            publications: Arc::clone(&self.publications),
        }));
        interpreter.configure();
        Ok(Box::new(ScriptedServer {
            interpreter,
            script: self.script.clone(),
            replies: Arc::clone(&self.replies),
            execution_count: 0,
        }))
    }
}

/// Session handle issued by [`FakeRuntime`].
#[derive(Debug)]
pub struct FakeSession(pub u32);

/// Language runtime double. Records every call; answers `execute` from a
/// list of raw JSON responses.
#[derive(Default)]
pub struct FakeRuntime {
    responses: VecDeque<String>,
    fail_at: Option<BootstrapStage>,
    fail_module: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
    executions: CallLog,
}

impl FakeRuntime {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: responses.into_iter().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn failing_at(mut self, stage: BootstrapStage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    pub fn failing_module(mut self, module: &str) -> Self {
        self.fail_module = Some(module.to_string());
        self
    }

    /// Bootstrap calls, in order.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    pub fn executions(&self) -> CallLog {
        Arc::clone(&self.executions)
    }

    fn record(&self, stage: BootstrapStage, call: String) -> Result<(), RuntimeFault> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail_at == Some(stage) {
            Err(RuntimeFault::new(format!("{call} failed")))
        } else {
            Ok(())
        }
    }
}

impl LanguageRuntime for FakeRuntime {
    type Session = FakeSession;

    fn initialize_runtime_module(&mut self, scheduler_workers: usize) -> Result<(), RuntimeFault> {
        self.record(
            BootstrapStage::RuntimeModule,
            format!("runtime_module(workers={scheduler_workers})"),
        )
    }

    fn initialize_globals(&mut self) -> Result<(), RuntimeFault> {
        self.record(BootstrapStage::RuntimeGlobals, "globals".to_string())
    }

    fn initialize_module(&mut self, module: &str) -> Result<(), RuntimeFault> {
        self.record(BootstrapStage::EvaluatorModules, format!("module:{module}"))?;
        if self.fail_module.as_deref() == Some(module) {
            return Err(RuntimeFault::new(format!("initialization of {module} failed")));
        }
        Ok(())
    }

    fn mark_end_initialization(&mut self) -> Result<(), RuntimeFault> {
        self.record(
            BootstrapStage::InitializationMarked,
            "mark_end_initialization".to_string(),
        )
    }

    fn initialize_search_path(&mut self) -> Result<(), RuntimeFault> {
        self.record(BootstrapStage::SearchPath, "search_path".to_string())
    }

    fn create_session(&mut self) -> Result<FakeSession, RuntimeFault> {
        self.record(BootstrapStage::SessionCreated, "create_session".to_string())?;
        Ok(FakeSession(1))
    }

    fn execute(
        &mut self,
        _session: &FakeSession,
        code: &str,
        env: Option<EnvId>,
    ) -> Result<String, RuntimeFault> {
        self.executions
            .lock()
            .unwrap()
            .push((code.to_string(), env));
        self.responses
            .pop_front()
            .ok_or_else(|| RuntimeFault::new("no scripted response left"))
    }
}
