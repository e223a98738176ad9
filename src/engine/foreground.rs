// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The native foreground loop.
//!
//! Runs on the embedding runtime's thread, the only thread that ever calls
//! the evaluator. Each iteration is one transition of a three-state machine:
//!
//! ```text
//!            poll: nothing, keep going
//!           +-------+
//!           v       |
//!       Polling ----+---- poll: nothing, should stop ----> Stopped
//!        |   ^                                               ^
//!   message  | execute (reply sent) / unrecognized (skipped) |
//!        v   |                                               |
//!      Dispatching ---------------- shutdown ----------------+
//! ```
//!
//! Session state is threaded through the transitions explicitly: a success
//! hands the next evaluation the new environment, a failure hands it the
//! same state again.

use std::time::{Duration, Instant};

use crate::observability::messages::session::{
    EvaluationCompleted, EvaluationFailed, EvaluationStarted, ForegroundStopped,
    UnrecognizedRequest,
};
use crate::observability::messages::StructuredLog;
use crate::protocol::QueuedRequest;
use crate::session::SessionState;
use crate::traits::{Evaluator, KernelPort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Polling,
    /// Holds the raw wire message taken off the queue.
    Dispatching(String),
    Stopped,
}

pub struct ForegroundLoop<P, E> {
    port: P,
    evaluator: E,
    poll_timeout: Duration,
}

impl<P: KernelPort, E: Evaluator> ForegroundLoop<P, E> {
    pub fn new(port: P, evaluator: E, poll_timeout: Duration) -> Self {
        Self {
            port,
            evaluator,
            poll_timeout,
        }
    }

    /// Drive the loop from `session` until it stops. Returns the final session.
    pub fn run(&mut self, session: SessionState) -> SessionState {
        let mut state = LoopState::Polling;
        let mut session = session;
        let mut stop_reason = "shutdown requested";

        while state != LoopState::Stopped {
            let was_polling = state == LoopState::Polling;
            (state, session) = self.step(state, session);
            if was_polling && state == LoopState::Stopped {
                stop_reason = "should-stop flag observed";
            }
        }

        ForegroundStopped {
            reason: stop_reason,
            evaluator: self.evaluator.name(),
            evaluations: session.evaluations(),
        }
        .log();
        session
    }

    /// One transition.
    pub fn step(&mut self, state: LoopState, session: SessionState) -> (LoopState, SessionState) {
        match state {
            LoopState::Polling => match self.port.poll(self.poll_timeout) {
                Some(message) if !message.is_empty() => (LoopState::Dispatching(message), session),
                _ if self.port.should_stop() => (LoopState::Stopped, session),
                _ => (LoopState::Polling, session),
            },
            LoopState::Dispatching(message) => match QueuedRequest::decode(&message) {
                QueuedRequest::Execute {
                    code,
                    execution_count,
                } => {
                    let session = self.evaluate(&code, execution_count, session);
                    (LoopState::Polling, session)
                }
                QueuedRequest::Shutdown => (LoopState::Stopped, session),
                QueuedRequest::Unrecognized(kind) => {
                    UnrecognizedRequest { kind: &kind }.log();
                    (LoopState::Polling, session)
                }
            },
            LoopState::Stopped => (LoopState::Stopped, session),
        }
    }

    fn evaluate(&mut self, code: &str, execution_count: u32, session: SessionState) -> SessionState {
        let started = EvaluationStarted {
            execution_count,
            prior_env: session.env(),
            code_len: code.len(),
        };
        let span = started.span("evaluation");
        let _guard = span.enter();
        started.log();

        let start_time = Instant::now();
        let outcome = self.evaluator.run_command(code, session.env());
        let duration = start_time.elapsed();

        match &outcome {
            Ok(output) => {
                EvaluationCompleted {
                    execution_count,
                    env: output.env,
                    message_count: output.messages.len(),
                    duration,
                }
                .log();
                self.port.send_result(execution_count, &output.render());
            }
            Err(failure) => {
                EvaluationFailed {
                    execution_count,
                    message_count: failure.messages.len(),
                    duration,
                }
                .log();
                self.port.send_error(execution_count, &failure.render());
            }
        }

        session.after(&outcome)
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}
