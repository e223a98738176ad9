// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The evaluator as a child process.
//!
//! One command per exchange, each a JSON object followed by a blank line:
//!
//! ```text
//! > {"cmd": "#eval x + 1", "env": 1}
//! >
//! < {"env": 2,
//! <  "messages": [{"severity": "info", "pos": {"line": 1, "column": 0}, "data": "43"}]}
//! <
//! ```
//!
//! The response may span several lines; a blank line ends it.

use serde::Serialize;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::config::ReplConfig;
use crate::errors::{BridgeError, BridgeResult};
use crate::observability::messages::session::{EvaluatorIoFailed, EvaluatorSpawned};
use crate::observability::messages::StructuredLog;
use crate::session::{decode_response, CommandFailure, CommandOutput, EnvId};
use crate::traits::Evaluator;

#[derive(Serialize)]
struct ReplCommand<'a> {
    cmd: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    env: Option<EnvId>,
}

pub struct ReplProcess {
    command: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ReplProcess {
    pub fn spawn(config: &ReplConfig) -> BridgeResult<Self> {
        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        let spawn_error = |source| BridgeError::EvaluatorSpawn {
            command: config.command.clone(),
            source,
        };
        let mut child = command.spawn().map_err(spawn_error)?;
        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(spawn_error(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "evaluator pipes unavailable",
                )));
            }
        };

        EvaluatorSpawned {
            command: &config.command,
            pid: child.id(),
        }
        .log();

        Ok(Self {
            command: config.command.clone(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn exchange(&mut self, request: &str) -> io::Result<String> {
        self.stdin.write_all(request.as_bytes())?;
        self.stdin.write_all(b"\n\n")?;
        self.stdin.flush()?;

        let mut response = String::new();
        loop {
            let mut line = String::new();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "evaluator closed its output",
                ));
            }
            if line.trim().is_empty() {
                if response.is_empty() {
                    continue;
                }
                return Ok(response);
            }
            response.push_str(&line);
        }
    }
}

impl Evaluator for ReplProcess {
    fn run_command(
        &mut self,
        code: &str,
        prior_env: Option<EnvId>,
    ) -> Result<CommandOutput, CommandFailure> {
        let request = serde_json::to_string(&ReplCommand {
            cmd: code,
            env: prior_env,
        })
        .map_err(|e| CommandFailure::from_error(format!("Could not encode command: {e}")))?;

        match self.exchange(&request) {
            Ok(raw) => decode_response(&raw),
            Err(error) => {
                EvaluatorIoFailed {
                    command: &self.command,
                    error: &error,
                }
                .log();
                Err(CommandFailure::from_error(format!(
                    "Evaluator '{}' unavailable: {}",
                    self.command, error
                )))
            }
        }
    }

    fn name(&self) -> &'static str {
        "repl"
    }
}

impl Drop for ReplProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
