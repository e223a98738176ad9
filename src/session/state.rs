// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::session::result::{CommandFailure, CommandOutput};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, monotonically issued token for a snapshot of evaluator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvId(pub u32);

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session state threaded from one evaluation to the next.
///
/// Replaced wholesale after every evaluation: a success yields a state
/// carrying the new environment, a failure yields the same state again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    env: Option<EnvId>,
    evaluations: u64,
}

impl SessionState {
    /// A fresh session with an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// The environment the next evaluation must run against.
    pub fn env(&self) -> Option<EnvId> {
        self.env
    }

    /// Number of evaluations this session has been threaded through.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// State after `outcome`. Failures keep the prior environment so the
    /// next cell retries against the same snapshot.
    pub fn after(self, outcome: &Result<CommandOutput, CommandFailure>) -> Self {
        let env = match outcome {
            Ok(output) => Some(output.env),
            Err(_) => self.env,
        };
        Self {
            env,
            evaluations: self.evaluations + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(env: u32) -> Result<CommandOutput, CommandFailure> {
        Ok(CommandOutput {
            env: EnvId(env),
            messages: vec![],
            goals: vec![],
        })
    }

    #[test]
    fn fresh_session_has_no_env() {
        let state = SessionState::new();
        assert_eq!(state.env(), None);
        assert_eq!(state.evaluations(), 0);
    }

    #[test]
    fn success_advances_env() {
        let state = SessionState::new().after(&success(1)).after(&success(2));
        assert_eq!(state.env(), Some(EnvId(2)));
        assert_eq!(state.evaluations(), 2);
    }

    #[test]
    fn failure_keeps_env() {
        let state = SessionState::new().after(&success(1));
        let failed = state.after(&Err(CommandFailure::from_error("type mismatch")));

        assert_eq!(failed.env(), Some(EnvId(1)));
        assert_eq!(failed.evaluations(), 2);
    }

    #[test]
    fn failure_on_fresh_session_stays_empty() {
        let state = SessionState::new().after(&Err(CommandFailure::from_error("boom")));
        assert_eq!(state.env(), None);
    }
}
