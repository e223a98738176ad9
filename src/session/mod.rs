// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Session continuity across discrete evaluation requests.
//!
//! * `state` - environment identifiers and the session state threaded between calls
//! * `result` - the evaluator's success/failure shapes
//! * `response` - decoding of the evaluator's JSON responses into those shapes

mod response;
mod result;
mod state;

pub use response::decode_response;
pub use result::{CommandFailure, CommandOutput, Message, Position, Severity};
pub use state::{EnvId, SessionState};
