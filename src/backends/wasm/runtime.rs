// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::RuntimeFault;
use crate::session::EnvId;

/// The embedded language runtime, one method per bootstrap step plus the
/// evaluator entry point.
///
/// Implementations wrap the runtime's exported initializers. The bootstrap
/// calls them in declaration order, exactly once each.
pub trait LanguageRuntime {
    /// Handle to the evaluator's command state. Created once, then passed
    /// into every `execute` call.
    type Session;

    /// Core memory and task primitives. `scheduler_workers` is 0 in a host
    /// without threads: tasks run inline.
    fn initialize_runtime_module(&mut self, scheduler_workers: usize) -> Result<(), RuntimeFault>;

    /// Global runtime state (name interning tables, caches).
    fn initialize_globals(&mut self) -> Result<(), RuntimeFault>;

    fn initialize_module(&mut self, module: &str) -> Result<(), RuntimeFault>;

    /// One-way latch marking the end of module initialization.
    fn mark_end_initialization(&mut self) -> Result<(), RuntimeFault>;

    /// Evaluator-level search path setup.
    fn initialize_search_path(&mut self) -> Result<(), RuntimeFault>;

    fn create_session(&mut self) -> Result<Self::Session, RuntimeFault>;

    /// Run `code` against `env` and return the evaluator's raw JSON response.
    fn execute(
        &mut self,
        session: &Self::Session,
        code: &str,
        env: Option<EnvId>,
    ) -> Result<String, RuntimeFault>;
}
