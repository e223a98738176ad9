use crate::session::{CommandFailure, CommandOutput, EnvId};

/// The language evaluator, seen from the bridge.
///
/// One logical operation: run `code` against the environment `prior_env`
/// (`None` = fresh environment). The evaluator owns the accumulated
/// session state; the bridge only threads the environment identifier.
/// Failures are data, not errors.
pub trait Evaluator {
    fn run_command(
        &mut self,
        code: &str,
        prior_env: Option<EnvId>,
    ) -> Result<CommandOutput, CommandFailure>;

    fn name(&self) -> &'static str;
}
