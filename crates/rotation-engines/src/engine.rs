//! Engine trait.

use async_trait::async_trait;
use rotation_core::error::EngineError;

use crate::context::IterationContext;
use crate::report::IterationReport;
use crate::state::EngineState;

/// A decision engine driven one iteration at a time by the host.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Get the engine name.
    fn name(&self) -> &str;

    /// Get the engine description.
    fn description(&self) -> &str;

    /// Run one iteration.
    ///
    /// Only the engine's own part of `state` is touched. Errors for which
    /// [`EngineError::is_skippable`] holds leave the state unchanged.
    async fn on_iteration(
        &self,
        ctx: &IterationContext<'_>,
        state: &mut EngineState,
    ) -> Result<IterationReport, EngineError>;
}
