//! Host scheduler for a single engine.

use chrono::{DateTime, Utc};
use rotation_core::error::EngineError;
use rotation_core::traits::Gateway;
use rotation_engines::{Engine, EngineState, IterationContext, IterationReport, SettlementStrategy};
use tracing::{error, info, info_span, warn, Instrument};

/// Result of one tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// The iteration ran
    Completed(IterationReport),
    /// Data was missing; nothing was done
    Skipped(EngineError),
}

/// Runs one engine iteration per tick, never overlapping.
pub struct IterationRunner {
    engine: Box<dyn Engine>,
    settlement: Box<dyn SettlementStrategy>,
    state: EngineState,
    is_first_call: bool,
    ticks: u64,
    skipped: u64,
}

impl IterationRunner {
    pub fn new(engine: Box<dyn Engine>, settlement: Box<dyn SettlementStrategy>) -> Self {
        Self {
            engine,
            settlement,
            state: EngineState::default(),
            is_first_call: true,
            ticks: 0,
            skipped: 0,
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Ticks run so far, skipped ones included.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Run one iteration.
    ///
    /// The first-call flag is only set for the first tick, whether or not
    /// that tick completes. Missing data is logged and reported as
    /// [`TickOutcome::Skipped`]; any other error is returned.
    pub async fn tick(
        &mut self,
        now: DateTime<Utc>,
        gateway: &dyn Gateway,
    ) -> Result<TickOutcome, EngineError> {
        let ctx = IterationContext::new(now, self.is_first_call, gateway, self.settlement.as_ref());
        let span = info_span!("iteration", engine = self.engine.name(), tick = self.ticks + 1);

        let result = self
            .engine
            .on_iteration(&ctx, &mut self.state)
            .instrument(span)
            .await;

        self.ticks += 1;
        self.is_first_call = false;

        match result {
            Ok(report) => {
                if let Some(action) = &report.action {
                    info!(
                        engine = %report.engine,
                        action = %action,
                        orders = report.orders.len(),
                        failures = report.failures.len(),
                        "iteration acted"
                    );
                }
                Ok(TickOutcome::Completed(report))
            }
            Err(e) if e.is_skippable() => {
                warn!(error = %e, %now, "skipping iteration");
                self.skipped += 1;
                Ok(TickOutcome::Skipped(e))
            }
            Err(e) => {
                error!(error = %e, %now, "iteration failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rotation_core::error::GatewayError;
    use rotation_engines::FixedDelay;
    use rotation_gateway::PaperGateway;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    /// Records the first-call flag and returns queued errors.
    struct ScriptedEngine {
        first_calls: Arc<Mutex<Vec<bool>>>,
        errors: Mutex<Vec<Option<EngineError>>>,
    }

    #[async_trait]
    impl Engine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn description(&self) -> &str {
            "records calls"
        }

        async fn on_iteration(
            &self,
            ctx: &IterationContext<'_>,
            state: &mut EngineState,
        ) -> Result<IterationReport, EngineError> {
            self.first_calls.lock().unwrap().push(ctx.is_first_call);
            let next = {
                let mut errors = self.errors.lock().unwrap();
                if errors.is_empty() {
                    None
                } else {
                    errors.remove(0)
                }
            };
            match next {
                Some(e) => Err(e),
                None => {
                    state.signal.supertrend_counter += 1;
                    Ok(IterationReport::new("scripted", ctx.now))
                }
            }
        }
    }

    fn runner(errors: Vec<Option<EngineError>>) -> (IterationRunner, Arc<Mutex<Vec<bool>>>) {
        let first_calls = Arc::new(Mutex::new(Vec::new()));
        let engine = ScriptedEngine {
            first_calls: first_calls.clone(),
            errors: Mutex::new(errors),
        };
        let runner = IterationRunner::new(Box::new(engine), Box::new(FixedDelay::default()));
        (runner, first_calls)
    }

    #[tokio::test]
    async fn test_first_call_flag_only_on_first_tick() {
        let (mut runner, first_calls) = runner(vec![]);
        let gateway = PaperGateway::new(dec!(1000));

        for _ in 0..3 {
            runner.tick(Utc::now(), &gateway).await.unwrap();
        }

        assert_eq!(*first_calls.lock().unwrap(), vec![true, false, false]);
        assert_eq!(runner.state().signal.supertrend_counter, 3);
        assert_eq!(runner.ticks(), 3);
    }

    #[tokio::test]
    async fn test_missing_data_is_skipped() {
        let (mut runner, _) = runner(vec![Some(EngineError::MissingData("BTC".into()))]);
        let gateway = PaperGateway::new(dec!(1000));

        let outcome = runner.tick(Utc::now(), &gateway).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Skipped(_)));
        assert_eq!(runner.skipped(), 1);

        let outcome = runner.tick(Utc::now(), &gateway).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn test_gateway_failure_is_returned() {
        let (mut runner, _) = runner(vec![Some(EngineError::Gateway(GatewayError::Connection(
            "down".into(),
        )))]);
        let gateway = PaperGateway::new(dec!(1000));

        assert!(runner.tick(Utc::now(), &gateway).await.is_err());
        assert_eq!(runner.skipped(), 0);
    }
}
