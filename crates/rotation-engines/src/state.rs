//! Counters that survive between iterations.

use serde::{Deserialize, Serialize};

/// Signal engine state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    /// Consecutive iterations with the fast EMA above the slow EMA.
    pub supertrend_counter: u32,
}

impl SignalState {
    /// Record one trend observation.
    pub fn observe_trend(&mut self, fast_above_slow: bool) {
        if fast_above_slow {
            self.supertrend_counter += 1;
        } else {
            self.supertrend_counter = 0;
        }
    }
}

/// Rebalance engine state.
///
/// `None` means no iteration has run yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceState {
    pub counter: Option<u32>,
}

impl RebalanceState {
    /// Start an iteration. Returns true (and resets the counter) when a
    /// rebalance is due.
    pub fn begin(&mut self, period: u32) -> bool {
        let due = match self.counter {
            None => true,
            Some(counter) => counter == period,
        };
        if due {
            self.counter = Some(0);
        }
        due
    }

    /// End an iteration.
    pub fn finish(&mut self) {
        self.counter = Some(self.counter.map_or(1, |c| c + 1));
    }
}

/// All durable engine state for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub signal: SignalState,
    pub rebalance: RebalanceState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streak_counts_and_resets() {
        let mut state = SignalState::default();
        for _ in 0..4 {
            state.observe_trend(true);
        }
        assert_eq!(state.supertrend_counter, 4);

        state.observe_trend(false);
        assert_eq!(state.supertrend_counter, 0);
    }

    #[test]
    fn test_rebalance_schedule_never_drifts() {
        let mut state = RebalanceState::default();
        let mut fired = Vec::new();

        for iteration in 1..=35 {
            if state.begin(10) {
                fired.push(iteration);
            }
            state.finish();
        }

        assert_eq!(fired, vec![1, 11, 21, 31]);
    }

    #[test]
    fn test_first_iteration_resets_to_zero() {
        let mut state = RebalanceState::default();
        assert!(state.begin(10));
        assert_eq!(state.counter, Some(0));
        state.finish();
        assert_eq!(state.counter, Some(1));
    }
}
