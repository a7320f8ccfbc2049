//! Exponential moving average.

use rotation_core::error::IndicatorError;
use rotation_core::traits::Indicator;

/// How the first EMA values are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seeding {
    /// First value is the SMA of the first `period` samples.
    Sma,
    /// Weight-normalised average over all samples seen so far, so a value
    /// exists from the first sample onward.
    Adjusted,
}

/// Exponential Moving Average (EMA).
///
/// Gives more weight to recent prices using an exponential decay with
/// smoothing factor `2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
    seeding: Seeding,
}

impl Ema {
    /// Create an SMA-seeded EMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            seeding: Seeding::Sma,
        }
    }

    /// Create an adjusted EMA with the given span.
    ///
    /// Each value is `Σ (1-α)^i · x[t-i] / Σ (1-α)^i` over every sample up to
    /// `t`. The span only sets the decay, so series shorter than the span
    /// still produce values.
    pub fn adjusted(span: usize) -> Self {
        assert!(span > 0, "Span must be greater than 0");
        Self {
            period: span,
            multiplier: 2.0 / (span as f64 + 1.0),
            seeding: Seeding::Adjusted,
        }
    }

    /// Smoothing factor.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    fn calculate_seeded(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);

        let initial_sma: f64 = data[..self.period].iter().sum::<f64>() / self.period as f64;
        result.push(initial_sma);

        let mut ema = initial_sma;
        let one_minus_mult = 1.0 - self.multiplier;

        for &price in &data[self.period..] {
            ema = price * self.multiplier + ema * one_minus_mult;
            result.push(ema);
        }

        result
    }

    fn calculate_adjusted(&self, data: &[f64]) -> Vec<f64> {
        let decay = 1.0 - self.multiplier;
        let mut numerator = 0.0;
        let mut denominator = 0.0;

        data.iter()
            .map(|&price| {
                numerator = price + decay * numerator;
                denominator = 1.0 + decay * denominator;
                numerator / denominator
            })
            .collect()
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        match self.seeding {
            Seeding::Sma => self.calculate_seeded(data),
            Seeding::Adjusted => self.calculate_adjusted(data),
        }
    }

    fn period(&self) -> usize {
        match self.seeding {
            Seeding::Sma => self.period,
            Seeding::Adjusted => 1,
        }
    }

    fn name(&self) -> &str {
        "EMA"
    }

    fn latest(&self, data: &[f64]) -> Result<f64, IndicatorError> {
        self.validate_data(data)?;
        match self.seeding {
            Seeding::Sma => self.calculate_seeded(data).pop(),
            Seeding::Adjusted => {
                let decay = 1.0 - self.multiplier;
                let (numerator, denominator) = data
                    .iter()
                    .fold((0.0, 0.0), |(num, den), &price| {
                        (price + decay * num, 1.0 + decay * den)
                    });
                Some(numerator / denominator)
            }
        }
        .ok_or(IndicatorError::InsufficientData {
            required: self.period(),
            available: data.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_ema() {
        let ema = Ema::new(3);
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema.calculate(&data);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 1e-10); // Initial SMA
        // mult = 2/(3+1) = 0.5, so 4 * 0.5 + 2 * 0.5 = 3.0
        assert!((result[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_adjusted_ema_matches_weighted_average() {
        let ema = Ema::adjusted(3);
        let data = vec![1.0, 2.0, 3.0];
        let result = ema.calculate(&data);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 1.0).abs() < 1e-10);
        // alpha = 0.5: (2 + 0.5*1) / (1 + 0.5) = 5/3
        assert!((result[1] - 5.0 / 3.0).abs() < 1e-10);
        // (3 + 0.5*2 + 0.25*1) / (1 + 0.5 + 0.25) = 4.25 / 1.75
        assert!((result[2] - 4.25 / 1.75).abs() < 1e-10);
    }

    #[test]
    fn test_adjusted_ema_shorter_than_span() {
        let ema = Ema::adjusted(50);
        let latest = ema.latest(&[10.0, 10.0, 10.0]).unwrap();
        assert!((latest - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_latest_matches_calculate() {
        let data: Vec<f64> = (0..200).map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0).collect();

        for ema in [Ema::new(20), Ema::adjusted(20)] {
            let full = ema.calculate(&data);
            let latest = ema.latest(&data).unwrap();
            assert!((full.last().unwrap() - latest).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fast_tracks_rising_prices_closer() {
        let data: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let fast = Ema::adjusted(10).latest(&data).unwrap();
        let slow = Ema::adjusted(40).latest(&data).unwrap();
        assert!(fast > slow);
    }

    #[test]
    fn test_seeded_insufficient_data() {
        assert!(Ema::new(5).latest(&[1.0, 2.0]).is_err());
        assert!(Ema::adjusted(5).latest(&[]).is_err());
    }
}
