//! Volatility bands.

use rotation_core::error::IndicatorError;
use rotation_core::traits::MultiOutputIndicator;
use serde::{Deserialize, Serialize};

use crate::simd::mean_std_simd;

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    /// Upper band
    pub upper: f64,
    /// Middle band (SMA)
    pub middle: f64,
    /// Lower band
    pub lower: f64,
    /// Bandwidth ((upper - lower) / middle)
    pub bandwidth: f64,
    /// %B ((price - lower) / (upper - lower))
    pub percent_b: f64,
}

impl BollingerOutput {
    fn from_stats(mean: f64, std_dev: f64, multiplier: f64, price: f64) -> Self {
        let upper = mean + multiplier * std_dev;
        let lower = mean - multiplier * std_dev;

        let bandwidth = if mean != 0.0 {
            (upper - lower) / mean
        } else {
            0.0
        };

        let percent_b = if upper != lower {
            (price - lower) / (upper - lower)
        } else {
            0.5
        };

        Self {
            upper,
            middle: mean,
            lower,
            bandwidth,
            percent_b,
        }
    }

    /// Check if price is above upper band.
    pub fn is_overbought(&self, price: f64) -> bool {
        price > self.upper
    }

    /// Check if price is below lower band.
    pub fn is_oversold(&self, price: f64) -> bool {
        price < self.lower
    }
}

/// Bollinger Bands.
///
/// Middle band is the rolling mean; upper and lower bands sit a multiple of
/// the rolling population standard deviation away from it.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    /// Create new Bollinger Bands with default parameters (20, 2.0).
    pub fn new() -> Self {
        Self::with_params(20, 2.0)
    }

    /// Create Bollinger Bands with custom parameters.
    pub fn with_params(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(
            std_dev_multiplier > 0.0,
            "Std dev multiplier must be positive"
        );
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<BollingerOutput> {
        if data.len() < self.period {
            return vec![];
        }

        let period_f64 = self.period as f64;
        let mut result = Vec::with_capacity(data.len() - self.period + 1);

        for (i, window) in data.windows(self.period).enumerate() {
            let mean: f64 = window.iter().sum::<f64>() / period_f64;
            let variance: f64 = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period_f64;
            let price = data[self.period - 1 + i];

            result.push(BollingerOutput::from_stats(
                mean,
                variance.sqrt(),
                self.std_dev_multiplier,
                price,
            ));
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }

    /// Bands for the final window only.
    fn latest(&self, data: &[f64]) -> Result<BollingerOutput, IndicatorError> {
        self.validate_data(data)?;
        let window = &data[data.len() - self.period..];
        let (mean, std_dev) = mean_std_simd(window).ok_or(IndicatorError::InsufficientData {
            required: self.period,
            available: data.len(),
        })?;
        let price = window[window.len() - 1];

        Ok(BollingerOutput::from_stats(
            mean,
            std_dev,
            self.std_dev_multiplier,
            price,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_bands() {
        let bb = BollingerBands::new();
        let data: Vec<f64> = (0..30)
            .map(|i| 100.0 + (i as f64 * 0.1).sin() * 5.0)
            .collect();

        let result = bb.calculate(&data);
        assert_eq!(result.len(), 11);

        for output in &result {
            assert!(output.upper > output.middle);
            assert!(output.middle > output.lower);
            assert!(output.bandwidth > 0.0);
        }
    }

    #[test]
    fn test_latest_matches_last_calculated_window() {
        let bb = BollingerBands::with_params(20, 2.0);
        let data: Vec<f64> = (0..257)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 7.0 + i as f64 * 0.05)
            .collect();

        let full = *bb.calculate(&data).last().unwrap();
        let latest = bb.latest(&data).unwrap();

        assert!((full.upper - latest.upper).abs() < 1e-9);
        assert!((full.lower - latest.lower).abs() < 1e-9);
        assert!((full.percent_b - latest.percent_b).abs() < 1e-9);
    }

    #[test]
    fn test_constant_price_collapses_bands() {
        let bb = BollingerBands::with_params(5, 2.0);
        let latest = bb.latest(&[100.0; 5]).unwrap();

        assert!((latest.upper - 100.0).abs() < 1e-10);
        assert!((latest.lower - 100.0).abs() < 1e-10);
        assert!((latest.percent_b - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_latest_insufficient_data() {
        let bb = BollingerBands::with_params(20, 2.0);
        let err = bb.latest(&[1.0; 19]).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientData {
                required: 20,
                available: 19
            }
        );
    }

    #[test]
    fn test_bollinger_overbought_oversold() {
        let output = BollingerOutput {
            upper: 110.0,
            middle: 100.0,
            lower: 90.0,
            bandwidth: 0.2,
            percent_b: 0.5,
        };

        assert!(output.is_overbought(115.0));
        assert!(!output.is_overbought(110.0));
        assert!(output.is_oversold(85.0));
        assert!(!output.is_oversold(90.0));
    }
}
