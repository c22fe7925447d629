//! Momentum-tilted weight strategy.
//!
//! Scales each period's exposure by the sign and strength of the trailing
//! cumulative return, so that weights co-move with subsequent returns when
//! momentum persists. This is the active arm of the study: a persistent
//! tilt shows up as a positive covariance between weights and returns.

use serde::{Deserialize, Serialize};

use crate::strategy::{WeightContext, WeightStrategy};

/// Tiered weight levels keyed to trailing-return strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumWeights {
    /// Weight when the trailing return exceeds `threshold`.
    pub strong_up: f64,
    /// Weight for a positive trailing return below `threshold`.
    pub mild_up: f64,
    /// Weight for a negative trailing return above `-threshold`.
    pub mild_down: f64,
    /// Weight when the trailing return falls below `-threshold`.
    pub strong_down: f64,
    /// Absolute trailing-return level separating mild from strong tiers.
    pub threshold: f64,
}

impl Default for MomentumWeights {
    fn default() -> Self {
        Self {
            strong_up: 1.3,
            mild_up: 1.1,
            mild_down: 0.9,
            strong_down: 0.7,
            threshold: 0.05,
        }
    }
}

impl MomentumWeights {
    /// Map a trailing return to its weight tier.
    pub fn weight_for(&self, trailing_return: f64) -> f64 {
        if trailing_return > self.threshold {
            self.strong_up
        } else if trailing_return > 0.0 {
            self.mild_up
        } else if trailing_return > -self.threshold {
            self.mild_down
        } else {
            self.strong_down
        }
    }
}

/// Momentum-tilted periodic investment.
///
/// Neutral (weight 1.0) until the lookback window fills.
#[derive(Debug, Clone)]
pub struct MomentumTilt {
    lookback: usize,
    weights: MomentumWeights,
}

impl MomentumTilt {
    /// Create a strategy tilting on the `lookback`-period trailing return.
    pub fn new(lookback: usize, weights: MomentumWeights) -> Self {
        assert!(lookback > 0, "Lookback must be positive");
        Self { lookback, weights }
    }

    /// Create with default parameters (5-day lookback, default tiers).
    pub fn default_params() -> Self {
        Self::new(5, MomentumWeights::default())
    }
}

impl WeightStrategy for MomentumTilt {
    fn name(&self) -> &str {
        "Momentum DCA"
    }

    fn weight(&mut self, ctx: &WeightContext<'_>) -> f64 {
        match ctx.trailing_return(self.lookback) {
            Some(trailing) => self.weights.weight_for(trailing),
            None => 1.0,
        }
    }

    fn warmup_period(&self) -> usize {
        self.lookback
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("lookback".to_string(), self.lookback.to_string()),
            (
                "threshold".to_string(),
                format!("{:.1}%", self.weights.threshold * 100.0),
            ),
            (
                "tiers".to_string(),
                format!(
                    "{:.2}/{:.2}/{:.2}/{:.2}",
                    self.weights.strong_up,
                    self.weights.mild_up,
                    self.weights.mild_down,
                    self.weights.strong_down
                ),
            ),
        ]
    }
}
