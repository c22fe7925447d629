//! Fixed-weight strategy.
//!
//! Holds the allocation multiplier constant, which makes it the pure
//! passive control arm: with a constant weight the covariance between
//! weights and returns is identically zero, so any decomposition of this
//! strategy attributes everything to the passive component.

use crate::strategy::{WeightContext, WeightStrategy};

/// Constant-weight periodic investment.
#[derive(Debug, Clone)]
pub struct FixedWeight {
    weight: f64,
}

impl FixedWeight {
    /// Create a strategy holding `weight` every period.
    pub fn new(weight: f64) -> Self {
        assert!(weight.is_finite(), "Weight must be finite");
        Self { weight }
    }

    /// Full market exposure, the standard passive baseline.
    pub fn unit() -> Self {
        Self::new(1.0)
    }
}

impl WeightStrategy for FixedWeight {
    fn name(&self) -> &str {
        "Passive DCA"
    }

    fn weight(&mut self, _ctx: &WeightContext<'_>) -> f64 {
        self.weight
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![("weight".to_string(), format!("{:.2}", self.weight))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PricePoint;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_fixed_weight_is_constant() {
        let prices = vec![PricePoint::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            100.0,
        )];
        let returns = vec![0.0];
        let ctx = WeightContext {
            index: 0,
            prices: &prices,
            returns: &returns,
        };

        let mut strategy = FixedWeight::unit();
        assert_eq!(strategy.weight(&ctx), 1.0);
        assert_eq!(strategy.name(), "Passive DCA");
    }

    #[test]
    #[should_panic(expected = "Weight must be finite")]
    fn test_non_finite_weight_panics() {
        FixedWeight::new(f64::NAN);
    }
}
