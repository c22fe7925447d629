//! Weight strategy trait and related utilities.

use crate::data::PricePoint;

/// Context provided to weight strategies during simulation.
#[derive(Debug)]
pub struct WeightContext<'a> {
    /// Current period index.
    pub index: usize,
    /// Full price series; only entries up to `index` are meaningful input.
    pub prices: &'a [PricePoint],
    /// Per-period simple returns aligned with `prices`.
    pub returns: &'a [f64],
}

impl<'a> WeightContext<'a> {
    /// Close price of the current period.
    pub fn close(&self) -> f64 {
        self.prices[self.index].close
    }

    /// Close price `lookback` periods back, if available.
    pub fn close_at(&self, lookback: usize) -> Option<f64> {
        if lookback <= self.index {
            Some(self.prices[self.index - lookback].close)
        } else {
            None
        }
    }

    /// Cumulative return over the last `lookback` periods, if available.
    pub fn trailing_return(&self, lookback: usize) -> Option<f64> {
        let past = self.close_at(lookback)?;
        if past == 0.0 {
            return None;
        }
        Some(self.close() / past - 1.0)
    }

    /// Simple return of the current period.
    pub fn current_return(&self) -> f64 {
        self.returns[self.index]
    }
}

/// Trait for strategies that scale each period's market exposure.
///
/// A strategy observes the price history up to the current period and emits
/// a capital-allocation multiplier, nominally near 1.0. The covariance
/// between these weights and the asset returns is exactly what the
/// decomposition engine measures.
pub trait WeightStrategy: Send + Sync {
    /// Name of the strategy.
    fn name(&self) -> &str;

    /// Weight for the current period.
    fn weight(&mut self, ctx: &WeightContext<'_>) -> f64;

    /// Periods needed before the strategy leaves its neutral weight.
    fn warmup_period(&self) -> usize {
        0
    }

    /// Strategy parameters as key-value pairs for logging.
    fn parameters(&self) -> Vec<(String, String)> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn prices(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                PricePoint::new(
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::days(i as i64),
                    *c,
                )
            })
            .collect()
    }

    #[test]
    fn test_context_accessors() {
        let prices = prices(&[100.0, 102.0, 105.0, 103.0]);
        let returns = crate::data::simple_returns(&prices);
        let ctx = WeightContext {
            index: 3,
            prices: &prices,
            returns: &returns,
        };

        assert_eq!(ctx.close(), 103.0);
        assert_eq!(ctx.close_at(2), Some(102.0));
        assert_eq!(ctx.close_at(4), None);

        let trailing = ctx.trailing_return(3).unwrap();
        assert!((trailing - 0.03).abs() < 1e-12);
        assert!(ctx.trailing_return(4).is_none());
    }
}
