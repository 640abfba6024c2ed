//! Terminal payoff profiles and their CSV export.
//!
//! The export format is fixed: `;` separated, header `S_T;Payoff;Profit;PremiumInitiale`,
//! numbers written with `.` as decimal separator and no grouping (shortest round-trip
//! representation, so `100.0` is written as `100`).

use std::io;

use crate::core::PricingError;
use crate::instruments::Leg;

/// Header row of the payoff CSV export.
pub const CSV_HEADER: [&str; 4] = ["S_T", "Payoff", "Profit", "PremiumInitiale"];

/// One point of a payoff profile.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PayoffPoint {
    /// Underlying price at expiry.
    pub spot: f64,
    /// Signed payoff of all legs.
    pub payoff: f64,
    /// `payoff - premium`.
    pub profit: f64,
    /// Net premium paid upfront (negative for a net credit).
    pub premium: f64,
}

/// Stateless payoff evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayoffEngine;

impl PayoffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Signed payoff of `legs` if the underlying ends at `spot_at_expiry`.
    pub fn payoff(&self, legs: &[Leg], spot_at_expiry: f64) -> f64 {
        legs.iter().map(|leg| leg.payoff(spot_at_expiry)).sum()
    }

    /// `n` evenly spaced points from `start` to `end`, both included.
    pub fn linspace(start: f64, end: f64, n: usize) -> Result<Vec<f64>, PricingError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(PricingError::InvalidInput(
                "grid bounds must be finite".to_string(),
            ));
        }
        if n < 2 {
            return Err(PricingError::InvalidInput(
                "grid needs at least two points".to_string(),
            ));
        }
        if end <= start {
            return Err(PricingError::InvalidInput(
                "grid end must exceed grid start".to_string(),
            ));
        }
        let step = (end - start) / (n - 1) as f64;
        Ok((0..n)
            .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
            .collect())
    }

    /// Payoff and profit of `legs` at every grid spot.
    pub fn payoff_grid(&self, legs: &[Leg], grid: &[f64], premium: f64) -> Vec<PayoffPoint> {
        grid.iter()
            .map(|&spot| {
                let payoff = self.payoff(legs, spot);
                PayoffPoint {
                    spot,
                    payoff,
                    profit: payoff - premium,
                    premium,
                }
            })
            .collect()
    }

    /// Spots where profit crosses zero, linearly interpolated between grid points.
    ///
    /// Grid points with exactly zero profit are reported as they are; a flat zero segment
    /// yields its endpoints.
    pub fn breakevens(points: &[PayoffPoint]) -> Vec<f64> {
        let mut out: Vec<f64> = Vec::new();
        let mut push = |x: f64| {
            if out.last().is_none_or(|&last| (x - last).abs() > 1e-12) {
                out.push(x);
            }
        };
        for (i, p) in points.iter().enumerate() {
            if p.profit == 0.0 {
                push(p.spot);
                continue;
            }
            if let Some(next) = points.get(i + 1)
                && next.profit != 0.0
                && p.profit.signum() != next.profit.signum()
            {
                let w = p.profit / (p.profit - next.profit);
                push(p.spot + w * (next.spot - p.spot));
            }
        }
        out
    }

    /// Largest profit on the grid.
    pub fn max_profit(points: &[PayoffPoint]) -> Option<f64> {
        points.iter().map(|p| p.profit).reduce(f64::max)
    }

    /// Worst (most negative) profit on the grid.
    pub fn max_loss(points: &[PayoffPoint]) -> Option<f64> {
        points.iter().map(|p| p.profit).reduce(f64::min)
    }

    /// Writes the header and one row per point.
    pub fn write_csv<W: io::Write>(points: &[PayoffPoint], writer: W) -> Result<(), PricingError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b';')
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        wtr.write_record(CSV_HEADER)?;
        for p in points {
            wtr.write_record([
                format_number(p.spot),
                format_number(p.payoff),
                format_number(p.profit),
                format_number(p.premium),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Same as [`write_csv`](Self::write_csv), collected into a string.
    ///
    /// # Examples
    /// ```
    /// use quantleg::instruments::{EuropeanOption, Leg};
    /// use quantleg::payoff::PayoffEngine;
    ///
    /// let call = EuropeanOption::call(100.0, 100.0, 0.02, 0.0, 1.0, 0.2);
    /// let engine = PayoffEngine::new();
    /// let points = engine.payoff_grid(&[Leg::new(call, 1)], &[100.0, 120.0], 5.0);
    ///
    /// let csv = PayoffEngine::to_csv_string(&points).unwrap();
    /// assert_eq!(csv, "S_T;Payoff;Profit;PremiumInitiale\n100;0;-5;5\n120;20;15;5\n");
    /// ```
    pub fn to_csv_string(points: &[PayoffPoint]) -> Result<String, PricingError> {
        let mut buf = Vec::new();
        Self::write_csv(points, &mut buf)?;
        String::from_utf8(buf).map_err(|e| PricingError::Export(e.to_string()))
    }
}

/// Shortest round-trip decimal, with negative zero written as `0`.
fn format_number(x: f64) -> String {
    if x == 0.0 {
        "0".to_string()
    } else {
        x.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::{EuropeanOption, Strategy};
    use crate::market::MarketSnapshot;
    use approx::assert_abs_diff_eq;

    fn long_call() -> Vec<Leg> {
        vec![Leg::new(
            EuropeanOption::call(100.0, 100.0, 0.02, 0.0, 1.0, 0.2),
            1,
        )]
    }

    #[test]
    fn linspace_includes_both_ends() {
        let grid = PayoffEngine::linspace(50.0, 150.0, 11).unwrap();
        assert_eq!(grid.len(), 11);
        assert_eq!(grid[0], 50.0);
        assert_eq!(grid[10], 150.0);
        assert_abs_diff_eq!(grid[3], 80.0, epsilon = 1e-12);
        assert!(PayoffEngine::linspace(50.0, 150.0, 1).is_err());
        assert!(PayoffEngine::linspace(150.0, 50.0, 5).is_err());
    }

    #[test]
    fn csv_rows_use_plain_decimal_format() {
        let engine = PayoffEngine::new();
        let points = engine.payoff_grid(&long_call(), &[100.0, 110.5, 120.0], 5.0);
        let csv = PayoffEngine::to_csv_string(&points).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "S_T;Payoff;Profit;PremiumInitiale",
                "100;0;-5;5",
                "110.5;10.5;5.5;5",
                "120;20;15;5",
            ]
        );
    }

    #[test]
    fn negative_zero_is_written_as_zero() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-2.25), "-2.25");
    }

    #[test]
    fn long_call_breakeven_is_strike_plus_premium() {
        let engine = PayoffEngine::new();
        let grid = PayoffEngine::linspace(80.0, 130.0, 51).unwrap();
        let points = engine.payoff_grid(&long_call(), &grid, 5.0);
        let be = PayoffEngine::breakevens(&points);
        assert_eq!(be.len(), 1);
        assert_abs_diff_eq!(be[0], 105.0, epsilon = 1e-9);
        assert_abs_diff_eq!(PayoffEngine::max_loss(&points).unwrap(), -5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(PayoffEngine::max_profit(&points).unwrap(), 25.0, epsilon = 1e-12);
    }

    #[test]
    fn straddle_has_two_breakevens() {
        let market = MarketSnapshot::builder()
            .spot(100.0)
            .flat_vol(0.2)
            .build()
            .unwrap();
        let straddle = Strategy::straddle(&market, 100.0, 1.0).unwrap();
        let engine = PayoffEngine::new();
        let grid = PayoffEngine::linspace(50.0, 150.0, 101).unwrap();
        let points = engine.payoff_grid(straddle.legs(), &grid, 8.0);
        let be = PayoffEngine::breakevens(&points);
        assert_eq!(be.len(), 2);
        assert_abs_diff_eq!(be[0], 92.0, epsilon = 1e-9);
        assert_abs_diff_eq!(be[1], 108.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_grid_has_no_extremes() {
        assert!(PayoffEngine::max_profit(&[]).is_none());
        assert!(PayoffEngine::max_loss(&[]).is_none());
        let csv = PayoffEngine::to_csv_string(&[]).unwrap();
        assert_eq!(csv, "S_T;Payoff;Profit;PremiumInitiale\n");
    }
}
