//! Capital usage and plain-language reading of portfolio risk.

use crate::core::{Greeks, PricingError, PricingMethod};
use crate::payoff::PayoffEngine;
use crate::risk::Portfolio;

/// Capital tied up by a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CapitalRequirement {
    /// Signed net premium (positive = net debit).
    pub net_premium: f64,
    /// `max(net_premium, 0)`, paid upfront.
    pub upfront_debit: f64,
    /// Worst terminal payoff shortfall over the scan grid, `max(0, -min payoff)`.
    pub margin: f64,
    /// `upfront_debit + margin`.
    pub total: f64,
}

/// Everything the analyzer knows about one portfolio under one pricing method.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisReport {
    pub method: String,
    pub value: f64,
    pub greeks: Greeks,
    pub capital: CapitalRequirement,
    pub commentary: Vec<String>,
}

/// Portfolio analyzer scanning terminal payoffs on `[low, high] x max strike`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PortfolioAnalyzer {
    pub low_multiple: f64,
    pub high_multiple: f64,
    pub grid_points: usize,
}

impl Default for PortfolioAnalyzer {
    fn default() -> Self {
        Self {
            low_multiple: 0.0,
            high_multiple: 2.0,
            grid_points: 201,
        }
    }
}

impl PortfolioAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_scan_range(mut self, low_multiple: f64, high_multiple: f64) -> Self {
        self.low_multiple = low_multiple;
        self.high_multiple = high_multiple;
        self
    }

    #[must_use]
    pub fn with_grid_points(mut self, grid_points: usize) -> Self {
        self.grid_points = grid_points;
        self
    }

    /// Terminal spot grid scaled on the largest strike (and spot) in the book.
    pub fn scan_grid(&self, portfolio: &Portfolio) -> Result<Vec<f64>, PricingError> {
        let anchor = portfolio
            .flatten_legs()
            .map(|(o, _)| o.strike().max(o.spot()))
            .fold(0.0_f64, f64::max);
        if anchor <= 0.0 {
            return Err(PricingError::InvalidInput(
                "portfolio has no legs to scan".to_string(),
            ));
        }
        PayoffEngine::linspace(
            anchor * self.low_multiple,
            anchor * self.high_multiple,
            self.grid_points,
        )
    }

    /// Upfront debit plus the margin needed to cover the worst terminal payoff.
    ///
    /// Short calls lose without bound; the margin only covers losses inside the scan
    /// range, so widen it for books that are net short upside.
    pub fn capital_requirement(
        &self,
        portfolio: &Portfolio,
        method: &dyn PricingMethod,
    ) -> Result<CapitalRequirement, PricingError> {
        self.capital_for_premium(portfolio, portfolio.price(method))
    }

    fn capital_for_premium(
        &self,
        portfolio: &Portfolio,
        net_premium: f64,
    ) -> Result<CapitalRequirement, PricingError> {
        let grid = self.scan_grid(portfolio)?;
        let legs = portfolio.legs();
        let payoff = PayoffEngine::new();
        let worst = grid
            .iter()
            .map(|&s| payoff.payoff(&legs, s))
            .fold(f64::INFINITY, f64::min);

        let upfront_debit = net_premium.max(0.0);
        let margin = (-worst).max(0.0);
        Ok(CapitalRequirement {
            net_premium,
            upfront_debit,
            margin,
            total: upfront_debit + margin,
        })
    }

    /// Value, Greeks, capital and commentary in one report.
    ///
    /// The book is priced once, so value and net premium always agree. `greeks` keeps the
    /// method's own units; the commentary reads vega per vol point whatever the method.
    pub fn analyze(
        &self,
        portfolio: &Portfolio,
        method: &dyn PricingMethod,
    ) -> Result<AnalysisReport, PricingError> {
        let value = portfolio.price(method);
        let greeks = portfolio.greeks(method);
        let per_point = Greeks {
            vega: greeks.vega * method.vega_per_point(),
            ..greeks
        };
        Ok(AnalysisReport {
            method: method.name().to_string(),
            value,
            greeks,
            capital: self.capital_for_premium(portfolio, value)?,
            commentary: interpret_greeks(&per_point),
        })
    }
}

fn direction(x: f64, up: &'static str, down: &'static str) -> &'static str {
    if x >= 0.0 { up } else { down }
}

/// One line per Greek, in delta, gamma, vega, theta, rho order.
///
/// Expects vega and rho per point and theta per day. Rescale vega with
/// [`PricingMethod::vega_per_point`] first for methods reporting it per unit of vol.
pub fn interpret_greeks(greeks: &Greeks) -> Vec<String> {
    vec![
        format!(
            "Delta {:.4}: the position {} about {:.4} for each 1.00 rise in the underlying",
            greeks.delta,
            direction(greeks.delta, "gains", "loses"),
            greeks.delta.abs()
        ),
        format!(
            "Gamma {:.4}: {} exposure, delta moves by {:.4} per 1.00 move in the underlying",
            greeks.gamma,
            direction(greeks.gamma, "long convexity", "short convexity"),
            greeks.gamma.abs()
        ),
        format!(
            "Vega {:.4}: a one point rise in volatility {} value by {:.4}",
            greeks.vega,
            direction(greeks.vega, "raises", "lowers"),
            greeks.vega.abs()
        ),
        format!(
            "Theta {:.4}: time decay {} {:.4} per day",
            greeks.theta,
            direction(greeks.theta, "earns", "costs"),
            greeks.theta.abs()
        ),
        format!(
            "Rho {:.4}: a one point rise in rates {} value by {:.4}",
            greeks.rho,
            direction(greeks.rho, "raises", "lowers"),
            greeks.rho.abs()
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::analytic::BlackScholesEngine;
    use crate::instruments::Strategy;
    use crate::market::MarketSnapshot;
    use approx::assert_abs_diff_eq;

    fn market() -> MarketSnapshot {
        MarketSnapshot::builder()
            .spot(100.0)
            .rate(0.02)
            .flat_vol(0.2)
            .build()
            .unwrap()
    }

    #[test]
    fn long_premium_book_needs_only_its_debit() {
        let engine = BlackScholesEngine::new();
        let mut book = Portfolio::new();
        book.add_strategy(Strategy::butterfly(&market(), 100.0, 10.0, 1.0).unwrap(), 1);

        let cap = PortfolioAnalyzer::new().capital_requirement(&book, &engine).unwrap();
        assert!(cap.net_premium > 0.0);
        assert_abs_diff_eq!(cap.margin, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cap.total, cap.net_premium, epsilon = 1e-12);
    }

    #[test]
    fn short_condor_margin_is_wing_width() {
        let engine = BlackScholesEngine::new();
        let mut book = Portfolio::new();
        book.add_strategy(
            Strategy::iron_condor(&market(), 80.0, 90.0, 110.0, 120.0, 1.0).unwrap(),
            1,
        );

        let cap = PortfolioAnalyzer::new().capital_requirement(&book, &engine).unwrap();
        assert!(cap.net_premium < 0.0, "condor is a credit");
        assert_abs_diff_eq!(cap.upfront_debit, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cap.margin, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cap.total, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_book_cannot_be_scanned() {
        let engine = BlackScholesEngine::new();
        assert!(
            PortfolioAnalyzer::new()
                .capital_requirement(&Portfolio::new(), &engine)
                .is_err()
        );
    }

    #[test]
    fn commentary_covers_each_greek_with_sign() {
        let lines = interpret_greeks(&Greeks {
            delta: 0.5,
            gamma: -0.02,
            vega: 0.3,
            theta: -0.01,
            rho: -0.2,
        });
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Delta") && lines[0].contains("gains"));
        assert!(lines[1].contains("short convexity"));
        assert!(lines[3].contains("costs"));
        assert!(lines[4].contains("lowers"));
    }

    #[test]
    fn monte_carlo_report_reads_vega_per_point() {
        use crate::engines::monte_carlo::MonteCarloEngine;

        let mut book = Portfolio::new();
        book.add_option(market().call(100.0, 1.0), 1);
        let bs = PortfolioAnalyzer::new()
            .analyze(&book, &BlackScholesEngine::new())
            .unwrap();
        let mc = PortfolioAnalyzer::new()
            .analyze(&book, &MonteCarloEngine::new(100_000).unwrap())
            .unwrap();

        // Raw record keeps the engine's units.
        assert!(mc.greeks.vega > 10.0 * bs.greeks.vega);

        let vega_in = |line: &str| -> f64 {
            line.trim_start_matches("Vega ")
                .split(':')
                .next()
                .unwrap()
                .parse()
                .unwrap()
        };
        let bs_vega = vega_in(&bs.commentary[2]);
        let mc_vega = vega_in(&mc.commentary[2]);
        assert!((mc_vega - bs_vega).abs() < 0.05 * bs_vega, "bs={bs_vega} mc={mc_vega}");

        // Unseeded: one pricing feeds both fields.
        assert_eq!(mc.value, mc.capital.net_premium);
    }

    #[test]
    fn report_names_the_method() {
        let engine = BlackScholesEngine::new();
        let mut book = Portfolio::new();
        book.add_option(market().call(100.0, 1.0), 1);
        let report = PortfolioAnalyzer::new().analyze(&book, &engine).unwrap();
        assert_eq!(report.method, "Black-Scholes");
        assert_eq!(report.commentary.len(), 5);
        assert_abs_diff_eq!(report.value, engine.price(&market().call(100.0, 1.0)), epsilon = 1e-12);
    }
}
