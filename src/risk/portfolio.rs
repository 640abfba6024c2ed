//! Portfolio aggregation over raw option lines and strategy lines.
//!
//! A [`Portfolio`] never stores zero-quantity lines. Valuation always goes through a
//! [`PricingMethod`] passed by the caller, so one book can be compared across engines.

use crate::core::{Greeks, PricingMethod};
use crate::instruments::{EuropeanOption, Leg, Strategy};

/// Strategy held in a portfolio with its own signed multiplier.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrategyLine {
    pub strategy: Strategy,
    pub quantity: i64,
}

/// Mutable container of option and strategy positions.
///
/// # Examples
/// ```
/// use quantleg::engines::analytic::BlackScholesEngine;
/// use quantleg::instruments::Strategy;
/// use quantleg::market::MarketSnapshot;
/// use quantleg::risk::Portfolio;
///
/// let market = MarketSnapshot::builder().spot(100.0).rate(0.02).flat_vol(0.2).build().unwrap();
/// let mut book = Portfolio::new();
/// book.add_option(market.call(100.0, 1.0), 2);
/// book.add_strategy(Strategy::straddle(&market, 100.0, 1.0).unwrap(), -1);
///
/// assert_eq!(book.flatten_legs().count(), 3);
/// let delta = book.delta(&BlackScholesEngine::new());
/// assert!(delta.is_finite());
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Portfolio {
    options: Vec<Leg>,
    strategies: Vec<StrategyLine>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of `option`. Zero quantities are dropped.
    pub fn add_option(&mut self, option: EuropeanOption, quantity: i64) {
        if quantity == 0 {
            return;
        }
        self.options.push(Leg::new(option, quantity));
    }

    /// Adds `quantity` units of `strategy`. Zero quantities are dropped.
    pub fn add_strategy(&mut self, strategy: Strategy, quantity: i64) {
        if quantity == 0 {
            return;
        }
        self.strategies.push(StrategyLine { strategy, quantity });
    }

    pub fn option_lines(&self) -> &[Leg] {
        &self.options
    }

    pub fn strategy_lines(&self) -> &[StrategyLine] {
        &self.strategies
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.strategies.is_empty()
    }

    /// Every unit leg with its effective signed quantity.
    ///
    /// Raw option lines come first, then strategy legs in strategy order, each leg's
    /// quantity multiplied by its strategy line's quantity. Borrowing only: calling this
    /// any number of times yields the same sequence.
    pub fn flatten_legs(&self) -> impl Iterator<Item = (&EuropeanOption, i64)> + '_ {
        let raw = self.options.iter().map(|leg| (&leg.option, leg.quantity));
        let nested = self.strategies.iter().flat_map(|line| {
            line.strategy
                .legs()
                .iter()
                .map(move |leg| (&leg.option, leg.quantity * line.quantity))
        });
        raw.chain(nested)
    }

    /// Owned copy of the flattened legs, the input format of the structure detector.
    pub fn legs(&self) -> Vec<Leg> {
        self.flatten_legs()
            .map(|(option, quantity)| Leg::new(*option, quantity))
            .collect()
    }

    fn signed_sum<F>(&self, f: F) -> f64
    where
        F: Fn(&EuropeanOption) -> f64,
    {
        self.flatten_legs()
            .map(|(option, quantity)| quantity as f64 * f(option))
            .sum()
    }

    pub fn price(&self, method: &dyn PricingMethod) -> f64 {
        self.signed_sum(|o| method.price(o))
    }

    pub fn delta(&self, method: &dyn PricingMethod) -> f64 {
        self.signed_sum(|o| method.delta(o))
    }

    pub fn gamma(&self, method: &dyn PricingMethod) -> f64 {
        self.signed_sum(|o| method.gamma(o))
    }

    pub fn vega(&self, method: &dyn PricingMethod) -> f64 {
        self.signed_sum(|o| method.vega(o))
    }

    pub fn theta(&self, method: &dyn PricingMethod) -> f64 {
        self.signed_sum(|o| method.theta(o))
    }

    pub fn rho(&self, method: &dyn PricingMethod) -> f64 {
        self.signed_sum(|o| method.rho(o))
    }

    /// All portfolio Greeks in one pass over the legs.
    pub fn greeks(&self, method: &dyn PricingMethod) -> Greeks {
        self.flatten_legs()
            .map(|(option, quantity)| method.greeks(option).scaled(quantity as f64))
            .sum()
    }

    /// Full-revaluation P&L under relative shocks:
    /// spot moves by `spot * spot_shock_pct`, volatility by `vol * vol_shock_pct`.
    pub fn scenario_pnl(
        &self,
        method: &dyn PricingMethod,
        spot_shock_pct: f64,
        vol_shock_pct: f64,
    ) -> f64 {
        self.signed_sum(|o| {
            let shocked = o
                .with_spot(o.spot() * (1.0 + spot_shock_pct))
                .with_volatility(o.volatility() * (1.0 + vol_shock_pct));
            method.price(&shocked) - method.price(o)
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::engines::analytic::BlackScholesEngine;
    use crate::market::MarketSnapshot;

    fn market() -> MarketSnapshot {
        MarketSnapshot::builder()
            .spot(100.0)
            .rate(0.02)
            .flat_vol(0.2)
            .build()
            .unwrap()
    }

    #[test]
    fn zero_quantity_lines_are_dropped() {
        let m = market();
        let mut book = Portfolio::new();
        book.add_option(m.call(100.0, 1.0), 0);
        book.add_strategy(Strategy::straddle(&m, 100.0, 1.0).unwrap(), 0);
        assert!(book.is_empty());
        assert_eq!(book.flatten_legs().count(), 0);
    }

    #[test]
    fn strategy_quantities_multiply_through() {
        let m = market();
        let mut book = Portfolio::new();
        book.add_option(m.put(95.0, 1.0), -3);
        book.add_strategy(Strategy::butterfly(&m, 100.0, 10.0, 1.0).unwrap(), 2);

        let quantities: Vec<i64> = book.flatten_legs().map(|(_, q)| q).collect();
        assert_eq!(quantities, vec![-3, 2, -4, 2]);
    }

    #[test]
    fn flattening_is_repeatable() {
        let m = market();
        let mut book = Portfolio::new();
        book.add_option(m.call(105.0, 0.5), 1);
        book.add_strategy(Strategy::iron_condor(&m, 80.0, 90.0, 110.0, 120.0, 1.0).unwrap(), -1);

        let first: Vec<(*const EuropeanOption, i64)> = book
            .flatten_legs()
            .map(|(o, q)| (o as *const EuropeanOption, q))
            .collect();
        let second: Vec<(*const EuropeanOption, i64)> = book
            .flatten_legs()
            .map(|(o, q)| (o as *const EuropeanOption, q))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn aggregates_are_signed_sums_of_legs() {
        let m = market();
        let engine = BlackScholesEngine::new();
        let call = m.call(100.0, 1.0);
        let put = m.put(100.0, 1.0);

        let mut book = Portfolio::new();
        book.add_option(call, 2);
        book.add_option(put, -1);

        assert_relative_eq!(
            book.price(&engine),
            2.0 * engine.price(&call) - engine.price(&put),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            book.delta(&engine),
            2.0 * engine.delta(&call) - engine.delta(&put),
            epsilon = 1e-12
        );
        let g = book.greeks(&engine);
        assert_relative_eq!(g.gamma, book.gamma(&engine), epsilon = 1e-12);
        assert_relative_eq!(g.vega, book.vega(&engine), epsilon = 1e-12);
        assert_relative_eq!(g.theta, book.theta(&engine), epsilon = 1e-12);
        assert_relative_eq!(g.rho, book.rho(&engine), epsilon = 1e-12);
    }

    #[test]
    fn long_straddle_gains_on_large_moves() {
        let m = market();
        let engine = BlackScholesEngine::new();
        let mut book = Portfolio::new();
        book.add_strategy(Strategy::straddle(&m, 100.0, 1.0).unwrap(), 1);

        assert!(book.scenario_pnl(&engine, 0.25, 0.0) > 0.0);
        assert!(book.scenario_pnl(&engine, -0.25, 0.0) > 0.0);
        assert!(book.scenario_pnl(&engine, 0.0, 0.5) > 0.0);
        assert_relative_eq!(book.scenario_pnl(&engine, 0.0, 0.0), 0.0, epsilon = 1e-12);
    }
}
