//! Pricing method abstraction shared by the closed-form and simulation engines.

use crate::core::Greeks;
use crate::instruments::EuropeanOption;

/// Capability interface implemented by every pricing engine.
///
/// Portfolios, strategies, the analyzer and the hedging simulator receive a
/// `&dyn PricingMethod` instead of binding to one engine, so the same book can be valued
/// side by side under Black-Scholes and Monte Carlo.
///
/// # Units
/// | Greek | [`BlackScholesEngine`](crate::engines::analytic::BlackScholesEngine) | [`MonteCarloEngine`](crate::engines::monte_carlo::MonteCarloEngine) |
/// |---|---|---|
/// | vega | per 1 vol point (x0.01) | per unit of vol (raw) |
/// | theta | per calendar day | per calendar day |
/// | rho | per 1 rate point (x0.01) | per 1 rate point |
///
/// Vega differs by a factor of 100 between the two engines. Callers comparing vegas across
/// engines rescale with [`vega_per_point`](Self::vega_per_point).
pub trait PricingMethod: Send + Sync {
    /// Short engine label used in diagnostics.
    fn name(&self) -> &str;

    fn price(&self, option: &EuropeanOption) -> f64;

    fn delta(&self, option: &EuropeanOption) -> f64;

    fn gamma(&self, option: &EuropeanOption) -> f64;

    fn vega(&self, option: &EuropeanOption) -> f64;

    fn theta(&self, option: &EuropeanOption) -> f64;

    fn rho(&self, option: &EuropeanOption) -> f64;

    /// Factor turning this method's vega into a change per one vol point.
    ///
    /// `1.0` when vega is already reported per point.
    fn vega_per_point(&self) -> f64 {
        1.0
    }

    /// All five sensitivities in one record.
    fn greeks(&self, option: &EuropeanOption) -> Greeks {
        Greeks {
            delta: self.delta(option),
            gamma: self.gamma(option),
            vega: self.vega(option),
            theta: self.theta(option),
            rho: self.rho(option),
        }
    }
}
