//! Black-Scholes implied-volatility inversion.
//!
//! Newton-Raphson on vega from a clamped starting guess, with a bracketed bisection
//! fallback when vega collapses or Newton runs out of iterations. The option passed in is
//! never modified: each iteration prices a fresh copy built with
//! [`EuropeanOption::with_volatility`].

use crate::core::PricingError;
use crate::engines::analytic::{black_scholes_price, black_scholes_raw_vega};
use crate::instruments::EuropeanOption;

/// Starting volatility when the option carries no usable guess.
pub const DEFAULT_GUESS: f64 = 0.20;

/// Newton is abandoned once raw vega drops below this.
pub const MIN_VEGA: f64 = 1e-8;

/// Bisection stops once the bracket is narrower than this.
pub const MIN_BRACKET_WIDTH: f64 = 1e-10;

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImpliedVolSolver {
    pub low: f64,
    pub high: f64,
    /// Absolute pricing error accepted as converged.
    pub tolerance: f64,
    /// Iteration cap applied separately to the Newton and bisection phases.
    pub max_iter: usize,
}

impl Default for ImpliedVolSolver {
    fn default() -> Self {
        Self {
            low: 0.001,
            high: 2.0,
            tolerance: 1e-8,
            max_iter: 100,
        }
    }
}

impl ImpliedVolSolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bounds(mut self, low: f64, high: f64) -> Self {
        self.low = low;
        self.high = high;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    fn validate(&self, option: &EuropeanOption, target_price: f64) -> Result<(), PricingError> {
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(PricingError::InvalidInput(
                "target price must be finite and > 0".to_string(),
            ));
        }
        if !option.maturity().is_finite() || option.maturity() <= 0.0 {
            return Err(PricingError::InvalidInput(
                "maturity must be finite and > 0".to_string(),
            ));
        }
        if !(self.low > 0.0 && self.high > self.low && self.high.is_finite()) {
            return Err(PricingError::InvalidInput(
                "volatility bounds must satisfy 0 < low < high".to_string(),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(PricingError::InvalidInput(
                "tolerance must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Volatility that reproduces `target_price` under Black-Scholes.
    ///
    /// The option's own volatility is only the starting guess (`0.20` when it is not a
    /// positive finite number), clamped to `[low, high]`.
    ///
    /// # Errors
    /// - [`PricingError::InvalidInput`] for `target_price <= 0`, `maturity <= 0` or bad bounds.
    /// - [`PricingError::RootNotBracketed`] when Newton fails and the price-minus-target
    ///   function has the same sign at `low` and `high`.
    ///
    /// # Examples
    /// ```
    /// use quantleg::engines::analytic::black_scholes_price;
    /// use quantleg::instruments::EuropeanOption;
    /// use quantleg::vol::ImpliedVolSolver;
    ///
    /// let quoted = EuropeanOption::call(100.0, 105.0, 0.03, 0.0, 0.5, 0.27);
    /// let price = black_scholes_price(&quoted);
    ///
    /// let sigma = ImpliedVolSolver::default()
    ///     .solve(&quoted.with_volatility(0.5), price)
    ///     .unwrap();
    /// assert!((sigma - 0.27).abs() < 1e-6);
    /// ```
    pub fn solve(&self, option: &EuropeanOption, target_price: f64) -> Result<f64, PricingError> {
        self.validate(option, target_price)?;

        let guess = if option.volatility().is_finite() && option.volatility() > 0.0 {
            option.volatility()
        } else {
            DEFAULT_GUESS
        };

        if let Some(sigma) = self.newton(option, target_price, guess.clamp(self.low, self.high)) {
            return Ok(sigma);
        }
        self.bisect(option, target_price)
    }

    /// `None` when Newton gave up or ran out of iterations.
    fn newton(&self, option: &EuropeanOption, target: f64, start: f64) -> Option<f64> {
        let mut sigma = start;
        for iter in 0..self.max_iter {
            let trial = option.with_volatility(sigma);
            let diff = black_scholes_price(&trial) - target;
            if diff.abs() < self.tolerance {
                tracing::debug!(iterations = iter, sigma, "implied vol converged by newton");
                return Some(sigma);
            }
            let vega = black_scholes_raw_vega(&trial);
            if !vega.is_finite() || vega < MIN_VEGA {
                tracing::debug!(iterations = iter, vega, "newton abandoned on flat vega");
                return None;
            }
            sigma = (sigma - diff / vega).clamp(self.low, self.high);
        }
        tracing::debug!(max_iter = self.max_iter, "newton exhausted iterations");
        None
    }

    fn bisect(&self, option: &EuropeanOption, target: f64) -> Result<f64, PricingError> {
        let f = |sigma: f64| black_scholes_price(&option.with_volatility(sigma)) - target;

        let (mut lo, mut hi) = (self.low, self.high);
        let mut f_lo = f(lo);
        let f_hi = f(hi);
        if !(f_lo * f_hi < 0.0) {
            if f_lo == 0.0 {
                return Ok(lo);
            }
            if f_hi == 0.0 {
                return Ok(hi);
            }
            return Err(PricingError::RootNotBracketed {
                low: lo,
                high: hi,
                f_low: f_lo,
                f_high: f_hi,
            });
        }

        tracing::debug!(low = lo, high = hi, "falling back to bisection");
        for iter in 0..self.max_iter {
            let mid = 0.5 * (lo + hi);
            let f_mid = f(mid);
            if f_mid.abs() < self.tolerance || hi - lo < MIN_BRACKET_WIDTH {
                tracing::debug!(iterations = iter, sigma = mid, "implied vol converged by bisection");
                return Ok(mid);
            }
            if f_lo * f_mid <= 0.0 {
                hi = mid;
            } else {
                lo = mid;
                f_lo = f_mid;
            }
        }

        let mid = 0.5 * (lo + hi);
        tracing::warn!(
            sigma = mid,
            width = hi - lo,
            "bisection hit the iteration cap, returning bracket midpoint"
        );
        Ok(mid)
    }
}
