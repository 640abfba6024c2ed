//! Closed-form Black-Scholes-Merton pricing with continuous dividend yield.
//!
//! The `bs_*` kernels return raw sensitivities (per unit of spot, vol, year and rate).
//! [`BlackScholesEngine`] wraps them with the reporting conventions used across the crate:
//! vega and rho per percentage point, theta per calendar day.
//!
//! The kernels do not guard `vol == 0` or `expiry == 0`; both make `d1`/`d2` divide by
//! zero. Validate with [`EuropeanOption::validate`] and keep `maturity > 0` before pricing.

use crate::core::{OptionType, PricingMethod};
use crate::instruments::EuropeanOption;
use crate::math::{normal_cdf, normal_pdf};

/// Days per year used to express theta per calendar day.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Analytic Black-Scholes engine for European vanilla options.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackScholesEngine;

impl BlackScholesEngine {
    /// Creates a Black-Scholes engine instance.
    pub fn new() -> Self {
        Self
    }
}

#[inline]
fn d1_d2(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> (f64, f64) {
    let sig_sqrt_t = vol * expiry.sqrt();
    let d1 =
        ((spot / strike).ln() + (rate - dividend_yield + 0.5 * vol * vol) * expiry) / sig_sqrt_t;
    (d1, d1 - sig_sqrt_t)
}

#[inline]
pub fn bs_price(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    let (d1, d2) = d1_d2(spot, strike, rate, dividend_yield, vol, expiry);
    let df_r = (-rate * expiry).exp();
    let df_q = (-dividend_yield * expiry).exp();
    match option_type {
        OptionType::Call => spot * df_q * normal_cdf(d1) - strike * df_r * normal_cdf(d2),
        OptionType::Put => strike * df_r * normal_cdf(-d2) - spot * df_q * normal_cdf(-d1),
    }
}

#[inline]
pub fn bs_delta(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    let (d1, _) = d1_d2(spot, strike, rate, dividend_yield, vol, expiry);
    let df_q = (-dividend_yield * expiry).exp();
    match option_type {
        OptionType::Call => df_q * normal_cdf(d1),
        OptionType::Put => df_q * (normal_cdf(d1) - 1.0),
    }
}

/// Same for calls and puts.
#[inline]
pub fn bs_gamma(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    let (d1, _) = d1_d2(spot, strike, rate, dividend_yield, vol, expiry);
    let df_q = (-dividend_yield * expiry).exp();
    df_q * normal_pdf(d1) / (spot * vol * expiry.sqrt())
}

/// Raw vega, per unit of volatility.
#[inline]
pub fn bs_vega(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    let (d1, _) = d1_d2(spot, strike, rate, dividend_yield, vol, expiry);
    let df_q = (-dividend_yield * expiry).exp();
    spot * df_q * normal_pdf(d1) * expiry.sqrt()
}

/// Raw theta, per year.
#[inline]
pub fn bs_theta(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    let (d1, d2) = d1_d2(spot, strike, rate, dividend_yield, vol, expiry);
    let sqrt_t = expiry.sqrt();
    let df_q = (-dividend_yield * expiry).exp();
    let df_r = (-rate * expiry).exp();
    match option_type {
        OptionType::Call => {
            -spot * df_q * normal_pdf(d1) * vol / (2.0 * sqrt_t)
                + dividend_yield * spot * df_q * normal_cdf(d1)
                - rate * strike * df_r * normal_cdf(d2)
        }
        OptionType::Put => {
            -spot * df_q * normal_pdf(d1) * vol / (2.0 * sqrt_t)
                - dividend_yield * spot * df_q * normal_cdf(-d1)
                + rate * strike * df_r * normal_cdf(-d2)
        }
    }
}

/// Raw rho, per unit of rate.
#[inline]
pub fn bs_rho(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
    expiry: f64,
) -> f64 {
    let (_, d2) = d1_d2(spot, strike, rate, dividend_yield, vol, expiry);
    let df_r = (-rate * expiry).exp();
    match option_type {
        OptionType::Call => strike * expiry * df_r * normal_cdf(d2),
        OptionType::Put => -strike * expiry * df_r * normal_cdf(-d2),
    }
}

/// Black-Scholes price of `option`.
#[inline]
pub fn black_scholes_price(option: &EuropeanOption) -> f64 {
    bs_price(
        option.option_type(),
        option.spot(),
        option.strike(),
        option.rate(),
        option.dividend_yield(),
        option.volatility(),
        option.maturity(),
    )
}

/// Black-Scholes delta of `option`.
#[inline]
pub fn black_scholes_delta(option: &EuropeanOption) -> f64 {
    bs_delta(
        option.option_type(),
        option.spot(),
        option.strike(),
        option.rate(),
        option.dividend_yield(),
        option.volatility(),
        option.maturity(),
    )
}

/// Raw (per unit of vol) Black-Scholes vega of `option`.
#[inline]
pub fn black_scholes_raw_vega(option: &EuropeanOption) -> f64 {
    bs_vega(
        option.spot(),
        option.strike(),
        option.rate(),
        option.dividend_yield(),
        option.volatility(),
        option.maturity(),
    )
}

impl PricingMethod for BlackScholesEngine {
    fn name(&self) -> &str {
        "Black-Scholes"
    }

    fn price(&self, option: &EuropeanOption) -> f64 {
        black_scholes_price(option)
    }

    fn delta(&self, option: &EuropeanOption) -> f64 {
        black_scholes_delta(option)
    }

    fn gamma(&self, option: &EuropeanOption) -> f64 {
        bs_gamma(
            option.spot(),
            option.strike(),
            option.rate(),
            option.dividend_yield(),
            option.volatility(),
            option.maturity(),
        )
    }

    /// Per one percentage point of volatility.
    fn vega(&self, option: &EuropeanOption) -> f64 {
        black_scholes_raw_vega(option) * 0.01
    }

    /// Per calendar day.
    fn theta(&self, option: &EuropeanOption) -> f64 {
        bs_theta(
            option.option_type(),
            option.spot(),
            option.strike(),
            option.rate(),
            option.dividend_yield(),
            option.volatility(),
            option.maturity(),
        ) / DAYS_PER_YEAR
    }

    /// Per one percentage point of rate.
    fn rho(&self, option: &EuropeanOption) -> f64 {
        bs_rho(
            option.option_type(),
            option.spot(),
            option.strike(),
            option.rate(),
            option.dividend_yield(),
            option.volatility(),
            option.maturity(),
        ) * 0.01
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn atm(option_type: OptionType) -> EuropeanOption {
        EuropeanOption::new(option_type, 100.0, 100.0, 0.02, 0.0, 1.0, 0.2)
    }

    #[test]
    fn atm_call_matches_reference_price() {
        // S=K=100, r=2%, q=0, T=1, vol=20%.
        let px = BlackScholesEngine::new().price(&atm(OptionType::Call));
        assert_relative_eq!(px, 8.916_037_278_572_539, epsilon = 1e-9);
    }

    #[test]
    fn put_call_parity_with_dividends() {
        let engine = BlackScholesEngine::new();
        for &(s, k, r, q, t, v) in &[
            (100.0, 100.0, 0.02, 0.0, 1.0, 0.2),
            (120.0, 95.0, 0.05, 0.03, 0.4, 0.35),
            (80.0, 110.0, 0.0, 0.01, 2.5, 0.15),
        ] {
            let call = EuropeanOption::call(s, k, r, q, t, v);
            let put = EuropeanOption::put(s, k, r, q, t, v);
            let lhs = engine.price(&call) + k * (-r * t).exp();
            let rhs = engine.price(&put) + s * (-q * t).exp();
            assert!((lhs - rhs).abs() < 1e-6, "parity gap {}", lhs - rhs);
        }
    }

    #[test]
    fn greek_bounds_for_atm_options() {
        let engine = BlackScholesEngine::new();
        let call = engine.greeks(&atm(OptionType::Call));
        let put = engine.greeks(&atm(OptionType::Put));

        assert!(call.delta > 0.0 && call.delta < 1.0);
        assert!(put.delta > -1.0 && put.delta < 0.0);
        assert!(call.gamma > 0.0 && put.gamma > 0.0);
        assert_relative_eq!(call.gamma, put.gamma, epsilon = 1e-15);
        assert!(call.vega > 0.0 && put.vega > 0.0);
        assert!(call.rho > 0.0 && put.rho < 0.0);
        assert!(call.theta < 0.0);
    }

    #[test]
    fn reporting_units_are_scaled() {
        let engine = BlackScholesEngine::new();
        let option = atm(OptionType::Call);
        let raw_vega = black_scholes_raw_vega(&option);
        let raw_theta = bs_theta(OptionType::Call, 100.0, 100.0, 0.02, 0.0, 0.2, 1.0);
        let raw_rho = bs_rho(OptionType::Call, 100.0, 100.0, 0.02, 0.0, 0.2, 1.0);

        assert_relative_eq!(engine.vega(&option), raw_vega * 0.01, epsilon = 1e-15);
        assert_relative_eq!(engine.theta(&option), raw_theta / 365.0, epsilon = 1e-15);
        assert_relative_eq!(engine.rho(&option), raw_rho * 0.01, epsilon = 1e-15);
    }

    #[test]
    fn greeks_record_matches_individual_sensitivities() {
        let engine = BlackScholesEngine::new();
        let option = EuropeanOption::put(95.0, 100.0, 0.03, 0.01, 0.5, 0.3);
        let g = engine.greeks(&option);
        assert_eq!(g.delta, engine.delta(&option));
        assert_eq!(g.gamma, engine.gamma(&option));
        assert_eq!(g.vega, engine.vega(&option));
        assert_eq!(g.theta, engine.theta(&option));
        assert_eq!(g.rho, engine.rho(&option));
        assert_eq!(engine.vega_per_point(), 1.0);
    }

    #[test]
    fn closed_form_delta_matches_finite_difference() {
        let option = EuropeanOption::put(105.0, 100.0, 0.03, 0.01, 0.75, 0.25);
        let h = 1e-4;
        let up = black_scholes_price(&option.with_spot(105.0 + h));
        let dn = black_scholes_price(&option.with_spot(105.0 - h));
        assert_relative_eq!(
            black_scholes_delta(&option),
            (up - dn) / (2.0 * h),
            epsilon = 1e-7
        );
    }

    #[test]
    fn zero_volatility_is_not_silently_patched() {
        let option = atm(OptionType::Call).with_volatility(0.0);
        assert!(!BlackScholesEngine::new().gamma(&option).is_finite());
    }
}
