//! European option contract used throughout the library.
//!
//! [`EuropeanOption`] bundles the contract terms (side, strike, maturity) with the market
//! inputs it is priced against (spot, rate, dividend yield, volatility). All fields are
//! fixed at construction. Volatility is the only input expected to move after the fact
//! (calibration, scenario shocks); it changes through [`EuropeanOption::with_volatility`],
//! which returns a new value instead of mutating a shared one.
//!
//! `maturity == 0` is accepted and means "at expiry": only [`EuropeanOption::payoff`] and
//! [`EuropeanOption::intrinsic`] are meaningful there. Closed-form Greeks are undefined at
//! zero volatility or zero maturity; [`EuropeanOption::validate`] reports both.

use crate::core::{OptionType, PricingError};

/// European vanilla option with its pricing inputs.
///
/// # Examples
/// ```
/// use quantleg::core::OptionType;
/// use quantleg::instruments::EuropeanOption;
///
/// let call = EuropeanOption::call(100.0, 105.0, 0.02, 0.0, 1.0, 0.2);
/// assert_eq!(call.option_type(), OptionType::Call);
/// assert_eq!(call.payoff(120.0), 15.0);
/// assert!(call.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EuropeanOption {
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend_yield: f64,
    maturity: f64,
    volatility: f64,
}

impl EuropeanOption {
    /// Builds an option from spot `S0`, strike `K`, rate `r`, dividend yield `q`,
    /// maturity `T` in years and volatility `sigma`.
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        rate: f64,
        dividend_yield: f64,
        maturity: f64,
        volatility: f64,
    ) -> Self {
        Self {
            option_type,
            spot,
            strike,
            rate,
            dividend_yield,
            maturity,
            volatility,
        }
    }

    pub fn call(
        spot: f64,
        strike: f64,
        rate: f64,
        dividend_yield: f64,
        maturity: f64,
        volatility: f64,
    ) -> Self {
        Self::new(
            OptionType::Call,
            spot,
            strike,
            rate,
            dividend_yield,
            maturity,
            volatility,
        )
    }

    pub fn put(
        spot: f64,
        strike: f64,
        rate: f64,
        dividend_yield: f64,
        maturity: f64,
        volatility: f64,
    ) -> Self {
        Self::new(
            OptionType::Put,
            spot,
            strike,
            rate,
            dividend_yield,
            maturity,
            volatility,
        )
    }

    #[inline]
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    #[inline]
    pub fn is_call(&self) -> bool {
        self.option_type.is_call()
    }

    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    #[inline]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    /// Time to expiry in years.
    #[inline]
    pub fn maturity(&self) -> f64 {
        self.maturity
    }

    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Copy with a different volatility. The calibration channel.
    #[must_use]
    pub fn with_volatility(&self, volatility: f64) -> Self {
        Self { volatility, ..*self }
    }

    /// Copy re-anchored at another spot level.
    #[must_use]
    pub fn with_spot(&self, spot: f64) -> Self {
        Self { spot, ..*self }
    }

    #[must_use]
    pub fn with_rate(&self, rate: f64) -> Self {
        Self { rate, ..*self }
    }

    /// Copy with a different time to expiry.
    #[must_use]
    pub fn with_maturity(&self, maturity: f64) -> Self {
        Self { maturity, ..*self }
    }

    /// Terminal payoff for one long unit at underlying level `spot_at_expiry`.
    #[inline]
    pub fn payoff(&self, spot_at_expiry: f64) -> f64 {
        self.option_type.payoff(spot_at_expiry, self.strike)
    }

    /// Payoff if exercised against the current spot.
    #[inline]
    pub fn intrinsic(&self) -> f64 {
        self.payoff(self.spot)
    }

    /// Checks the preconditions of the closed-form and simulation engines.
    ///
    /// # Errors
    /// Returns [`PricingError::InvalidInput`] when:
    /// - any input is non-finite
    /// - `spot <= 0`, `strike <= 0` or `volatility <= 0`
    /// - `maturity < 0`
    ///
    /// `maturity == 0` passes; it is the expiry edge case.
    pub fn validate(&self) -> Result<(), PricingError> {
        let fields = [
            self.spot,
            self.strike,
            self.rate,
            self.dividend_yield,
            self.maturity,
            self.volatility,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(PricingError::InvalidInput(
                "option inputs must be finite".to_string(),
            ));
        }
        if self.spot <= 0.0 {
            return Err(PricingError::InvalidInput(
                "option spot must be > 0".to_string(),
            ));
        }
        if self.strike <= 0.0 {
            return Err(PricingError::InvalidInput(
                "option strike must be > 0".to_string(),
            ));
        }
        if self.volatility <= 0.0 {
            return Err(PricingError::InvalidInput(
                "option volatility must be > 0".to_string(),
            ));
        }
        if self.maturity < 0.0 {
            return Err(PricingError::InvalidInput(
                "option maturity must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for EuropeanOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(K={}, T={})",
            self.option_type, self.strike, self.maturity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bumped_copies_leave_original_untouched() {
        let base = EuropeanOption::put(100.0, 95.0, 0.01, 0.02, 0.5, 0.3);
        let bumped = base.with_volatility(0.31).with_spot(101.0);

        assert_eq!(base.volatility(), 0.3);
        assert_eq!(base.spot(), 100.0);
        assert_eq!(bumped.volatility(), 0.31);
        assert_eq!(bumped.spot(), 101.0);
        assert_eq!(bumped.strike(), 95.0);
        assert_eq!(bumped.maturity(), 0.5);
    }

    #[test]
    fn payoff_is_intrinsic_at_expiry() {
        let call = EuropeanOption::call(100.0, 100.0, 0.0, 0.0, 0.0, 0.2);
        let put = EuropeanOption::put(100.0, 100.0, 0.0, 0.0, 0.0, 0.2);
        assert_eq!(call.payoff(80.0), 0.0);
        assert_eq!(call.payoff(120.0), 20.0);
        assert_eq!(put.payoff(80.0), 20.0);
        assert_eq!(put.payoff(120.0), 0.0);
        assert_eq!(call.intrinsic(), 0.0);
    }

    #[test]
    fn validate_flags_each_precondition() {
        let ok = EuropeanOption::call(100.0, 100.0, 0.02, 0.0, 1.0, 0.2);
        assert!(ok.validate().is_ok());
        assert!(ok.with_maturity(0.0).validate().is_ok());
        assert!(ok.with_maturity(-0.1).validate().is_err());
        assert!(ok.with_volatility(0.0).validate().is_err());
        assert!(ok.with_spot(0.0).validate().is_err());
        assert!(ok.with_rate(f64::NAN).validate().is_err());
        assert!(
            EuropeanOption::call(100.0, -1.0, 0.02, 0.0, 1.0, 0.2)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn display_names_side_strike_and_maturity() {
        let put = EuropeanOption::put(100.0, 90.0, 0.0, 0.0, 0.5, 0.2);
        assert_eq!(put.to_string(), "Put(K=90, T=0.5)");
    }
}
