//! Market snapshot supplied by the caller's market-data layer.
//!
//! A snapshot carries the four numbers the pricing core needs from outside: spot,
//! volatility, continuous dividend yield and the risk-free rate. Maturity is chosen per
//! instrument. Strategy builders and ad-hoc option construction both start from here.

use crate::core::{OptionType, PricingError};
use crate::instruments::EuropeanOption;

/// Flat market state for one underlying.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarketSnapshot {
    /// Spot price.
    pub spot: f64,
    /// Continuously compounded risk-free rate.
    pub rate: f64,
    /// Continuously compounded dividend yield.
    pub dividend_yield: f64,
    /// Flat (historical or implied) volatility.
    pub volatility: f64,
    /// Optional ticker the snapshot was fetched for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
}

impl MarketSnapshot {
    /// Starts a snapshot builder.
    ///
    /// # Examples
    /// ```
    /// use quantleg::market::MarketSnapshot;
    ///
    /// let market = MarketSnapshot::builder()
    ///     .spot(100.0)
    ///     .rate(0.02)
    ///     .flat_vol(0.20)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(market.dividend_yield, 0.0);
    /// ```
    #[inline]
    pub fn builder() -> MarketSnapshotBuilder {
        MarketSnapshotBuilder::default()
    }

    /// Builds a European option on this underlying.
    pub fn option(&self, option_type: OptionType, strike: f64, maturity: f64) -> EuropeanOption {
        EuropeanOption::new(
            option_type,
            self.spot,
            strike,
            self.rate,
            self.dividend_yield,
            maturity,
            self.volatility,
        )
    }

    /// European call on this underlying.
    pub fn call(&self, strike: f64, maturity: f64) -> EuropeanOption {
        self.option(OptionType::Call, strike, maturity)
    }

    /// European put on this underlying.
    pub fn put(&self, strike: f64, maturity: f64) -> EuropeanOption {
        self.option(OptionType::Put, strike, maturity)
    }
}

/// Builder for [`MarketSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshotBuilder {
    spot: Option<f64>,
    rate: Option<f64>,
    dividend_yield: Option<f64>,
    flat_vol: Option<f64>,
    ticker: Option<String>,
}

impl MarketSnapshotBuilder {
    /// Sets the spot price.
    #[inline]
    pub fn spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    /// Sets the flat risk-free rate.
    #[inline]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Sets the continuous dividend yield.
    #[inline]
    pub fn dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = Some(dividend_yield);
        self
    }

    /// Sets the flat volatility.
    #[inline]
    pub fn flat_vol(mut self, vol: f64) -> Self {
        self.flat_vol = Some(vol);
        self
    }

    pub fn ticker<S: Into<String>>(mut self, ticker: S) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    /// Validates and builds a [`MarketSnapshot`].
    ///
    /// # Errors
    /// Returns [`PricingError::InvalidInput`] when spot or volatility is missing,
    /// non-finite or non-positive, or when rate/dividend yield are non-finite.
    pub fn build(self) -> Result<MarketSnapshot, PricingError> {
        let spot = self
            .spot
            .ok_or_else(|| PricingError::InvalidInput("market spot is required".to_string()))?;
        if !spot.is_finite() || spot <= 0.0 {
            return Err(PricingError::InvalidInput(
                "market spot must be finite and > 0".to_string(),
            ));
        }

        let volatility = self.flat_vol.ok_or_else(|| {
            PricingError::InvalidInput("market flat_vol is required".to_string())
        })?;
        if !volatility.is_finite() || volatility <= 0.0 {
            return Err(PricingError::InvalidInput(
                "market flat_vol must be finite and > 0".to_string(),
            ));
        }

        let rate = self.rate.unwrap_or(0.0);
        let dividend_yield = self.dividend_yield.unwrap_or(0.0);
        if !rate.is_finite() || !dividend_yield.is_finite() {
            return Err(PricingError::InvalidInput(
                "market rate and dividend_yield must be finite".to_string(),
            ));
        }

        Ok(MarketSnapshot {
            spot,
            rate,
            dividend_yield,
            volatility,
            ticker: self.ticker,
        })
    }
}
