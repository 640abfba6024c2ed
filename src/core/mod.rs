//! Core traits, common domain types, and library-wide error structures.

pub mod engine;
pub mod types;

pub use engine::PricingMethod;
pub use types::*;

/// Standardized Greeks container used by engine results.
///
/// Units follow the engine that produced the record. See [`PricingMethod`] for the
/// per-engine conventions on vega, theta and rho.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Greeks {
    /// First derivative to spot.
    pub delta: f64,
    /// Second derivative to spot.
    pub gamma: f64,
    /// First derivative to volatility.
    pub vega: f64,
    /// First derivative to time.
    pub theta: f64,
    /// First derivative to rate.
    pub rho: f64,
}

impl Greeks {
    /// Multiplies every sensitivity by a signed position size.
    pub fn scaled(self, quantity: f64) -> Self {
        Self {
            delta: self.delta * quantity,
            gamma: self.gamma * quantity,
            vega: self.vega * quantity,
            theta: self.theta * quantity,
            rho: self.rho * quantity,
        }
    }
}

impl std::ops::Add for Greeks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            delta: self.delta + rhs.delta,
            gamma: self.gamma + rhs.gamma,
            vega: self.vega + rhs.vega,
            theta: self.theta + rhs.theta,
            rho: self.rho + rhs.rho,
        }
    }
}

impl std::iter::Sum for Greeks {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, g| acc + g)
    }
}

/// Engine and model errors surfaced by the API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    /// Input validation error.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Price-minus-target has the same sign at both ends of the search interval.
    #[error(
        "root not bracketed on [{low}, {high}]: f(low)={f_low}, f(high)={f_high}"
    )]
    RootNotBracketed {
        low: f64,
        high: f64,
        f_low: f64,
        f_high: f64,
    },
    /// Payoff export could not be written.
    #[error("export failed: {0}")]
    Export(String),
}

impl From<csv::Error> for PricingError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

impl From<std::io::Error> for PricingError {
    fn from(err: std::io::Error) -> Self {
        Self::Export(err.to_string())
    }
}
