//! Closed-form pricing engines.

pub mod black_scholes;

pub use black_scholes::{
    BlackScholesEngine, black_scholes_delta, black_scholes_price, black_scholes_raw_vega,
};
