//! Quantleg is an option-strategy analytics library: European option pricing, multi-leg
//! strategy construction, portfolio risk aggregation, structure recognition, implied
//! volatility and delta-hedging simulation.
//!
//! The crate is organised around one pricing capability, [`core::PricingMethod`], implemented
//! by a closed-form Black-Scholes engine and a Monte Carlo engine. Everything above it
//! (portfolios, analyzers, the hedging simulator) takes the method as an argument, so the
//! same book can be valued side by side under both.
//!
//! References used across modules include:
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 13, 15, 19.
//! - Glasserman (2004) for Monte Carlo estimators and common random numbers.
//!
//! Numerical considerations:
//! - Black-Scholes kernels are not guarded against zero volatility or zero maturity.
//!   [`instruments::EuropeanOption::validate`] checks inputs before pricing.
//! - Vega, theta and rho units differ between engines. Black-Scholes reports vega and rho
//!   per point and theta per calendar day; Monte Carlo reports vega per unit of volatility.
//! - Monte Carlo results are sampling-driven; seeded engines are exactly reproducible.
//!
//! # Feature Flags
//! - `parallel` (default): Rayon-powered Monte Carlo chunks and hedging paths. Seeded
//!   results are identical with and without it.
//!
//! # Quick Start
//! Price a call and check put-call parity:
//! ```rust
//! use quantleg::prelude::*;
//!
//! let market = MarketSnapshot::builder()
//!     .spot(100.0)
//!     .rate(0.02)
//!     .flat_vol(0.20)
//!     .build()
//!     .unwrap();
//! let bs = BlackScholesEngine::new();
//! let call = bs.price(&market.call(100.0, 1.0));
//! let put = bs.price(&market.put(100.0, 1.0));
//!
//! assert!((call + 100.0 * (-0.02_f64).exp() - put - 100.0).abs() < 1e-6);
//! ```
//!
//! Build a portfolio and recognise what it holds:
//! ```rust
//! use quantleg::prelude::*;
//!
//! let market = MarketSnapshot::builder().spot(100.0).flat_vol(0.25).build().unwrap();
//! let mut book = Portfolio::new();
//! book.add_strategy(Strategy::iron_condor(&market, 80.0, 90.0, 110.0, 120.0, 0.5).unwrap(), 1);
//!
//! let names = StructureDetector::new().detect_names(&book.legs());
//! assert!(names.iter().any(|n| n == "Iron Condor"));
//!
//! let greeks = book.greeks(&BlackScholesEngine::new());
//! assert!(greeks.gamma < 0.0);
//! ```
//!
//! Invert implied volatility:
//! ```rust
//! use quantleg::prelude::*;
//!
//! let option = EuropeanOption::put(100.0, 95.0, 0.01, 0.0, 0.75, 0.2);
//! let quote = BlackScholesEngine::new().price(&option.with_volatility(0.31));
//! let sigma = ImpliedVolSolver::default().solve(&option, quote).unwrap();
//! assert!((sigma - 0.31).abs() < 1e-6);
//! ```

pub mod analysis;
pub mod core;
pub mod engines;
pub mod hedging;
pub mod instruments;
pub mod market;
pub mod math;
pub mod payoff;
pub mod risk;
pub mod structures;
pub mod vol;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::analysis::{CapitalRequirement, PortfolioAnalyzer, interpret_greeks};
    pub use crate::core::*;
    pub use crate::engines::analytic::BlackScholesEngine;
    pub use crate::engines::monte_carlo::MonteCarloEngine;
    pub use crate::hedging::{DeltaHedgingResult, DeltaHedgingSimulator, HedgingConfig};
    pub use crate::instruments::*;
    pub use crate::market::MarketSnapshot;
    pub use crate::payoff::{PayoffEngine, PayoffPoint};
    pub use crate::risk::Portfolio;
    pub use crate::structures::{StructureDetector, StructureKind, StructureMatch};
    pub use crate::vol::ImpliedVolSolver;
}
