//! Portfolio-level aggregation and scenario revaluation.

pub mod portfolio;

pub use portfolio::{Portfolio, StrategyLine};
