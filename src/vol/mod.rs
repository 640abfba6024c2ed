//! Volatility tools.

pub mod implied;

pub use implied::ImpliedVolSolver;
