//! Instrument definitions.

pub mod strategy;
pub mod vanilla;

pub use strategy::{Leg, Strategy, StrategyKind};
pub use vanilla::EuropeanOption;
