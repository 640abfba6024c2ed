//! Discrete delta-hedging replication under GBM.
//!
//! Each path starts from the replicating portfolio `(delta0, price0 - delta0 * S0)` given by
//! the caller's pricing method, then walks `steps` equal time increments. After every
//! increment the cash account accrues interest (and the dividend yield on the shares held),
//! and, except at expiry, the share holding is rebalanced to the Black-Scholes delta of a
//! fresh option slice at the new spot and remaining maturity. Proportional transaction
//! costs are charged on every rebalance, the initial hedge is free. The hedge is not unwound
//! at expiry either: the shares are marked at the terminal spot and no liquidation cost is
//! charged.
//!
//! Net P&L per path is the final replicating portfolio value minus the option payoff, so it
//! is already net of costs. Paths use independent generators seeded from the run's base
//! seed, which makes a seeded run reproducible with or without the `parallel` feature.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::{PricingError, PricingMethod};
use crate::engines::analytic::black_scholes_delta;
use crate::instruments::EuropeanOption;
use crate::math::fast_rng::{BoxMuller, FastRngKind, resolve_base_seed, stream_seed};

/// Simulation settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HedgingConfig {
    /// Rebalancing intervals per path.
    pub steps: usize,
    /// Number of simulated paths.
    pub paths: usize,
    /// Cost per unit of notional traded, e.g. `0.001` for 10 bps.
    #[serde(default)]
    pub transaction_cost: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub rng_kind: FastRngKind,
}

impl HedgingConfig {
    pub fn new(steps: usize, paths: usize) -> Self {
        Self {
            steps,
            paths,
            transaction_cost: 0.0,
            seed: None,
            rng_kind: FastRngKind::default(),
        }
    }

    #[must_use]
    pub fn with_cost(mut self, transaction_cost: f64) -> Self {
        self.transaction_cost = transaction_cost;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_rng_kind(mut self, rng_kind: FastRngKind) -> Self {
        self.rng_kind = rng_kind;
        self
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        if self.steps < 2 {
            return Err(PricingError::InvalidInput("steps must be >= 2".to_string()));
        }
        if self.paths < 1 {
            return Err(PricingError::InvalidInput("paths must be >= 1".to_string()));
        }
        if !self.transaction_cost.is_finite() || self.transaction_cost < 0.0 {
            return Err(PricingError::InvalidInput(
                "transaction cost must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// P&L statistics of a hedging run.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeltaHedgingResult {
    pub paths: usize,
    pub steps: usize,
    pub mean_pnl: f64,
    /// Sample standard deviation (zero for a single path).
    pub std_pnl: f64,
    pub mean_transaction_cost: f64,
    pub pnl_p05: f64,
    pub pnl_p95: f64,
    pub min_pnl: f64,
    pub max_pnl: f64,
}

/// Delta-hedging simulator.
///
/// # Examples
/// ```
/// use quantleg::engines::analytic::BlackScholesEngine;
/// use quantleg::hedging::{DeltaHedgingSimulator, HedgingConfig};
/// use quantleg::instruments::EuropeanOption;
///
/// let call = EuropeanOption::call(100.0, 100.0, 0.02, 0.0, 0.5, 0.2);
/// let sim = DeltaHedgingSimulator::new(HedgingConfig::new(50, 500).with_seed(1)).unwrap();
/// let result = sim.simulate(&call, &BlackScholesEngine::new()).unwrap();
///
/// assert!(result.mean_pnl.abs() < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct DeltaHedgingSimulator {
    config: HedgingConfig,
}

struct PathOutcome {
    pnl: f64,
    cost: f64,
}

impl DeltaHedgingSimulator {
    /// # Errors
    /// Returns [`PricingError::InvalidInput`] when the configuration is invalid.
    pub fn new(config: HedgingConfig) -> Result<Self, PricingError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HedgingConfig {
        &self.config
    }

    /// Runs all paths for a short position in `option` hedged with the underlying.
    ///
    /// `method` supplies the initial price and delta. Rebalancing deltas are Black-Scholes.
    pub fn simulate(
        &self,
        option: &EuropeanOption,
        method: &dyn PricingMethod,
    ) -> Result<DeltaHedgingResult, PricingError> {
        option.validate()?;
        if option.maturity() <= 0.0 {
            return Err(PricingError::InvalidInput(
                "maturity must be > 0 to hedge".to_string(),
            ));
        }

        let HedgingConfig {
            steps,
            paths,
            transaction_cost,
            seed,
            rng_kind,
        } = self.config.clone();
        let base_seed = resolve_base_seed(seed);
        let price0 = method.price(option);
        let delta0 = method.delta(option);

        tracing::debug!(
            method = method.name(),
            paths,
            steps,
            seed = base_seed,
            "delta hedging run"
        );

        let run_path = |p: usize| {
            let mut sampler = BoxMuller::from_seed(rng_kind, stream_seed(base_seed, p));
            hedge_path(
                option,
                price0,
                delta0,
                steps,
                transaction_cost,
                &mut sampler,
            )
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<PathOutcome> = (0..paths).into_par_iter().map(run_path).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<PathOutcome> = (0..paths).map(run_path).collect();

        let result = summarize(&outcomes, steps);
        tracing::debug!(
            mean_pnl = result.mean_pnl,
            std_pnl = result.std_pnl,
            "delta hedging done"
        );
        Ok(result)
    }
}

fn hedge_path(
    option: &EuropeanOption,
    price0: f64,
    delta0: f64,
    steps: usize,
    transaction_cost: f64,
    sampler: &mut BoxMuller,
) -> PathOutcome {
    let maturity = option.maturity();
    let (r, q, vol) = (option.rate(), option.dividend_yield(), option.volatility());
    let dt = maturity / steps as f64;
    let drift = (r - q - 0.5 * vol * vol) * dt;
    let diffusion = vol * dt.sqrt();
    let growth = (r * dt).exp();
    let dividend = (q * dt).exp() - 1.0;

    let mut spot = option.spot();
    let mut delta = delta0;
    let mut cash = price0 - delta0 * spot;
    let mut cost_paid = 0.0;

    for step in 1..=steps {
        spot *= (drift + diffusion * sampler.next_normal()).exp();
        cash = cash * growth + delta * spot * dividend;
        if step == steps {
            break;
        }

        let remaining = maturity - step as f64 * dt;
        let new_delta = black_scholes_delta(&option.with_spot(spot).with_maturity(remaining));
        let traded = new_delta - delta;
        cash -= traded * spot;
        if transaction_cost > 0.0 {
            let cost = transaction_cost * traded.abs() * spot;
            cash -= cost;
            cost_paid += cost;
        }
        delta = new_delta;
    }

    PathOutcome {
        pnl: delta * spot + cash - option.payoff(spot),
        cost: cost_paid,
    }
}

/// Linear interpolation between closest ranks of sorted data.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
}

fn summarize(outcomes: &[PathOutcome], steps: usize) -> DeltaHedgingResult {
    let n = outcomes.len() as f64;
    let mean_pnl = outcomes.iter().map(|o| o.pnl).sum::<f64>() / n;
    let mean_transaction_cost = outcomes.iter().map(|o| o.cost).sum::<f64>() / n;
    let std_pnl = if outcomes.len() > 1 {
        let ss: f64 = outcomes.iter().map(|o| (o.pnl - mean_pnl).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    let mut sorted: Vec<f64> = outcomes.iter().map(|o| o.pnl).collect();
    sorted.sort_by(f64::total_cmp);

    DeltaHedgingResult {
        paths: outcomes.len(),
        steps,
        mean_pnl,
        std_pnl,
        mean_transaction_cost,
        pnl_p05: quantile(&sorted, 0.05),
        pnl_p95: quantile(&sorted, 0.95),
        min_pnl: sorted[0],
        max_pnl: sorted[sorted.len() - 1],
    }
}
