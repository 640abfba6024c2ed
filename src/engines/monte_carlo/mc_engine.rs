//! Monte Carlo pricing of European options under risk-neutral GBM.
//!
//! Terminal prices are sampled exactly, `S_T = S0 exp((r - q - vol^2/2) T + vol sqrt(T) Z)`,
//! with `Z` drawn by Box-Muller. Paths are split into a fixed number of chunks, each with
//! its own generator seeded from the run's base seed, so results do not depend on how many
//! worker threads execute the chunks.
//!
//! Greeks are bump-and-revalue finite differences on copies of the option. All revaluations
//! belonging to one Greek share a base seed (common random numbers), which keeps the
//! differences from drowning in sampling noise. Without a configured seed, every `price`
//! call draws fresh, independent paths.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

use crate::core::{PricingError, PricingMethod};
use crate::engines::analytic::black_scholes::DAYS_PER_YEAR;
use crate::instruments::EuropeanOption;
use crate::math::fast_rng::{BoxMuller, FastRngKind, resolve_base_seed, stream_seed};

/// Number of independent generator streams a run is split into.
const NUM_CHUNKS: usize = 64;
/// Relative spot bump for delta and gamma.
const SPOT_BUMP_REL: f64 = 0.01;
/// Absolute volatility bump for vega.
const VOL_BUMP: f64 = 0.01;
/// Absolute rate bump for rho.
const RATE_BUMP: f64 = 0.01;
/// One calendar day in years.
const THETA_BUMP: f64 = 1.0 / DAYS_PER_YEAR;

/// Monte Carlo engine for European vanilla options.
///
/// # Examples
/// ```
/// use quantleg::core::PricingMethod;
/// use quantleg::engines::monte_carlo::MonteCarloEngine;
/// use quantleg::instruments::EuropeanOption;
///
/// let engine = MonteCarloEngine::new(20_000).unwrap().with_seed(7);
/// let call = EuropeanOption::call(100.0, 100.0, 0.02, 0.0, 1.0, 0.2);
/// let a = engine.price(&call);
/// let b = engine.price(&call);
/// assert_eq!(a.to_bits(), b.to_bits());
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MonteCarloEngine {
    num_paths: usize,
    seed: Option<u64>,
    #[serde(default)]
    rng_kind: FastRngKind,
    #[serde(default)]
    antithetic: bool,
}

#[inline]
fn split_paths(n_paths: usize, n_chunks: usize) -> Vec<usize> {
    let chunks = n_chunks.max(1);
    let base = n_paths / chunks;
    let rem = n_paths % chunks;
    (0..chunks)
        .map(|i| if i < rem { base + 1 } else { base })
        .filter(|&n| n > 0)
        .collect()
}

/// Sum and sum of squares of discounted-payoff samples for one chunk.
fn simulate_chunk(
    option: &EuropeanOption,
    drift: f64,
    diffusion: f64,
    samples: usize,
    antithetic: bool,
    sampler: &mut BoxMuller,
) -> (f64, f64) {
    let spot = option.spot();
    let terminal_payoff = |z: f64| option.payoff(spot * (drift + diffusion * z).exp());

    let mut sum = 0.0_f64;
    let mut sum_sq = 0.0_f64;
    for _ in 0..samples {
        let z = sampler.next_normal();
        let x = if antithetic {
            0.5 * (terminal_payoff(z) + terminal_payoff(-z))
        } else {
            terminal_payoff(z)
        };
        sum += x;
        sum_sq += x * x;
    }
    (sum, sum_sq)
}

impl MonteCarloEngine {
    /// Creates an unseeded engine simulating `num_paths` terminal prices per valuation.
    ///
    /// # Errors
    /// Returns [`PricingError::InvalidInput`] when `num_paths == 0`.
    pub fn new(num_paths: usize) -> Result<Self, PricingError> {
        if num_paths == 0 {
            return Err(PricingError::InvalidInput(
                "num_paths must be > 0".to_string(),
            ));
        }
        Ok(Self {
            num_paths,
            seed: None,
            rng_kind: FastRngKind::default(),
            antithetic: false,
        })
    }

    /// Fixes the base seed; every valuation then replays the same draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Chooses RNG backend for path simulation.
    pub fn with_rng_kind(mut self, rng_kind: FastRngKind) -> Self {
        self.rng_kind = rng_kind;
        self
    }

    /// Pairs each draw `Z` with `-Z`. Halves the number of generator draws per path count.
    pub fn with_antithetic(mut self, antithetic: bool) -> Self {
        self.antithetic = antithetic;
        self
    }

    pub fn num_paths(&self) -> usize {
        self.num_paths
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Price estimate and its standard error from one run driven by `base_seed`.
    fn run(&self, option: &EuropeanOption, base_seed: u64) -> (f64, f64) {
        let maturity = option.maturity();
        let vol = option.volatility();
        let drift = (option.rate() - option.dividend_yield() - 0.5 * vol * vol) * maturity;
        let diffusion = vol * maturity.sqrt();
        let discount = (-option.rate() * maturity).exp();

        let samples = if self.antithetic {
            self.num_paths.div_ceil(2)
        } else {
            self.num_paths
        };
        let chunks = split_paths(samples, NUM_CHUNKS);
        let rng_kind = self.rng_kind;
        let antithetic = self.antithetic;

        trace!(
            paths = self.num_paths,
            chunks = chunks.len(),
            seed = base_seed,
            "monte carlo run"
        );

        let simulate = |(i, n): (usize, &usize)| {
            let mut sampler = BoxMuller::from_seed(rng_kind, stream_seed(base_seed, i));
            simulate_chunk(option, drift, diffusion, *n, antithetic, &mut sampler)
        };

        #[cfg(feature = "parallel")]
        let partials: Vec<(f64, f64)> = chunks.par_iter().enumerate().map(simulate).collect();
        #[cfg(not(feature = "parallel"))]
        let partials: Vec<(f64, f64)> = chunks.iter().enumerate().map(simulate).collect();

        let (sum, sum_sq) = partials
            .iter()
            .fold((0.0, 0.0), |(s, sq), (ps, psq)| (s + ps, sq + psq));

        let n = samples as f64;
        let mean = sum / n;
        let var = if samples > 1 {
            ((sum_sq - n * mean * mean) / (n - 1.0)).max(0.0)
        } else {
            0.0
        };

        (discount * mean, discount * (var / n).sqrt())
    }

    /// Price together with its Monte Carlo standard error.
    pub fn price_with_stderr(&self, option: &EuropeanOption) -> (f64, f64) {
        self.run(option, resolve_base_seed(self.seed))
    }

    fn price_with_seed(&self, option: &EuropeanOption, seed: u64) -> f64 {
        self.run(option, seed).0
    }
}

impl PricingMethod for MonteCarloEngine {
    fn name(&self) -> &str {
        "Monte Carlo"
    }

    fn price(&self, option: &EuropeanOption) -> f64 {
        self.price_with_stderr(option).0
    }

    /// Central difference on spot, bump = 1% of spot.
    fn delta(&self, option: &EuropeanOption) -> f64 {
        let seed = resolve_base_seed(self.seed);
        let h = option.spot() * SPOT_BUMP_REL;
        let up = self.price_with_seed(&option.with_spot(option.spot() + h), seed);
        let dn = self.price_with_seed(&option.with_spot(option.spot() - h), seed);
        (up - dn) / (2.0 * h)
    }

    /// Second-order central difference on spot, bump = 1% of spot.
    fn gamma(&self, option: &EuropeanOption) -> f64 {
        let seed = resolve_base_seed(self.seed);
        let h = option.spot() * SPOT_BUMP_REL;
        let up = self.price_with_seed(&option.with_spot(option.spot() + h), seed);
        let mid = self.price_with_seed(option, seed);
        let dn = self.price_with_seed(&option.with_spot(option.spot() - h), seed);
        (up - 2.0 * mid + dn) / (h * h)
    }

    /// Forward difference on volatility, per unit of vol (not rescaled).
    fn vega(&self, option: &EuropeanOption) -> f64 {
        let seed = resolve_base_seed(self.seed);
        let up = self.price_with_seed(
            &option.with_volatility(option.volatility() + VOL_BUMP),
            seed,
        );
        let base = self.price_with_seed(option, seed);
        (up - base) / VOL_BUMP
    }

    /// Vega is per unit of vol.
    fn vega_per_point(&self) -> f64 {
        0.01
    }

    /// Value change over one calendar day; 0 when a day or less remains.
    fn theta(&self, option: &EuropeanOption) -> f64 {
        if option.maturity() <= THETA_BUMP {
            return 0.0;
        }
        let seed = resolve_base_seed(self.seed);
        let shorter =
            self.price_with_seed(&option.with_maturity(option.maturity() - THETA_BUMP), seed);
        let base = self.price_with_seed(option, seed);
        shorter - base
    }

    /// Forward difference on rate, per percentage point.
    fn rho(&self, option: &EuropeanOption) -> f64 {
        let seed = resolve_base_seed(self.seed);
        let up = self.price_with_seed(&option.with_rate(option.rate() + RATE_BUMP), seed);
        let base = self.price_with_seed(option, seed);
        (up - base) / RATE_BUMP * 0.01
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::analytic::BlackScholesEngine;

    fn atm_call() -> EuropeanOption {
        EuropeanOption::call(100.0, 100.0, 0.02, 0.0, 1.0, 0.2)
    }

    #[test]
    fn rejects_zero_paths() {
        assert!(MonteCarloEngine::new(0).is_err());
    }

    #[test]
    fn split_paths_covers_every_path() {
        let parts = split_paths(1_001, 64);
        assert_eq!(parts.iter().sum::<usize>(), 1_001);
        assert_eq!(split_paths(3, 64), vec![1, 1, 1]);
    }

    #[test]
    fn mc_call_converges_to_black_scholes_within_four_stderr() {
        let engine = MonteCarloEngine::new(200_000).unwrap().with_seed(42);
        let option = atm_call();
        let (price, stderr) = engine.price_with_stderr(&option);
        let bs = BlackScholesEngine::new().price(&option);
        assert!(
            (price - bs).abs() <= 4.0 * stderr + 1e-3,
            "mc={price} bs={bs} stderr={stderr}"
        );
    }

    #[test]
    fn antithetic_has_lower_stderr_than_plain_mc() {
        let option = atm_call();
        let (_, plain) = MonteCarloEngine::new(100_000)
            .unwrap()
            .with_seed(3)
            .price_with_stderr(&option);
        let (_, anti) = MonteCarloEngine::new(100_000)
            .unwrap()
            .with_seed(3)
            .with_antithetic(true)
            .price_with_stderr(&option);
        assert!(anti < plain, "antithetic={anti} plain={plain}");
    }

    #[test]
    fn seeded_greeks_are_reproducible() {
        let engine = MonteCarloEngine::new(20_000).unwrap().with_seed(11);
        let option = atm_call();
        let a = engine.greeks(&option);
        let b = engine.greeks(&option);
        assert_eq!(a, b);
    }

    #[test]
    fn unseeded_runs_sample_independently() {
        let engine = MonteCarloEngine::new(5_000).unwrap();
        let option = atm_call();
        let a = engine.price(&option);
        let b = engine.price(&option);
        assert_ne!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn theta_is_zero_inside_the_last_day() {
        let engine = MonteCarloEngine::new(1_000).unwrap().with_seed(1);
        let option = atm_call().with_maturity(0.5 / 365.0);
        assert_eq!(engine.theta(&option), 0.0);
    }

    #[test]
    fn greeks_track_closed_form_with_common_random_numbers() {
        let engine = MonteCarloEngine::new(200_000).unwrap().with_seed(5);
        let bs = BlackScholesEngine::new();
        let option = atm_call();

        assert!((engine.delta(&option) - bs.delta(&option)).abs() < 0.02);
        // Vega is raw per unit of vol here; the closed-form engine reports per vol point.
        assert!((engine.vega(&option) - 100.0 * bs.vega(&option)).abs() < 2.0);
        assert!((engine.rho(&option) - bs.rho(&option)).abs() < 0.05);
        assert!((engine.theta(&option) - bs.theta(&option)).abs() < 0.01);
    }

    #[test]
    fn expiry_prices_to_intrinsic() {
        let engine = MonteCarloEngine::new(100).unwrap().with_seed(2);
        let option = EuropeanOption::put(90.0, 100.0, 0.02, 0.0, 0.0, 0.2);
        assert_eq!(engine.price(&option), 10.0);
    }
}
