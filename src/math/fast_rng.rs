use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

/// Generator backend used by the simulation engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FastRngKind {
    #[default]
    Xoshiro256PlusPlus,
    StdRng,
}

#[derive(Debug, Clone)]
pub struct Xoshiro256PlusPlus {
    state: [u64; 4],
}

impl Xoshiro256PlusPlus {
    #[inline]
    pub fn seed_from_u64(seed: u64) -> Self {
        let mut sm = SplitMix64::new(seed);
        let mut state = [0_u64; 4];
        for item in &mut state {
            *item = sm.next_u64();
        }

        if state.iter().all(|&x| x == 0) {
            state[0] = 1;
        }

        Self { state }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.state[0].wrapping_add(self.state[3]))
            .rotate_left(23)
            .wrapping_add(self.state[0]);

        let t = self.state[1] << 17;

        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];

        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);

        result
    }

    /// Uniform in `[0, 1)` with 53 bits of precision.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        let x = self.next_u64() >> 11;
        x as f64 * (1.0 / ((1_u64 << 53) as f64))
    }
}

#[derive(Debug)]
pub enum FastRng {
    Xoshiro256PlusPlus(Xoshiro256PlusPlus),
    StdRng(StdRng),
}

impl FastRng {
    #[inline]
    pub fn from_seed(kind: FastRngKind, seed: u64) -> Self {
        match kind {
            FastRngKind::Xoshiro256PlusPlus => {
                Self::Xoshiro256PlusPlus(Xoshiro256PlusPlus::seed_from_u64(seed))
            }
            FastRngKind::StdRng => Self::StdRng(StdRng::seed_from_u64(seed)),
        }
    }

    #[inline]
    pub fn random_f64(&mut self) -> f64 {
        match self {
            Self::Xoshiro256PlusPlus(rng) => rng.next_f64(),
            Self::StdRng(rng) => rng.random::<f64>(),
        }
    }

    #[inline]
    pub fn random_u64(&mut self) -> u64 {
        match self {
            Self::Xoshiro256PlusPlus(rng) => rng.next_u64(),
            Self::StdRng(rng) => rng.random::<u64>(),
        }
    }

    /// Uniform strictly inside `(0, 1)`.
    ///
    /// Draws of exactly 0 or 1 are discarded and redrawn, never clamped.
    #[inline]
    pub fn random_open01(&mut self) -> f64 {
        open01(|| self.random_f64())
    }
}

/// First draw of `draw` lying strictly inside `(0, 1)`.
#[inline]
fn open01(mut draw: impl FnMut() -> f64) -> f64 {
    loop {
        let u = draw();
        if u > 0.0 && u < 1.0 {
            return u;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    #[inline]
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Seed of stream `stream_index` derived from a base seed.
#[inline]
pub fn stream_seed(base_seed: u64, stream_index: usize) -> u64 {
    SplitMix64::new(base_seed.wrapping_add((stream_index as u64).wrapping_mul(7_919))).next_u64()
}

/// Base seed for one simulation run: the configured seed, or fresh OS-backed entropy.
#[inline]
pub fn resolve_base_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::rng().random::<u64>())
}

/// Box-Muller standard normal sampler.
///
/// Each transform of two uniforms yields two independent normals; the second one is kept
/// for the next call so no draw is wasted.
#[derive(Debug)]
pub struct BoxMuller {
    rng: FastRng,
    spare: Option<f64>,
}

impl BoxMuller {
    pub fn new(rng: FastRng) -> Self {
        Self { rng, spare: None }
    }

    pub fn from_seed(kind: FastRngKind, seed: u64) -> Self {
        Self::new(FastRng::from_seed(kind, seed))
    }

    #[inline]
    pub fn next_normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        let u1 = self.rng.random_open01();
        let u2 = self.rng.random_open01();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = std::f64::consts::TAU * u2;
        self.spare = Some(radius * angle.sin());
        radius * angle.cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xoshiro_same_seed_reproduces_sequence() {
        let mut a = FastRng::from_seed(FastRngKind::Xoshiro256PlusPlus, 42);
        let mut b = FastRng::from_seed(FastRngKind::Xoshiro256PlusPlus, 42);

        for _ in 0..128 {
            assert_eq!(a.random_u64(), b.random_u64());
        }
    }

    #[test]
    fn std_rng_same_seed_reproduces_sequence() {
        let mut a = FastRng::from_seed(FastRngKind::StdRng, 7);
        let mut b = FastRng::from_seed(FastRngKind::StdRng, 7);

        for _ in 0..128 {
            assert_eq!(a.random_f64().to_bits(), b.random_f64().to_bits());
        }
    }

    #[test]
    fn open_interval_draws_exclude_endpoints() {
        let mut rng = FastRng::from_seed(FastRngKind::Xoshiro256PlusPlus, 1);
        for _ in 0..10_000 {
            let u = rng.random_open01();
            assert!(u > 0.0 && u < 1.0);
        }
    }

    #[test]
    fn open_interval_redraws_exact_endpoints() {
        let mut draws = [0.0, 1.0, 0.0, 0.25, 0.5].into_iter();
        let mut calls = 0;
        let u = open01(|| {
            calls += 1;
            draws.next().unwrap_or(0.75)
        });
        assert_eq!(u, 0.25);
        assert_eq!(calls, 4);
    }

    #[test]
    fn streams_differ_from_each_other() {
        assert_ne!(stream_seed(42, 0), stream_seed(42, 1));
        assert_eq!(stream_seed(42, 3), stream_seed(42, 3));
        assert_eq!(resolve_base_seed(Some(9)), 9);
    }

    #[test]
    fn box_muller_moments_are_standard() {
        let mut sampler = BoxMuller::from_seed(FastRngKind::Xoshiro256PlusPlus, 2024);
        let n = 200_000;
        let draws: Vec<f64> = (0..n).map(|_| sampler.next_normal()).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);

        assert!(draws.iter().all(|z| z.is_finite()));
        assert!(mean.abs() < 0.01, "mean={mean}");
        assert!((var - 1.0).abs() < 0.02, "var={var}");
    }
}
