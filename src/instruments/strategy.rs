//! Named multi-leg option strategies.
//!
//! Each template is a plain builder that turns a [`MarketSnapshot`] plus strikes and
//! maturities into a fixed list of signed legs. Leg order is fixed per template so tests can
//! rely on it; nothing else does.
//!
//! | Strategy | Legs |
//! |---|---|
//! | Bull Call Spread (K1<K2) | +1 Call(K1), -1 Call(K2) |
//! | Bear Put Spread (K1<K2) | +1 Put(K2), -1 Put(K1) |
//! | Butterfly (K, dK) | +1 Call(K-dK), -2 Call(K), +1 Call(K+dK) |
//! | Straddle (K) | +1 Call(K), +1 Put(K) |
//! | Strangle (K1<K2) | +1 Put(K1), +1 Call(K2) |
//! | Calendar Spread (K, Ts<Tl) | +1 Call(K, Tl), -1 Call(K, Ts) |
//! | Iron Condor (K1<K2<K3<K4) | +1 Put(K1), -1 Put(K2), -1 Call(K3), +1 Call(K4) |

use crate::core::{PricingError, PricingMethod};
use crate::instruments::EuropeanOption;
use crate::market::MarketSnapshot;

/// The seven canonical strategy templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StrategyKind {
    BullCallSpread,
    BearPutSpread,
    Butterfly,
    Straddle,
    Strangle,
    CalendarSpread,
    IronCondor,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        Self::BullCallSpread,
        Self::BearPutSpread,
        Self::Butterfly,
        Self::Straddle,
        Self::Strangle,
        Self::CalendarSpread,
        Self::IronCondor,
    ];

    /// Canonical display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::BullCallSpread => "Bull Call Spread",
            Self::BearPutSpread => "Bear Put Spread",
            Self::Butterfly => "Butterfly",
            Self::Straddle => "Straddle",
            Self::Strangle => "Strangle",
            Self::CalendarSpread => "Calendar Spread",
            Self::IronCondor => "Iron Condor",
        }
    }

    /// What the position is built to profit from.
    pub fn objective(self) -> &'static str {
        match self {
            Self::BullCallSpread => "Moderate rise of the underlying with capped cost and capped gain",
            Self::BearPutSpread => "Moderate fall of the underlying with capped cost and capped gain",
            Self::Butterfly => "Underlying pinned near the middle strike at expiry",
            Self::Straddle => "Large move in either direction or a rise in volatility",
            Self::Strangle => "Very large move in either direction at a lower cost than a straddle",
            Self::CalendarSpread => "Faster time decay of the near expiry while spot stays near the strike",
            Self::IronCondor => "Underlying staying inside the short strikes until expiry",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One option position: instrument plus signed quantity (positive = long).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Leg {
    pub option: EuropeanOption,
    pub quantity: i64,
}

impl Leg {
    pub fn new(option: EuropeanOption, quantity: i64) -> Self {
        Self { option, quantity }
    }

    /// Signed terminal payoff of the leg.
    #[inline]
    pub fn payoff(&self, spot_at_expiry: f64) -> f64 {
        self.quantity as f64 * self.option.payoff(spot_at_expiry)
    }
}

/// Immutable multi-leg strategy produced by one of the template builders.
///
/// # Examples
/// ```
/// use quantleg::instruments::{Strategy, StrategyKind};
/// use quantleg::market::MarketSnapshot;
///
/// let market = MarketSnapshot::builder()
///     .spot(100.0)
///     .rate(0.02)
///     .flat_vol(0.2)
///     .build()
///     .unwrap();
/// let fly = Strategy::butterfly(&market, 100.0, 10.0, 1.0).unwrap();
///
/// assert_eq!(fly.kind(), StrategyKind::Butterfly);
/// assert_eq!(fly.legs().len(), 3);
/// assert_eq!(fly.payoff(100.0), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Strategy {
    kind: StrategyKind,
    legs: Vec<Leg>,
}

fn require_positive(value: f64, what: &str) -> Result<(), PricingError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PricingError::InvalidInput(format!("{what} must be finite and > 0")));
    }
    Ok(())
}

fn require_increasing(strikes: &[f64], what: &str) -> Result<(), PricingError> {
    for &k in strikes {
        require_positive(k, "strike")?;
    }
    if strikes.windows(2).any(|w| w[1] <= w[0]) {
        return Err(PricingError::InvalidInput(format!(
            "{what} strikes must be strictly increasing"
        )));
    }
    Ok(())
}

impl Strategy {
    fn from_legs(kind: StrategyKind, legs: Vec<Leg>) -> Self {
        Self { kind, legs }
    }

    /// +1 Call(K1), -1 Call(K2) with `k1 < k2`.
    pub fn bull_call_spread(
        market: &MarketSnapshot,
        k1: f64,
        k2: f64,
        maturity: f64,
    ) -> Result<Self, PricingError> {
        require_increasing(&[k1, k2], "bull call spread")?;
        require_positive(maturity, "maturity")?;
        Ok(Self::from_legs(
            StrategyKind::BullCallSpread,
            vec![
                Leg::new(market.call(k1, maturity), 1),
                Leg::new(market.call(k2, maturity), -1),
            ],
        ))
    }

    /// +1 Put(K2), -1 Put(K1) with `k1 < k2`.
    pub fn bear_put_spread(
        market: &MarketSnapshot,
        k1: f64,
        k2: f64,
        maturity: f64,
    ) -> Result<Self, PricingError> {
        require_increasing(&[k1, k2], "bear put spread")?;
        require_positive(maturity, "maturity")?;
        Ok(Self::from_legs(
            StrategyKind::BearPutSpread,
            vec![
                Leg::new(market.put(k2, maturity), 1),
                Leg::new(market.put(k1, maturity), -1),
            ],
        ))
    }

    /// +1 Call(K-dK), -2 Call(K), +1 Call(K+dK).
    pub fn butterfly(
        market: &MarketSnapshot,
        strike: f64,
        wing: f64,
        maturity: f64,
    ) -> Result<Self, PricingError> {
        require_positive(wing, "butterfly wing width")?;
        require_increasing(&[strike - wing, strike, strike + wing], "butterfly")?;
        require_positive(maturity, "maturity")?;
        Ok(Self::from_legs(
            StrategyKind::Butterfly,
            vec![
                Leg::new(market.call(strike - wing, maturity), 1),
                Leg::new(market.call(strike, maturity), -2),
                Leg::new(market.call(strike + wing, maturity), 1),
            ],
        ))
    }

    /// +1 Call(K), +1 Put(K).
    pub fn straddle(
        market: &MarketSnapshot,
        strike: f64,
        maturity: f64,
    ) -> Result<Self, PricingError> {
        require_positive(strike, "strike")?;
        require_positive(maturity, "maturity")?;
        Ok(Self::from_legs(
            StrategyKind::Straddle,
            vec![
                Leg::new(market.call(strike, maturity), 1),
                Leg::new(market.put(strike, maturity), 1),
            ],
        ))
    }

    /// +1 Put(K1), +1 Call(K2) with `k1 < k2`.
    pub fn strangle(
        market: &MarketSnapshot,
        k1: f64,
        k2: f64,
        maturity: f64,
    ) -> Result<Self, PricingError> {
        require_increasing(&[k1, k2], "strangle")?;
        require_positive(maturity, "maturity")?;
        Ok(Self::from_legs(
            StrategyKind::Strangle,
            vec![
                Leg::new(market.put(k1, maturity), 1),
                Leg::new(market.call(k2, maturity), 1),
            ],
        ))
    }

    /// +1 Call(K, Tlong), -1 Call(K, Tshort) with `t_short < t_long`.
    pub fn calendar_spread(
        market: &MarketSnapshot,
        strike: f64,
        t_short: f64,
        t_long: f64,
    ) -> Result<Self, PricingError> {
        require_positive(strike, "strike")?;
        require_positive(t_short, "short maturity")?;
        if !t_long.is_finite() || t_long <= t_short {
            return Err(PricingError::InvalidInput(
                "calendar spread long maturity must exceed the short maturity".to_string(),
            ));
        }
        Ok(Self::from_legs(
            StrategyKind::CalendarSpread,
            vec![
                Leg::new(market.call(strike, t_long), 1),
                Leg::new(market.call(strike, t_short), -1),
            ],
        ))
    }

    /// +1 Put(K1), -1 Put(K2), -1 Call(K3), +1 Call(K4) with `K1<K2<K3<K4`.
    pub fn iron_condor(
        market: &MarketSnapshot,
        k1: f64,
        k2: f64,
        k3: f64,
        k4: f64,
        maturity: f64,
    ) -> Result<Self, PricingError> {
        require_increasing(&[k1, k2, k3, k4], "iron condor")?;
        require_positive(maturity, "maturity")?;
        Ok(Self::from_legs(
            StrategyKind::IronCondor,
            vec![
                Leg::new(market.put(k1, maturity), 1),
                Leg::new(market.put(k2, maturity), -1),
                Leg::new(market.call(k3, maturity), -1),
                Leg::new(market.call(k4, maturity), 1),
            ],
        ))
    }

    #[inline]
    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.label()
    }

    #[inline]
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Signed terminal payoff summed over legs.
    ///
    /// Calendar spreads mix maturities; the value here treats every leg as expiring at
    /// `spot_at_expiry`, which is the conventional intrinsic profile.
    pub fn payoff(&self, spot_at_expiry: f64) -> f64 {
        self.legs.iter().map(|leg| leg.payoff(spot_at_expiry)).sum()
    }

    /// Signed net premium under `method` (positive = net debit).
    pub fn premium(&self, method: &dyn PricingMethod) -> f64 {
        self.legs
            .iter()
            .map(|leg| leg.quantity as f64 * method.price(&leg.option))
            .sum()
    }
}
