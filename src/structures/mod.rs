//! Recognition of named option structures inside an arbitrary bag of legs.
//!
//! The detector does not assume template leg order: every template is matched against all
//! ordered combinations of distinct legs, and every hit is reported. A leg set can match
//! several templates at once (the wings of an iron condor also form a strangle).
//!
//! Quantities are matched exactly as the templates build them: spreads and calendars need
//! `+1`/`-1`, butterflies `+1/-2/+1`, straddles and strangles any long quantity.

use crate::core::OptionType;
use crate::instruments::Leg;

pub use crate::instruments::StrategyKind as StructureKind;

/// Absolute tolerance for strike and maturity equality.
pub const MATCH_TOLERANCE: f64 = 1e-9;

/// One recognised structure and the legs that form it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StructureMatch {
    pub kind: StructureKind,
    pub name: String,
    pub objective: String,
    /// Indices into the leg slice handed to the detector, in template order.
    pub legs: Vec<usize>,
    pub details: String,
}

impl StructureMatch {
    fn new(kind: StructureKind, legs: Vec<usize>, details: String) -> Self {
        Self {
            kind,
            name: kind.label().to_string(),
            objective: kind.objective().to_string(),
            legs,
            details,
        }
    }
}

#[inline]
fn same(a: f64, b: f64) -> bool {
    (a - b).abs() <= MATCH_TOLERANCE
}

#[inline]
fn is(leg: &Leg, option_type: OptionType, quantity: i64) -> bool {
    leg.option.option_type() == option_type && leg.quantity == quantity
}

#[inline]
fn long(leg: &Leg, option_type: OptionType) -> bool {
    leg.option.option_type() == option_type && leg.quantity > 0
}

#[inline]
fn same_maturity(legs: &[&Leg]) -> bool {
    legs.windows(2)
        .all(|w| same(w[0].option.maturity(), w[1].option.maturity()))
}

/// Pattern matcher over flattened legs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureDetector;

impl StructureDetector {
    pub fn new() -> Self {
        Self
    }

    /// Every template match found in `legs`, grouped by template in declaration order.
    ///
    /// An empty result only means nothing was recognised.
    ///
    /// # Examples
    /// ```
    /// use quantleg::instruments::Strategy;
    /// use quantleg::market::MarketSnapshot;
    /// use quantleg::structures::{StructureDetector, StructureKind};
    ///
    /// let market = MarketSnapshot::builder().spot(100.0).flat_vol(0.2).build().unwrap();
    /// let condor = Strategy::iron_condor(&market, 80.0, 90.0, 110.0, 120.0, 1.0).unwrap();
    /// let found = StructureDetector::new().detect(condor.legs());
    ///
    /// assert!(found.iter().any(|m| m.kind == StructureKind::IronCondor));
    /// ```
    pub fn detect(&self, legs: &[Leg]) -> Vec<StructureMatch> {
        let mut found = Vec::new();
        self.straddles(legs, &mut found);
        self.strangles(legs, &mut found);
        self.butterflies(legs, &mut found);
        self.bull_call_spreads(legs, &mut found);
        self.bear_put_spreads(legs, &mut found);
        self.iron_condors(legs, &mut found);
        self.calendar_spreads(legs, &mut found);
        tracing::debug!(legs = legs.len(), matches = found.len(), "structure detection");
        found
    }

    /// Names only, in the order returned by [`detect`](Self::detect).
    pub fn detect_names(&self, legs: &[Leg]) -> Vec<String> {
        self.detect(legs).into_iter().map(|m| m.name).collect()
    }

    fn straddles(&self, legs: &[Leg], out: &mut Vec<StructureMatch>) {
        for (i, call) in legs.iter().enumerate() {
            if !long(call, OptionType::Call) {
                continue;
            }
            for (j, put) in legs.iter().enumerate() {
                if i == j || !long(put, OptionType::Put) {
                    continue;
                }
                if same(call.option.strike(), put.option.strike()) && same_maturity(&[call, put])
                {
                    out.push(StructureMatch::new(
                        StructureKind::Straddle,
                        vec![i, j],
                        format!(
                            "Long call and long put at K={}, T={}",
                            call.option.strike(),
                            call.option.maturity()
                        ),
                    ));
                }
            }
        }
    }

    fn strangles(&self, legs: &[Leg], out: &mut Vec<StructureMatch>) {
        for (i, put) in legs.iter().enumerate() {
            if !long(put, OptionType::Put) {
                continue;
            }
            for (j, call) in legs.iter().enumerate() {
                if i == j || !long(call, OptionType::Call) {
                    continue;
                }
                let (kp, kc) = (put.option.strike(), call.option.strike());
                if kp < kc && !same(kp, kc) && same_maturity(&[put, call]) {
                    out.push(StructureMatch::new(
                        StructureKind::Strangle,
                        vec![i, j],
                        format!("Long put K={kp}, long call K={kc}"),
                    ));
                }
            }
        }
    }

    fn butterflies(&self, legs: &[Leg], out: &mut Vec<StructureMatch>) {
        let n = legs.len();
        for i in 0..n {
            if !is(&legs[i], OptionType::Call, 1) {
                continue;
            }
            for j in 0..n {
                if j == i || !is(&legs[j], OptionType::Call, -2) {
                    continue;
                }
                for k in 0..n {
                    if k == i || k == j || !is(&legs[k], OptionType::Call, 1) {
                        continue;
                    }
                    let (lo, mid, hi) = (&legs[i], &legs[j], &legs[k]);
                    let (k1, k2, k3) = (lo.option.strike(), mid.option.strike(), hi.option.strike());
                    if k1 < k3
                        && !same(k1, k3)
                        && same(k2, 0.5 * (k1 + k3))
                        && same_maturity(&[lo, mid, hi])
                    {
                        out.push(StructureMatch::new(
                            StructureKind::Butterfly,
                            vec![i, j, k],
                            format!("Calls {k1}/{k2}/{k3} with wings of {}", k2 - k1),
                        ));
                    }
                }
            }
        }
    }

    fn bull_call_spreads(&self, legs: &[Leg], out: &mut Vec<StructureMatch>) {
        for (i, low) in legs.iter().enumerate() {
            if !is(low, OptionType::Call, 1) {
                continue;
            }
            for (j, high) in legs.iter().enumerate() {
                if i == j || !is(high, OptionType::Call, -1) {
                    continue;
                }
                let (k1, k2) = (low.option.strike(), high.option.strike());
                if k1 < k2 && !same(k1, k2) && same_maturity(&[low, high]) {
                    out.push(StructureMatch::new(
                        StructureKind::BullCallSpread,
                        vec![i, j],
                        format!("Long call K={k1}, short call K={k2}"),
                    ));
                }
            }
        }
    }

    fn bear_put_spreads(&self, legs: &[Leg], out: &mut Vec<StructureMatch>) {
        for (i, high) in legs.iter().enumerate() {
            if !is(high, OptionType::Put, 1) {
                continue;
            }
            for (j, low) in legs.iter().enumerate() {
                if i == j || !is(low, OptionType::Put, -1) {
                    continue;
                }
                let (k_high, k_low) = (high.option.strike(), low.option.strike());
                if k_low < k_high && !same(k_low, k_high) && same_maturity(&[high, low]) {
                    out.push(StructureMatch::new(
                        StructureKind::BearPutSpread,
                        vec![i, j],
                        format!("Long put K={k_high}, short put K={k_low}"),
                    ));
                }
            }
        }
    }

    fn iron_condors(&self, legs: &[Leg], out: &mut Vec<StructureMatch>) {
        let n = legs.len();
        let idx = |f: fn(&Leg) -> bool| -> Vec<usize> { (0..n).filter(|&i| f(&legs[i])).collect() };
        let long_puts = idx(|l| l.option.option_type() == OptionType::Put && l.quantity > 0);
        let short_puts = idx(|l| l.option.option_type() == OptionType::Put && l.quantity < 0);
        let short_calls = idx(|l| l.option.option_type() == OptionType::Call && l.quantity < 0);
        let long_calls = idx(|l| l.option.option_type() == OptionType::Call && l.quantity > 0);

        for &a in &long_puts {
            for &b in &short_puts {
                for &c in &short_calls {
                    for &d in &long_calls {
                        let group = [&legs[a], &legs[b], &legs[c], &legs[d]];
                        let strikes = group.map(|l| l.option.strike());
                        let increasing = strikes
                            .windows(2)
                            .all(|w| w[0] < w[1] && !same(w[0], w[1]));
                        if increasing && same_maturity(&group) {
                            out.push(StructureMatch::new(
                                StructureKind::IronCondor,
                                vec![a, b, c, d],
                                format!(
                                    "Put wing {}/{}, call wing {}/{}",
                                    strikes[0], strikes[1], strikes[2], strikes[3]
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Short near call and long far call at one strike; the reverse is not reported.
    fn calendar_spreads(&self, legs: &[Leg], out: &mut Vec<StructureMatch>) {
        for (i, near) in legs.iter().enumerate() {
            if !is(near, OptionType::Call, -1) {
                continue;
            }
            for (j, far) in legs.iter().enumerate() {
                if i == j || !is(far, OptionType::Call, 1) {
                    continue;
                }
                let (t_near, t_far) = (near.option.maturity(), far.option.maturity());
                if same(near.option.strike(), far.option.strike())
                    && t_near < t_far
                    && !same(t_near, t_far)
                {
                    out.push(StructureMatch::new(
                        StructureKind::CalendarSpread,
                        vec![j, i],
                        format!(
                            "K={}: short T={t_near}, long T={t_far}",
                            near.option.strike()
                        ),
                    ));
                }
            }
        }
    }
}
