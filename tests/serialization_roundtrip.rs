use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;

use quantleg::analysis::PortfolioAnalyzer;
use quantleg::core::Greeks;
use quantleg::engines::monte_carlo::MonteCarloEngine;
use quantleg::hedging::HedgingConfig;
use quantleg::instruments::Strategy;
use quantleg::market::MarketSnapshot;
use quantleg::math::fast_rng::FastRngKind;
use quantleg::risk::Portfolio;
use quantleg::vol::ImpliedVolSolver;

fn assert_roundtrip<T>(value: &T)
where
    T: Serialize + DeserializeOwned + PartialEq + Debug,
{
    let json = serde_json::to_vec_pretty(value).expect("json serialize");
    let from_json: T = serde_json::from_slice(&json).expect("json deserialize");
    assert_eq!(from_json, *value, "json roundtrip mismatch");
}

#[test]
fn configs_and_books_roundtrip() {
    let market = MarketSnapshot::builder()
        .spot(100.0)
        .rate(0.02)
        .flat_vol(0.2)
        .ticker("ACME")
        .build()
        .expect("valid market");
    assert_roundtrip(&market);

    let mut book = Portfolio::new();
    book.add_option(market.put(90.0, 0.5), -2);
    book.add_strategy(
        Strategy::iron_condor(&market, 80.0, 90.0, 110.0, 120.0, 1.0).expect("valid condor"),
        3,
    );
    assert_roundtrip(&book);

    assert_roundtrip(
        &MonteCarloEngine::new(10_000)
            .expect("positive path count")
            .with_seed(1)
            .with_rng_kind(FastRngKind::StdRng),
    );
    assert_roundtrip(&HedgingConfig::new(50, 100).with_cost(0.001));
    assert_roundtrip(&ImpliedVolSolver::default().with_bounds(0.01, 3.0));
    assert_roundtrip(&PortfolioAnalyzer::default());
    assert_roundtrip(&Greeks {
        delta: 0.5,
        gamma: 0.01,
        vega: 0.4,
        theta: -0.02,
        rho: 0.3,
    });
}

#[test]
fn hedging_config_loads_with_defaults() {
    let config: HedgingConfig =
        serde_json::from_str(r#"{ "steps": 30, "paths": 200 }"#).expect("minimal config");
    assert_eq!(config, HedgingConfig::new(30, 200));
    assert!(config.validate().is_ok());
}
