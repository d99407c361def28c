//! End-to-end runs of the update loop against in-memory chain and feed fakes

use async_trait::async_trait;
use chrono::Utc;
use ethers::types::{Address, H256, U256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use oracle_feeder::chain::{Confirmation, Ledger, OracleContract, TxOptions};
use oracle_feeder::error::{FeederError, Result};
use oracle_feeder::feed::QuotationSource;
use oracle_feeder::oracle::{DeviationMonitor, GasEstimator, OracleWriter, Scheduler};
use oracle_feeder::secrets::SigningIdentity;
use oracle_feeder::types::{Asset, Quotation};

/// Scripted feed: one queued answer per fetch, `None` is an HTTP 404
#[derive(Default)]
struct ScriptedFeed {
    answers: Mutex<HashMap<String, VecDeque<Option<f64>>>>,
}

impl ScriptedFeed {
    fn push(&self, symbol: &str, answers: &[Option<f64>]) {
        self.answers
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .extend(answers.iter().copied());
    }
}

#[async_trait]
impl QuotationSource for ScriptedFeed {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_quotation(&self, asset: &Asset) -> Result<Quotation> {
        let answer = self
            .answers
            .lock()
            .unwrap()
            .get_mut(asset.symbol())
            .and_then(|queue| queue.pop_front())
            .flatten();

        match answer {
            Some(price) => Ok(Quotation {
                asset: asset.clone(),
                price,
                time: Utc::now(),
            }),
            None => Err(FeederError::FeedStatus {
                symbol: asset.to_string(),
                status: 404,
            }),
        }
    }
}

struct FixedGasLedger(u64);

#[async_trait]
impl Ledger for FixedGasLedger {
    async fn suggest_gas_price(&self) -> Result<U256> {
        Ok(U256::from(self.0))
    }

    async fn confirmation(&self, _tx: H256) -> Result<Option<Confirmation>> {
        Ok(None)
    }
}

/// Records every accepted write: (key, value, timestamp, gas price)
#[derive(Default)]
struct RecordingOracle {
    writes: Mutex<Vec<(String, u128, u128, U256)>>,
}

#[async_trait]
impl OracleContract for RecordingOracle {
    fn address(&self) -> Address {
        Address::from_low_u64_be(0xD1A)
    }

    async fn set_value(
        &self,
        opts: TxOptions,
        key: String,
        value: u128,
        timestamp: u128,
    ) -> Result<oracle_feeder::types::TxHandle> {
        let mut writes = self.writes.lock().unwrap();
        writes.push((key, value, timestamp, opts.gas_price));
        Ok(oracle_feeder::types::TxHandle {
            hash: H256::from_low_u64_be(writes.len() as u64),
            to: Some(self.address()),
        })
    }
}

fn pipeline(feed: Arc<ScriptedFeed>, oracle: Arc<RecordingOracle>, permille: u32) -> DeviationMonitor {
    let writer = OracleWriter::new(
        oracle,
        GasEstimator::new(Arc::new(FixedGasLedger(20_000_000_000))),
        Address::from_low_u64_be(1),
        1_000_725,
    );
    DeviationMonitor::new(feed, writer, permille)
}

#[tokio::test(start_paused = true)]
async fn test_loop_survives_feed_errors_and_writes_on_deviation() {
    let feed = Arc::new(ScriptedFeed::default());
    feed.push("BTC", &[None, Some(60_000.0), Some(60_100.0)]);
    feed.push("ETH", &[Some(3_000.0), Some(3_010.0), Some(3_100.0)]);
    let oracle = Arc::new(RecordingOracle::default());
    let mut monitor = pipeline(feed, oracle.clone(), 10);

    let scheduler = Scheduler::new(
        vec![Asset::new("BTC"), Asset::new("ETH")],
        Duration::from_secs(120),
        Duration::from_secs(10),
    )
    .with_max_cycles(3);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let cycles = scheduler.run(&mut monitor, shutdown_rx).await;
    assert_eq!(cycles, 3);

    let writes = oracle.writes.lock().unwrap();
    let keys: Vec<(&str, u128)> = writes.iter().map(|w| (w.0.as_str(), w.1)).collect();
    // Cycle 1: BTC 404, ETH bootstrap. Cycle 2: BTC bootstrap, ETH +0.33%.
    // Cycle 3: BTC +0.17%, ETH +3.3% vs 3000.
    assert_eq!(
        keys,
        vec![
            ("ETH/USD", 300_000_000_000),
            ("BTC/USD", 6_000_000_000_000),
            ("ETH/USD", 310_000_000_000),
        ]
    );
    assert!(writes.iter().all(|w| w.3 == U256::from(22_000_000_000u64)));
    assert!(writes.iter().all(|w| w.2 > 1_600_000_000));

    assert_eq!(monitor.last_price(&Asset::new("BTC")), 60_000.0);
    assert_eq!(monitor.last_price(&Asset::new("ETH")), 3_100.0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_before_first_tick_runs_nothing() {
    let feed = Arc::new(ScriptedFeed::default());
    let oracle = Arc::new(RecordingOracle::default());
    let mut monitor = pipeline(feed, oracle.clone(), 10);
    let scheduler = Scheduler::new(
        vec![Asset::new("BTC")],
        Duration::from_secs(120),
        Duration::from_secs(10),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    let cycles = scheduler.run(&mut monitor, shutdown_rx).await;

    assert_eq!(cycles, 0);
    assert!(oracle.writes.lock().unwrap().is_empty());
}

#[test]
fn test_malformed_secrets_fail_before_network() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "blob\npassword\nextra\n").unwrap();

    let err = SigningIdentity::load(file.path(), 137).unwrap_err();
    assert!(matches!(err, FeederError::MalformedSecrets(3)));
}
