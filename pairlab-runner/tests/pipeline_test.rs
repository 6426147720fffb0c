//! End-to-end runner tests: TOML config → CSV folders → report → artifacts.

use std::fs;
use std::path::Path;

use pairlab_core::domain::{LegDirection, TradeKind};
use pairlab_runner::{
    load_report, mirror_ledger, run_from_config, save_artifacts, BacktestConfig, Credentials,
    LegSpec, LoadOptions, PaperGateway, TradingGateway,
};

const HOUR_MS: i64 = 3_600_000;
const HEDGED_POPULATION: &str = "std_dev_mode = \"population\"\nleg_b_direction = \"opposite\"";
const BASE_MS: i64 = 1_704_067_200_000; // 2024-01-01T00:00:00Z

fn write_series(dir: &Path, closes: &[f64]) {
    fs::create_dir_all(dir).unwrap();
    let mut body = String::from("open_time,open,high,low,close,volume\n");
    for (i, c) in closes.iter().enumerate() {
        let ms = BASE_MS + i as i64 * HOUR_MS;
        body.push_str(&format!("{ms},{c},{c},{c},{c},1\n"));
    }
    fs::write(dir.join("2024-01.csv"), body).unwrap();
}

fn five_row_config(root: &Path, extra: &str) -> BacktestConfig {
    let dir_a = root.join("btc");
    let dir_b = root.join("eth");
    write_series(&dir_a, &[100.0, 101.0, 99.0, 98.0, 102.0]);
    write_series(&dir_b, &[100.0, 99.0, 101.0, 100.0, 98.0]);

    let toml = format!(
        r#"
[pair]
symbol_a = "BTC"
symbol_b = "ETH"
data_dir_a = "{}"
data_dir_b = "{}"

[strategy]
z_threshold = 1.0
{extra}
"#,
        dir_a.display().to_string().replace('\\', "/"),
        dir_b.display().to_string().replace('\\', "/"),
    );
    BacktestConfig::from_toml(&toml).unwrap()
}

#[test]
fn sample_mode_enters_short_on_last_row() {
    let dir = tempfile::tempdir().unwrap();
    let config = five_row_config(dir.path(), "");
    let report = run_from_config(&config, &LoadOptions::default()).unwrap();

    let kinds: Vec<TradeKind> = report.result.trades.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TradeKind::Short]);
    assert_eq!(report.result.final_capital, 1_000.0);
    assert!(report.summary.open_at_end);
    assert!(!report.has_synthetic);
}

#[test]
fn population_mode_with_close_out_realizes_both_legs() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = five_row_config(dir.path(), HEDGED_POPULATION);
    config.backtest.close_on_end = true;
    let report = run_from_config(&config, &LoadOptions::default()).unwrap();

    let kinds: Vec<TradeKind> = report.result.trades.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TradeKind::Long, TradeKind::Exit]);
    assert!(report.result.trades[1].end_of_data);
    assert!((report.result.final_capital - 1_006.0).abs() < 1e-9);
    assert!((report.summary.net_profit - 6.0).abs() < 1e-9);
    assert_eq!(report.summary.winning_trades, 1);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = five_row_config(dir.path(), HEDGED_POPULATION);
    config.backtest.close_on_end = true;
    let report = run_from_config(&config, &LoadOptions::default()).unwrap();

    let out = dir.path().join("out");
    let run_dir = save_artifacts(&report, &out).unwrap();
    let trades_csv = fs::read_to_string(run_dir.join("trades_log.csv")).unwrap();
    assert_eq!(trades_csv.lines().count(), 3);
    assert!(trades_csv.lines().nth(2).unwrap().ends_with(",6.00,1006.00,true"));

    let signals_csv = fs::read_to_string(run_dir.join("signals.csv")).unwrap();
    assert_eq!(signals_csv.lines().count(), 6);

    assert_eq!(load_report(&run_dir).unwrap(), report);
}

#[test]
fn same_config_same_run_id_and_dataset_hash() {
    let dir = tempfile::tempdir().unwrap();
    let config = five_row_config(dir.path(), "");
    let first = run_from_config(&config, &LoadOptions::default()).unwrap();
    let second = run_from_config(&config, &LoadOptions::default()).unwrap();
    assert_eq!(first.run_id, second.run_id);
    assert_eq!(first.dataset_hash, second.dataset_hash);
    assert_eq!(first.result, second.result);
}

#[test]
fn ledger_mirrors_into_paper_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = five_row_config(dir.path(), HEDGED_POPULATION);
    config.backtest.close_on_end = true;
    let report = run_from_config(&config, &LoadOptions::default()).unwrap();

    let mut gateway = PaperGateway::new();
    let session = gateway
        .connect(&Credentials::new("key", "secret", "binance").unwrap())
        .unwrap();
    let acks = mirror_ledger(
        &mut gateway,
        &session,
        &report.result.trades,
        &LegSpec::from(&config),
    )
    .unwrap();
    assert_eq!(acks.len(), 4);
    assert_eq!(acks[0].request.symbol, "BTC");
    assert_eq!(acks[1].request.symbol, "ETH");
}

#[test]
fn default_run_trades_both_legs_in_the_same_direction() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = five_row_config(dir.path(), "std_dev_mode = \"population\"");
    config.backtest.close_on_end = true;
    let report = run_from_config(&config, &LoadOptions::default()).unwrap();

    // long A 99 -> 102: +3, long B 101 -> 98: -3
    let kinds: Vec<TradeKind> = report.result.trades.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TradeKind::Long, TradeKind::Exit]);
    assert!((report.result.final_capital - 1_000.0).abs() < 1e-9);
    assert_eq!(report.config.leg_b_direction, LegDirection::Same);
}

#[test]
fn synthetic_run_is_tagged() {
    let config = BacktestConfig::default();
    let opts = LoadOptions {
        synthetic: true,
        synthetic_bars: 300,
    };
    let report = run_from_config(&config, &opts).unwrap();
    assert!(report.has_synthetic);
    assert_eq!(report.result.annotated_table.len(), 300);
}

#[test]
fn shipped_config_parses() {
    let config = BacktestConfig::from_toml(include_str!("../../configs/btc_eth.toml")).unwrap();
    assert_eq!(config, {
        let mut expected = BacktestConfig::default();
        expected.pair.data_dir_a = Some("data/BTC-USDT-SWAP".into());
        expected.pair.data_dir_b = Some("data/ETH-USDT-SWAP".into());
        expected.strategy.leg_b_direction = LegDirection::Opposite;
        expected
    });
}
