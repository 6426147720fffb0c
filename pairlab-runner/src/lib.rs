//! PairLab Runner — everything around the pure backtest core.
//!
//! This crate builds on `pairlab-core` to provide:
//! - TOML configuration and run fingerprinting
//! - CSV folder loading with synthetic fallback
//! - Single-run reports with performance summary
//! - Entry-threshold sweeps
//! - JSON and CSV artifact export
//! - The trading gateway collaborator with a paper implementation

pub mod config;
pub mod data_loader;
pub mod export;
pub mod gateway;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{load_pair, load_series, LoadError, LoadOptions, LoadedPair};
pub use export::{export_json, import_json, load_report, save_artifacts};
pub use gateway::{
    mirror_ledger, Credentials, Exchange, GatewayError, LegSpec, PaperGateway, TradingGateway,
};
pub use metrics::PerformanceSummary;
pub use runner::{run_from_config, run_loaded, RunError, RunReport, SCHEMA_VERSION};
pub use sweep::{SweepPoint, SweepResults, ThresholdSweep};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn run_report_is_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn sweep_types_are_send_sync() {
        assert_send::<ThresholdSweep>();
        assert_sync::<ThresholdSweep>();
        assert_send::<SweepResults>();
        assert_sync::<SweepResults>();
    }

    #[test]
    fn gateway_is_send() {
        assert_send::<PaperGateway>();
        assert_send::<Credentials>();
    }
}
