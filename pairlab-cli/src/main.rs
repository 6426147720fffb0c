//! PairLab CLI — pair backtests, threshold sweeps and paper mirroring.
//!
//! Commands:
//! - `backtest`: run one backtest and save report, ledger and signal table
//! - `sweep`: run the same pair across several entry thresholds
//! - `paper`: run a backtest, then replay its ledger into the paper gateway

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pairlab_runner::{
    load_pair, mirror_ledger, run_from_config, save_artifacts, BacktestConfig, Credentials,
    LegSpec, LoadOptions, PaperGateway, RunReport, ThresholdSweep, TradingGateway,
};

#[derive(Parser)]
#[command(name = "pairlab", about = "PairLab CLI — spread z-score pairs-trading backtester")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest and save its artifacts.
    Backtest {
        #[command(flatten)]
        run: RunArgs,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run the pair across several entry thresholds.
    Sweep {
        #[command(flatten)]
        run: RunArgs,

        /// Comma-separated thresholds, e.g. 1.0,1.5,2.0.
        #[arg(long, value_delimiter = ',', required = true)]
        thresholds: Vec<f64>,

        /// Run thresholds one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Run a backtest and mirror its ledger into the paper gateway.
    Paper {
        #[command(flatten)]
        run: RunArgs,

        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        secret_key: Option<String>,

        /// binance, bybit or okx.
        #[arg(long, default_value = "binance")]
        exchange: String,
    },
}

/// Options shared by every command. Flags override the config file.
#[derive(Args)]
struct RunArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder of CSV bar files for leg A.
    #[arg(long)]
    data_a: Option<PathBuf>,

    /// Folder of CSV bar files for leg B.
    #[arg(long)]
    data_b: Option<PathBuf>,

    #[arg(long)]
    symbol_a: Option<String>,

    #[arg(long)]
    symbol_b: Option<String>,

    /// Use a synthetic pair instead of CSV folders.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Entry threshold on |z|.
    #[arg(long)]
    threshold: Option<f64>,

    /// Starting capital.
    #[arg(long)]
    capital: Option<f64>,

    /// Close any open position at the last row.
    #[arg(long, default_value_t = false)]
    close_on_end: bool,
}

impl RunArgs {
    fn to_config(&self) -> Result<BacktestConfig> {
        let mut config = match &self.config {
            Some(path) => BacktestConfig::from_file(path)?,
            None => BacktestConfig::default(),
        };
        if let Some(dir) = &self.data_a {
            config.pair.data_dir_a = Some(dir.clone());
        }
        if let Some(dir) = &self.data_b {
            config.pair.data_dir_b = Some(dir.clone());
        }
        if let Some(symbol) = &self.symbol_a {
            config.pair.symbol_a = symbol.clone();
        }
        if let Some(symbol) = &self.symbol_b {
            config.pair.symbol_b = symbol.clone();
        }
        if let Some(threshold) = self.threshold {
            config.strategy.z_threshold = threshold;
        }
        if let Some(capital) = self.capital {
            config.backtest.starting_capital = capital;
        }
        if self.close_on_end {
            config.backtest.close_on_end = true;
        }
        config.validate()?;
        Ok(config)
    }

    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            synthetic: self.synthetic,
            ..LoadOptions::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Backtest { run, output_dir } => run_backtest_cmd(&run, &output_dir),
        Commands::Sweep {
            run,
            thresholds,
            sequential,
        } => run_sweep_cmd(&run, thresholds, sequential),
        Commands::Paper {
            run,
            api_key,
            secret_key,
            exchange,
        } => run_paper_cmd(
            &run,
            api_key.as_deref().unwrap_or_default(),
            secret_key.as_deref().unwrap_or_default(),
            &exchange,
        ),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_backtest_cmd(run: &RunArgs, output_dir: &Path) -> Result<()> {
    let config = run.to_config()?;
    let report = run_from_config(&config, &run.load_options())?;

    print_summary(&report);

    let run_dir = save_artifacts(&report, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_sweep_cmd(run: &RunArgs, thresholds: Vec<f64>, sequential: bool) -> Result<()> {
    let config = run.to_config()?;
    let loaded = load_pair(&config.pair, &run.load_options())?;
    let results = ThresholdSweep::new(thresholds)
        .with_parallelism(!sequential)
        .run(&loaded.series_a, &loaded.series_b, &config.to_pair_config())?;

    println!(
        "{:>10} {:>14} {:>12} {:>8} {:>9}",
        "threshold", "final_capital", "net_profit", "exits", "win_rate"
    );
    for point in results.all() {
        let s = &point.summary;
        println!(
            "{:>10.3} {:>14.2} {:>12.2} {:>8} {:>8.1}%",
            point.threshold,
            s.final_capital,
            s.net_profit,
            s.exits,
            s.win_rate * 100.0
        );
    }
    if let Some(best) = results.best_by_capital() {
        println!(
            "Best threshold: {} (final capital ${:.2})",
            best.threshold, best.summary.final_capital
        );
    }
    Ok(())
}

fn run_paper_cmd(run: &RunArgs, api_key: &str, secret_key: &str, exchange: &str) -> Result<()> {
    let credentials = Credentials::new(api_key, secret_key, exchange)?;
    let config = run.to_config()?;
    let report = run_from_config(&config, &run.load_options())?;
    print_summary(&report);

    let mut gateway = PaperGateway::new();
    let session = gateway.connect(&credentials)?;
    let acks = mirror_ledger(&mut gateway, &session, &report.result.trades, &LegSpec::from(&config))
        .context("failed to mirror ledger into paper gateway")?;

    info!(session = %session.session_id, "paper session finished");
    println!(
        "Connected to {} ({}), {} paper orders filled",
        session.exchange,
        session.session_id,
        acks.len()
    );
    Ok(())
}

fn print_summary(report: &RunReport) {
    let s = &report.summary;
    if report.has_synthetic {
        println!("[synthetic data]");
    }
    println!("Pair: {} / {}", report.symbol_a, report.symbol_b);
    if let (Some(start), Some(end)) = (report.start, report.end) {
        println!("Period: {} .. {} ({} rows)", start, end, report.result.annotated_table.len());
    }
    println!("Starting Capital: ${}", s.starting_capital);
    println!("Final Capital: ${:.2}", s.final_capital);
    println!("Net Profit: ${:.2}", s.net_profit);
    println!(
        "Trades: {} entries ({} long, {} short), {} exits, win rate {:.1}%",
        s.entries,
        s.long_entries,
        s.short_entries,
        s.exits,
        s.win_rate * 100.0
    );
    println!("Max drawdown: {:.2}%", s.max_drawdown * 100.0);
    if s.open_at_end {
        println!("Position left open at end of data");
    }
}
