//! Swingbreak CLI: fetch data, run backtests, compare exit policies, sweep
//! detector parameters and render charts.
//!
//! Commands:
//! - `fetch`: download bars for symbols and write CSV snapshots
//! - `run`: run a backtest config over its pairs and save artifacts
//! - `compare`: print the exit-policy comparison table per pair
//! - `sweep`: grid over pivot length and impulse multiplier
//! - `chart`: render a static HTML chart for one CSV file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use swingbreak_core::data::{
    fetch_symbols, load_csv, CircuitBreaker, CsvOptions, StdoutProgress, YahooProvider,
};
use swingbreak_core::engine::run_detection;
use swingbreak_core::timeframe::Timeframe;
use swingbreak_runner::{
    format_breakdown, format_comparison, format_summary, load_pairs, render_chart_html, run_pair,
    run_pairs, save_artifacts, sweep, write_chart_html, BacktestConfig, DetectorGrid, LoadedData,
    PairFailure,
};

#[derive(Parser)]
#[command(
    name = "swingbreak",
    about = "Swingbreak CLI: swing break, confirm and retest backtester"
)]
struct Cli {
    /// Debug-level logging (RUST_LOG still wins when set).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download bars and write `{SYMBOL}_{TF}.csv` snapshots.
    Fetch {
        /// Symbols to fetch (e.g., XAUUSD EURUSD BTCUSD).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Bar timeframe (M1, M5, M15, M30, H1, H4, D1, W1, MN).
        #[arg(long, default_value = "M5")]
        timeframe: Timeframe,

        /// Output directory.
        #[arg(long, default_value = "data")]
        out: PathBuf,
    },
    /// Run a backtest config and save artifacts per pair.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Pairs to run instead of `data.pairs` (repeatable).
        #[arg(long)]
        pair: Vec<String>,

        /// Output directory; overrides `output.dir`.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the breakdown tables for every policy.
        #[arg(long, default_value_t = false)]
        breakdown: bool,
    },
    /// Print the exit-policy comparison for each pair.
    Compare {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Pairs to compare instead of `data.pairs` (repeatable).
        #[arg(long)]
        pair: Vec<String>,
    },
    /// Sweep pivot length and impulse multiplier over every pair.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Pivot lengths, comma separated.
        #[arg(long, value_delimiter = ',', default_value = "3,5,7")]
        pivot_len: Vec<usize>,

        /// Impulse multipliers, comma separated (0 disables the filter).
        #[arg(long, value_delimiter = ',', default_value = "0,1.5")]
        impulse: Vec<f64>,

        /// Only print the best N rows.
        #[arg(long)]
        top: Option<usize>,
    },
    /// Render a static HTML chart with swings and signals for one CSV file.
    Chart {
        /// Bar CSV snapshot.
        #[arg(long)]
        csv: PathBuf,

        /// Output HTML file.
        #[arg(long, default_value = "chart.html")]
        out: PathBuf,

        /// Detector settings from this config instead of the defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the pivot length.
        #[arg(long)]
        pivot_len: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Fetch {
            symbols,
            timeframe,
            out,
        } => run_fetch(&symbols, timeframe, out),
        Commands::Run {
            config,
            pair,
            output,
            breakdown,
        } => run_backtest_cmd(config, pair, output, breakdown),
        Commands::Compare { config, pair } => run_compare(config, pair),
        Commands::Sweep {
            config,
            pivot_len,
            impulse,
            top,
        } => run_sweep(config, pivot_len, impulse, top),
        Commands::Chart {
            csv,
            out,
            config,
            pivot_len,
        } => run_chart(csv, out, config, pivot_len),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "swingbreak=debug"
    } else {
        "swingbreak=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_fetch(symbols: &[String], timeframe: Timeframe, out: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&out)
        .with_context(|| format!("failed to create output dir: {}", out.display()))?;

    let circuit_breaker = Arc::new(CircuitBreaker::for_provider());
    let provider = YahooProvider::new(circuit_breaker)?;
    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
    let end = chrono::Utc::now().naive_utc();

    let summary = fetch_symbols(&provider, &sym_refs, timeframe, end, &out, &StdoutProgress);

    if !summary.all_succeeded() {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
        if summary.succeeded() == 0 {
            std::process::exit(1);
        }
    }
    Ok(())
}

fn load_config(path: &Path, pairs: Vec<String>) -> Result<BacktestConfig> {
    let mut config = BacktestConfig::from_file(path)?;
    if !pairs.is_empty() {
        config.data.pairs = pairs;
    }
    Ok(config)
}

fn print_failures(failures: &[PairFailure]) {
    for f in failures {
        eprintln!("{}: skipped ({})", f.pair, f.error);
    }
}

fn exit_if_all_failed(loaded: &LoadedData) {
    if loaded.all_failed() {
        eprintln!("No pairs could be loaded.");
        std::process::exit(1);
    }
}

fn run_backtest_cmd(
    config_path: PathBuf,
    pairs: Vec<String>,
    output: Option<PathBuf>,
    show_breakdown: bool,
) -> Result<()> {
    let mut config = load_config(&config_path, pairs)?;
    if let Some(dir) = output {
        config.output.dir = dir;
    }

    let loaded = load_pairs(&config.data, &config.data.pairs)?;
    print_failures(&loaded.failures);
    exit_if_all_failed(&loaded);

    for pair in &loaded.pairs {
        let report = run_pair(&pair.series, &config);
        println!();
        print!("{}", format_summary(&report));
        if show_breakdown {
            for policy in &report.policies {
                println!();
                println!("--- {} ---", policy.label);
                print!("{}", format_breakdown(&policy.breakdown));
            }
        }

        let run_dir = save_artifacts(&report, &config, &config.output.dir)?;
        if config.output.chart {
            let swings = run_detection(pair.series.bars(), &config.detector).swings;
            let title = format!("{} {}", report.pair, report.timeframe.as_str());
            write_chart_html(
                &run_dir.join("chart.html"),
                &pair.series,
                &report.signals,
                &swings,
                &title,
            )?;
        }
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_compare(config_path: PathBuf, pairs: Vec<String>) -> Result<()> {
    let config = load_config(&config_path, pairs)?;
    let summary = run_pairs(&config)?;
    print_failures(&summary.failures);
    if summary.all_failed() {
        eprintln!("No pairs could be loaded.");
        std::process::exit(1);
    }
    for report in &summary.reports {
        println!();
        print!("{}", format_comparison(report));
    }
    Ok(())
}

fn run_sweep(
    config_path: PathBuf,
    pivot_lens: Vec<usize>,
    impulse_mults: Vec<f64>,
    top: Option<usize>,
) -> Result<()> {
    let base = load_config(&config_path, Vec::new())?;
    let grid = DetectorGrid {
        pivot_lens,
        impulse_mults,
    };
    let configs = grid.generate_configs(&base);
    if configs.is_empty() {
        bail!("sweep grid is empty (pivot lengths must be at least 1)");
    }

    let loaded = load_pairs(&base.data, &base.data.pairs)?;
    print_failures(&loaded.failures);
    exit_if_all_failed(&loaded);

    let series: Vec<_> = loaded.pairs.into_iter().map(|p| p.series).collect();
    let results = sweep(&series, &configs);

    let table = results.format_table();
    let limit = top.map_or(usize::MAX, |n| n + 1);
    for line in table.lines().take(limit) {
        println!("{line}");
    }
    Ok(())
}

fn run_chart(
    csv: PathBuf,
    out: PathBuf,
    config_path: Option<PathBuf>,
    pivot_len: Option<usize>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => BacktestConfig::from_file(&path)?,
        None => BacktestConfig::default(),
    };
    if let Some(n) = pivot_len {
        config.detector.pivot_len = n;
    }
    config.validate()?;

    let series = load_csv(
        &csv,
        &CsvOptions {
            keep_weekends: true,
            symbol: None,
        },
    )?;
    let detection = run_detection(series.bars(), &config.detector);
    let title = format!(
        "{} | {} bars | {} swings | {} signals",
        series.symbol,
        series.len(),
        detection.swings.len(),
        detection.signals.len()
    );
    let html = render_chart_html(&series, &detection.signals, &detection.swings, &title);
    std::fs::write(&out, html).with_context(|| format!("failed to write {}", out.display()))?;
    println!("Chart written to: {}", out.display());
    Ok(())
}
