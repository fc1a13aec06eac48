//! Reporting and export: CSV, JSON manifest and console tables.
//!
//! Provides:
//! - **CSV**: the signal tape and one outcome tape per exit policy
//! - **JSON**: a run manifest carrying the full [`PairReport`] plus the
//!   schema version, dataset hash and config hash
//! - **Console**: a per-pair summary table, a breakdown table and a
//!   side-by-side comparison of exit policies
//!
//! Manifests with a schema version newer than [`SCHEMA_VERSION`] are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use swingbreak_core::domain::Signal;
use swingbreak_core::outcome::TradeOutcome;

use crate::breakdown::{Breakdown, GroupStats};
use crate::config::BacktestConfig;
use crate::runner::{PairReport, SCHEMA_VERSION};

/// Everything persisted in `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub pair: String,
    pub dataset_hash: String,
    pub config_hash: String,
    pub config: BacktestConfig,
    pub report: PairReport,
}

impl RunManifest {
    pub fn new(report: &PairReport, config: &BacktestConfig) -> Result<Self> {
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            pair: report.pair.clone(),
            dataset_hash: report.dataset_hash.clone(),
            config_hash: config.config_hash()?,
            config: config.clone(),
            report: report.clone(),
        })
    }
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(manifest: &RunManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize run manifest to JSON")
}

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunManifest> {
    let manifest: RunManifest =
        serde_json::from_str(json).context("failed to deserialize run manifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Signal tape, one row per emitted signal.
pub fn signals_to_csv(signals: &[Signal]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "direction",
        "entry",
        "stop",
        "target",
        "planned_rr",
        "wave1_extreme",
        "break_index",
        "break_time",
        "confirm_index",
        "confirm_time",
        "signal_index",
        "signal_time",
        "wave_confirm_time",
        "result",
        "pnl_r",
    ])?;

    for s in signals {
        wtr.write_record([
            s.direction.as_str(),
            &format!("{:.5}", s.entry),
            &format!("{:.5}", s.stop),
            &format!("{:.5}", s.target),
            &format!("{:.2}", s.planned_rr()),
            &format!("{:.5}", s.wave1_extreme),
            &s.break_index.to_string(),
            &s.break_time.to_string(),
            &s.confirm_index.to_string(),
            &s.confirm_time.to_string(),
            &s.signal_index.to_string(),
            &s.signal_time.to_string(),
            &s.wave_confirm_time.map(|t| t.to_string()).unwrap_or_default(),
            s.result.as_str(),
            &format!("{:.2}", s.pnl_r),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Outcome tape for one exit policy.
pub fn outcomes_to_csv(outcomes: &[TradeOutcome]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "signal",
        "direction",
        "entry",
        "stop",
        "target",
        "planned_rr",
        "signal_time",
        "reason",
        "exit_index",
        "exit_time",
        "exit_price",
        "pnl_r",
        "bars_held",
        "bars_to_confirm",
    ])?;

    for o in outcomes {
        wtr.write_record([
            o.signal.to_string().as_str(),
            o.direction.as_str(),
            &format!("{:.5}", o.entry),
            &format!("{:.5}", o.stop),
            &format!("{:.5}", o.target),
            &format!("{:.2}", o.planned_rr),
            &o.signal_time.to_string(),
            o.reason.as_str(),
            &o.exit_index.map(|i| i.to_string()).unwrap_or_default(),
            &o.exit_time.map(|t| t.to_string()).unwrap_or_default(),
            &format!("{:.5}", o.exit_price),
            &format!("{:.3}", o.pnl_r),
            &o.bars_held.to_string(),
            &o.bars_to_confirm().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one pair.
///
/// Creates `{pair}_{timestamp}/` under `output_dir` containing
/// `manifest.json`, `signals.csv` and `outcomes_{policy}.csv` per exit
/// policy. Returns the created directory.
pub fn save_artifacts(
    report: &PairReport,
    config: &BacktestConfig,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.pair,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let manifest = RunManifest::new(report, config)?;
    write(&run_dir.join("manifest.json"), &export_json(&manifest)?)?;
    write(&run_dir.join("signals.csv"), &signals_to_csv(&report.signals)?)?;
    for policy in &report.policies {
        let name = format!("outcomes_{}.csv", policy.label);
        write(&run_dir.join(name), &outcomes_to_csv(&policy.outcomes)?)?;
    }

    Ok(run_dir)
}

/// Load the manifest from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<RunManifest> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Console tables ─────────────────────────────────────────────────

/// Per-pair summary: data span, detection counts and one row per policy.
pub fn format_summary(report: &PairReport) -> String {
    let mut out = String::with_capacity(1024);
    let span = match (report.first_bar, report.last_bar) {
        (Some(a), Some(b)) => format!("{a} .. {b}"),
        _ => "empty".to_string(),
    };
    out.push_str(&format!(
        "{} {}  {} bars  ({span})\n",
        report.pair,
        report.timeframe.as_str(),
        report.bar_count
    ));
    out.push_str(&format!(
        "swings {}  breaks {}  signals {}",
        report.swing_count, report.break_count, report.raw_signal_count
    ));
    if let Some(htf) = report.htf {
        out.push_str(&format!(
            "  htf kept {} rejected {} (no data {})",
            htf.kept, htf.rejected, htf.no_data
        ));
    }
    out.push_str("\n\n");

    out.push_str(&format!(
        "{:<14} {:>6} {:>6} {:>6} {:>7} {:>8} {:>7} {:>6} {:>7} {:>7}\n",
        "policy", "trades", "closed", "open", "win%", "total_r", "avg_r", "pf", "max_dd", "streak"
    ));
    for p in &report.policies {
        let m = &p.metrics;
        out.push_str(&format!(
            "{:<14} {:>6} {:>6} {:>6} {:>7} {:>8} {:>7} {:>6} {:>7} {:>7}\n",
            p.label,
            m.trades,
            m.closed,
            m.open,
            pct(m.win_rate),
            f2(m.total_r),
            f2(m.avg_r),
            f2(m.profit_factor),
            f2(m.max_drawdown_r),
            m.max_consecutive_losses,
        ));
    }
    out
}

/// Breakdown tables for one policy; empty dimensions are skipped.
pub fn format_breakdown(breakdown: &Breakdown) -> String {
    let dims: [(&str, &[GroupStats]); 7] = [
        ("hour (UTC)", &breakdown.by_hour),
        ("session", &breakdown.by_session),
        ("weekday", &breakdown.by_weekday),
        ("direction", &breakdown.by_direction),
        ("bars to confirm", &breakdown.by_bars_to_confirm),
        ("planned R:R", &breakdown.by_planned_rr),
        ("ATR quartile", &breakdown.by_atr_quartile),
    ];

    let mut out = String::new();
    for (title, groups) in dims {
        if groups.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "{title:<16} {:>6} {:>5} {:>7} {:>8} {:>7}\n",
            "n", "wins", "win%", "total_r", "avg_r"
        ));
        for g in groups {
            out.push_str(&format!(
                "  {:<14} {:>6} {:>5} {:>7} {:>8} {:>7}\n",
                g.label,
                g.total,
                g.wins,
                pct(g.win_rate),
                f2(g.total_r),
                f2(g.avg_r)
            ));
        }
        out.push('\n');
    }
    out
}

/// Side-by-side policy comparison, with deltas against the first policy.
pub fn format_comparison(report: &PairReport) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(&format!("{} exit policy comparison\n\n", report.pair));
    let Some(base) = report.policies.first() else {
        out.push_str("no exit policies\n");
        return out;
    };

    out.push_str(&format!("{:<16}", "metric"));
    for p in &report.policies {
        out.push_str(&format!(" {:>12}", p.label));
    }
    out.push('\n');

    let rows: [(&str, fn(&crate::metrics::RMetrics) -> f64, bool); 7] = [
        ("win rate", |m| m.win_rate, true),
        ("total R", |m| m.total_r, false),
        ("avg R", |m| m.avg_r, false),
        ("avg win R", |m| m.avg_win_r, false),
        ("avg loss R", |m| m.avg_loss_r, false),
        ("profit factor", |m| m.profit_factor, false),
        ("max DD R", |m| m.max_drawdown_r, false),
    ];
    for (name, get, is_pct) in rows {
        out.push_str(&format!("{name:<16}"));
        let a = get(&base.metrics);
        for (i, p) in report.policies.iter().enumerate() {
            let b = get(&p.metrics);
            let cell = match (i, is_pct) {
                (0, true) => pct(b),
                (0, false) => f2(b),
                (_, true) => format!("{} ({})", pct(b), delta_pct(a, b)),
                (_, false) => format!("{} ({})", f2(b), delta_f2(a, b)),
            };
            out.push_str(&format!(" {cell:>12}"));
        }
        out.push('\n');
    }

    out.push_str(&format!("{:<16}", "closed / open"));
    for p in &report.policies {
        let cell = format!("{} / {}", p.metrics.closed, p.metrics.open);
        out.push_str(&format!(" {cell:>12}"));
    }
    out.push('\n');
    out
}

// ─── Helpers ────────────────────────────────────────────────────────

fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

fn f2(v: f64) -> String {
    format!("{:.2}", v)
}

fn delta_pct(a: f64, b: f64) -> String {
    let d = (b - a) * 100.0;
    if d >= 0.0 {
        format!("+{:.1}", d)
    } else {
        format!("{:.1}", d)
    }
}

fn delta_f2(a: f64, b: f64) -> String {
    let d = b - a;
    if d >= 0.0 {
        format!("+{:.2}", d)
    } else {
        format!("{:.2}", d)
    }
}
