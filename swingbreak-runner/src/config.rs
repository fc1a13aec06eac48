//! Backtest configuration loaded from TOML.
//!
//! ```toml
//! [data]
//! pairs = ["XAUUSD", "EURUSD"]
//! data_dir = "data"
//! timeframe = "M5"
//!
//! [detector]
//! pivot_len = 5
//! target = { mode = "fixed_rr", ratio = 2.0 }
//!
//! [htf]
//! enabled = true
//!
//! [[exits]]
//! policy = "full"
//!
//! [[exits]]
//! policy = "trailing"
//! lock_r = 1.0
//! step_r = 0.5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use swingbreak_core::engine::{DetectorConfig, TargetMode};
use swingbreak_core::filters::HtfFilter;
use swingbreak_core::outcome::ExitPolicy;
use swingbreak_core::timeframe::Timeframe;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one backtest invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub data: DataSection,
    pub detector: DetectorConfig,
    pub htf: HtfSection,
    pub exits: Vec<ExitPolicy>,
    pub output: OutputSection,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            data: DataSection::default(),
            detector: DetectorConfig::default(),
            htf: HtfSection::default(),
            exits: vec![ExitPolicy::Full],
            output: OutputSection::default(),
        }
    }
}

/// `[data]`: which pairs to load and from where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub pairs: Vec<String>,
    pub data_dir: PathBuf,
    pub timeframe: Timeframe,
    pub drop_weekends: bool,
    /// Pairs that trade on weekends; their Saturday/Sunday rows are kept.
    pub crypto: Vec<String>,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            data_dir: PathBuf::from("data"),
            timeframe: Timeframe::M5,
            drop_weekends: true,
            crypto: vec!["BTCUSD".into(), "ETHUSD".into()],
        }
    }
}

impl DataSection {
    pub fn keeps_weekends(&self, pair: &str) -> bool {
        !self.drop_weekends || self.crypto.iter().any(|c| c.eq_ignore_ascii_case(pair))
    }
}

/// `[htf]`: optional higher-timeframe trend filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtfSection {
    pub enabled: bool,
    pub period_minutes: i64,
    pub ema_period: usize,
}

impl Default for HtfSection {
    fn default() -> Self {
        let filter = HtfFilter::default();
        Self {
            enabled: false,
            period_minutes: filter.period_minutes,
            ema_period: filter.ema_period,
        }
    }
}

impl HtfSection {
    /// The configured filter, or `None` when disabled.
    pub fn filter(&self) -> Option<HtfFilter> {
        self.enabled.then_some(HtfFilter {
            period_minutes: self.period_minutes,
            ema_period: self.ema_period,
        })
    }
}

/// `[output]`: where run artifacts go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
    /// Also write an HTML chart per pair.
    pub chart: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            chart: false,
        }
    }
}

impl BacktestConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the detector or simulator cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.detector;
        if d.pivot_len == 0 {
            return Err(invalid("detector.pivot_len must be at least 1"));
        }
        for (name, value) in [
            ("impulse_mult", d.impulse_mult),
            ("break_mult", d.break_mult),
            ("min_rr", d.min_rr),
            ("sl_buffer_pct", d.sl_buffer_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "detector.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        match d.target {
            TargetMode::FixedRr { ratio }
            | TargetMode::StructureFloor { ratio }
            | TargetMode::Wave1Floor { ratio }
                if !(ratio.is_finite() && ratio > 0.0) =>
            {
                return Err(invalid(format!(
                    "detector.target ratio must be positive, got {ratio}"
                )));
            }
            _ => {}
        }

        if self.htf.enabled && (self.htf.period_minutes <= 0 || self.htf.ema_period == 0) {
            return Err(invalid("htf.period_minutes and htf.ema_period must be positive"));
        }

        if self.exits.is_empty() {
            return Err(invalid("at least one [[exits]] policy is required"));
        }
        for policy in &self.exits {
            let params = match *policy {
                ExitPolicy::Full | ExitPolicy::Partial => vec![],
                ExitPolicy::Trailing { lock_r, step_r } => vec![lock_r, step_r],
                ExitPolicy::Breakeven {
                    trigger_r,
                    target_r,
                } => vec![trigger_r, target_r],
            };
            if params.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
                return Err(invalid(format!(
                    "exit policy {} needs positive parameters",
                    policy.label()
                )));
            }
        }
        Ok(())
    }

    /// BLAKE3 digest of the canonical JSON form; tags run artifacts.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Copy of this config with a different detector; used by sweeps.
    pub fn with_detector(&self, detector: DetectorConfig) -> Self {
        Self {
            detector,
            ..self.clone()
        }
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swingbreak_core::engine::Variant;

    const SAMPLE: &str = r#"
[data]
pairs = ["XAUUSD", "BTCUSD"]
data_dir = "csv"
timeframe = "M15"

[detector]
pivot_len = 3
variant = "wave_retest"
target = { mode = "fixed_rr", ratio = 2.0 }
min_rr = 1.0

[htf]
enabled = true
ema_period = 20

[[exits]]
policy = "full"

[[exits]]
policy = "breakeven"
trigger_r = 1.0
target_r = 3.0

[output]
dir = "out"
chart = true
"#;

    #[test]
    fn parses_all_sections() {
        let config = BacktestConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.data.pairs, vec!["XAUUSD", "BTCUSD"]);
        assert_eq!(config.data.timeframe, Timeframe::M15);
        assert_eq!(config.data.data_dir, PathBuf::from("csv"));
        assert_eq!(config.detector.pivot_len, 3);
        assert_eq!(config.detector.impulse_mult, 1.5);
        assert_eq!(config.detector.variant, Variant::WaveRetest);
        assert_eq!(config.detector.target, TargetMode::FixedRr { ratio: 2.0 });
        assert_eq!(config.detector.min_rr, 1.0);
        assert_eq!(
            config.htf.filter(),
            Some(HtfFilter {
                period_minutes: 60,
                ema_period: 20
            })
        );
        assert_eq!(config.exits.len(), 2);
        assert_eq!(
            config.exits[1],
            ExitPolicy::Breakeven {
                trigger_r: 1.0,
                target_r: 3.0
            }
        );
        assert!(config.output.chart);
    }

    #[test]
    fn parses_wave1_targets() {
        let peak =
            BacktestConfig::from_toml_str("[detector]\ntarget = { mode = \"wave1_peak\" }")
                .unwrap();
        assert_eq!(peak.detector.target, TargetMode::Wave1Peak);
        let floor = BacktestConfig::from_toml_str(
            "[detector]\ntarget = { mode = \"wave1_floor\", ratio = 2.0 }",
        )
        .unwrap();
        assert_eq!(floor.detector.target, TargetMode::Wave1Floor { ratio: 2.0 });
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = BacktestConfig::from_toml_str("").unwrap();
        assert_eq!(config, BacktestConfig::default());
        assert_eq!(config.detector.pivot_len, 5);
        assert_eq!(config.detector.break_mult, 0.25);
        assert_eq!(config.exits, vec![ExitPolicy::Full]);
        assert!(config.htf.filter().is_none());
    }

    #[test]
    fn weekends_kept_for_crypto_only() {
        let data = DataSection::default();
        assert!(data.keeps_weekends("btcusd"));
        assert!(!data.keeps_weekends("XAUUSD"));
        let all = DataSection {
            drop_weekends: false,
            ..DataSection::default()
        };
        assert!(all.keeps_weekends("XAUUSD"));
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            "[detector]\npivot_len = 0",
            "[detector]\nimpulse_mult = -1.0",
            "[detector]\nsl_buffer_pct = -0.1",
            "[detector]\ntarget = { mode = \"fixed_rr\", ratio = 0.0 }",
            "[detector]\ntarget = { mode = \"wave1_floor\", ratio = -1.0 }",
            "[[exits]]\npolicy = \"trailing\"\nlock_r = 0.0\nstep_r = 0.5",
            "exits = []",
        ];
        for toml in cases {
            let err = BacktestConfig::from_toml_str(toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{toml}: {err}");
        }
    }

    #[test]
    fn parse_error_is_reported() {
        let err = BacktestConfig::from_toml_str("[detector\npivot_len = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BacktestConfig::from_file(Path::new("/nonexistent/backtest.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn config_hash_is_deterministic_and_sensitive() {
        let a = BacktestConfig::default();
        let b = a.with_detector(DetectorConfig {
            pivot_len: 7,
            ..a.detector
        });
        assert_eq!(a.config_hash().unwrap(), a.config_hash().unwrap());
        assert_ne!(a.config_hash().unwrap(), b.config_hash().unwrap());
        assert_eq!(a.config_hash().unwrap().len(), 64);
    }
}
