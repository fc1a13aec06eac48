//! CSV snapshot import and export.
//!
//! Accepts the loose column conventions seen in exported price files:
//! capitalised or lowercase OHLCV headers (capitalised wins, lowercase fills
//! gaps) and a `datetime`/`time`/`date` timestamp column. The export side
//! always writes the canonical `datetime,Open,High,Low,Close,Volume` layout.

use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use csv::StringRecord;

use super::provider::DataError;
use crate::domain::{Bar, BarSeries};

const TIME_COLUMNS: [&str; 6] = ["datetime", "Datetime", "time", "Time", "date", "Date"];
const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M",
];

/// Options for [`load_csv`].
#[derive(Debug, Clone, Default)]
pub struct CsvOptions {
    /// Keep Saturday/Sunday rows (crypto trades through the weekend).
    pub keep_weekends: bool,
    /// Series symbol; defaults to the file stem up to the first `_`.
    pub symbol: Option<String>,
}

/// Column positions for one OHLCV field: capitalised first, then lowercase.
#[derive(Debug, Clone, Copy)]
struct Column {
    primary: Option<usize>,
    fallback: Option<usize>,
}

impl Column {
    fn find(headers: &StringRecord, name: &str) -> Self {
        let lower = name.to_lowercase();
        Self {
            primary: headers.iter().position(|h| h == name),
            fallback: headers.iter().position(|h| h == lower),
        }
    }

    fn exists(&self) -> bool {
        self.primary.is_some() || self.fallback.is_some()
    }

    fn read(&self, record: &StringRecord) -> Option<f64> {
        let parse = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        parse(self.primary).or_else(|| parse(self.fallback))
    }
}

/// Parse a timestamp in any of the accepted layouts. Offsets are normalised
/// to UTC.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DataError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.naive_utc());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DataError::BadTimestamp(s.to_string()))
}

fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.split('_').next().unwrap_or(s).to_string())
        .unwrap_or_default()
}

/// Load a bar series from a CSV file.
///
/// Rows with a missing OHLC value are dropped, as are weekend rows unless
/// `keep_weekends` is set. The result is sorted with duplicate timestamps
/// collapsed.
pub fn load_csv(path: &Path, options: &CsvOptions) -> Result<BarSeries, DataError> {
    if !path.exists() {
        return Err(DataError::FileNotFound(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let missing = |column: &str| DataError::MissingColumn {
        path: path.to_path_buf(),
        column: column.to_string(),
    };
    let time_col = TIME_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h == *name))
        .ok_or_else(|| missing("datetime"))?;
    let [open, high, low, close, volume] =
        ["Open", "High", "Low", "Close", "Volume"].map(|name| Column::find(&headers, name));
    for (column, name) in [(open, "Open"), (high, "High"), (low, "Low"), (close, "Close")] {
        if !column.exists() {
            return Err(missing(name));
        }
    }

    let mut bars = Vec::new();
    let mut dropped_missing = 0usize;
    let mut dropped_weekend = 0usize;
    for record in reader.records() {
        let record = record?;
        let Some(raw_time) = record.get(time_col).filter(|s| !s.is_empty()) else {
            dropped_missing += 1;
            continue;
        };
        let time = parse_timestamp(raw_time)?;
        let (Some(o), Some(h), Some(l), Some(c)) = (
            open.read(&record),
            high.read(&record),
            low.read(&record),
            close.read(&record),
        ) else {
            dropped_missing += 1;
            continue;
        };
        if !options.keep_weekends && matches!(time.weekday(), Weekday::Sat | Weekday::Sun) {
            dropped_weekend += 1;
            continue;
        }
        let mut bar = Bar::new(time, o, h, l, c);
        bar.volume = volume.read(&record);
        bars.push(bar);
    }

    let symbol = options
        .symbol
        .clone()
        .unwrap_or_else(|| symbol_from_path(path));
    let series = BarSeries::new(symbol, bars);
    tracing::debug!(
        path = %path.display(),
        bars = series.len(),
        dropped_missing,
        dropped_weekend,
        "loaded csv"
    );
    if series.is_empty() {
        return Err(DataError::Empty(path.to_path_buf()));
    }
    Ok(series)
}

/// Write `series` in the canonical snapshot layout, creating parent
/// directories as needed.
pub fn save_csv(series: &BarSeries, path: &Path) -> Result<(), DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DataError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["datetime", "Open", "High", "Low", "Close", "Volume"])?;
    for bar in series.bars() {
        writer.write_record([
            bar.time.format("%Y-%m-%d %H:%M:%S").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush().map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn coalesces_columns_and_drops_rows() {
        let dir = tempfile::tempdir().unwrap();
        // 2024-01-05 is a Friday, 2024-01-06 a Saturday.
        let path = write_file(
            &dir,
            "XAUUSD_M5.csv",
            "datetime,Open,High,Low,Close,open,high,low,close,symbol\n\
             2024-01-05 10:05:00,2,3,1,2.5,,,,,XAUUSD\n\
             2024-01-05 10:00:00,,,,,1,2,0.5,1.5,XAUUSD\n\
             2024-01-05 10:10:00,2.5,,1,2,,,,,XAUUSD\n\
             2024-01-06 10:00:00,2,3,1,2,,,,,XAUUSD\n",
        );
        let series = load_csv(&path, &CsvOptions::default()).unwrap();
        assert_eq!(series.symbol, "XAUUSD");
        assert_eq!(series.len(), 2);
        let bars = series.bars();
        assert_eq!(bars[0].open, 1.0);
        assert_eq!(bars[0].close, 1.5);
        assert_eq!(bars[1].high, 3.0);

        let crypto = CsvOptions {
            keep_weekends: true,
            ..CsvOptions::default()
        };
        assert_eq!(load_csv(&path, &crypto).unwrap().len(), 3);
    }

    #[test]
    fn capitalised_value_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "EURUSD.csv",
            "time,Open,open,High,Low,Close\n2024-01-02T00:00:00Z,1.1,9.9,1.2,1.0,1.15\n",
        );
        let series = load_csv(&path, &CsvOptions::default()).unwrap();
        assert_eq!(series.bars()[0].open, 1.1);
    }

    #[test]
    fn normalises_offsets() {
        let t = parse_timestamp("2024-01-02 05:00:00+02:00").unwrap();
        assert_eq!(t.format("%H:%M").to_string(), "03:00");
        let t = parse_timestamp("2024-01-02T05:00:00-01:00").unwrap();
        assert_eq!(t.format("%H:%M").to_string(), "06:00");
        assert!(parse_timestamp("yesterday").is_err());
        assert_eq!(
            parse_timestamp("2024-01-02").unwrap().format("%H").to_string(),
            "00"
        );
    }

    #[test]
    fn missing_file_and_column() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_csv(&dir.path().join("nope.csv"), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::FileNotFound(_)));

        let path = write_file(&dir, "bad.csv", "datetime,Open,High,Close\n2024-01-02,1,2,1\n");
        let err = load_csv(&path, &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "Low"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let series = crate::data::synthetic_series("SYN", 50, 3);
        let path = dir.path().join("nested").join("SYN_M5.csv");
        save_csv(&series, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("datetime,Open,High,Low,Close,Volume\n"));
        let opts = CsvOptions {
            keep_weekends: true,
            ..CsvOptions::default()
        };
        let back = load_csv(&path, &opts).unwrap();
        assert_eq!(back.len(), series.len());
        assert_eq!(back.bars()[10].close, series.bars()[10].close);
    }
}
