//! Static HTML chart export.
//!
//! Renders a self-contained HTML page with an inline SVG candlestick chart:
//! - one candle per bar, green if close >= open, red otherwise
//! - swing highs as orange down-triangles, swing lows as blue up-triangles
//! - per signal: an entry marker plus entry/stop/target lines
//!
//! Only the trailing [`MAX_CHART_BARS`] bars are drawn; swings and signals
//! outside that window are skipped. No scripts, no external assets.

use std::path::Path;

use anyhow::{Context, Result};

use swingbreak_core::domain::{BarSeries, Direction, Signal, SwingKind, SwingPoint};

pub const MAX_CHART_BARS: usize = 600;

const CANDLE_WIDTH: f64 = 8.0;
const PLOT_HEIGHT: f64 = 560.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 30.0;
/// How many bars the entry/stop/target lines extend past the signal bar.
const LEVEL_SPAN: usize = 30;

const UP: &str = "#26a69a";
const DOWN: &str = "#ef5350";
const SWING_HIGH: &str = "#ff9800";
const SWING_LOW: &str = "#2196f3";

/// Vertical price scale of the plot area.
struct Scale {
    lower: f64,
    upper: f64,
}

impl Scale {
    fn y(&self, price: f64) -> f64 {
        if (self.upper - self.lower).abs() < 1e-12 {
            return MARGIN_TOP + PLOT_HEIGHT / 2.0;
        }
        let frac = (price - self.lower) / (self.upper - self.lower);
        MARGIN_TOP + PLOT_HEIGHT * (1.0 - frac.clamp(0.0, 1.0))
    }
}

fn x_center(slot: usize) -> f64 {
    MARGIN_LEFT + slot as f64 * CANDLE_WIDTH + CANDLE_WIDTH / 2.0
}

/// Render the chart page.
pub fn render_chart_html(
    series: &BarSeries,
    signals: &[Signal],
    swings: &[SwingPoint],
    title: &str,
) -> String {
    let bars = series.bars();
    let start = bars.len().saturating_sub(MAX_CHART_BARS);
    let window = &bars[start..];
    let title = escape(title);

    let mut html = String::with_capacity(64 * 1024);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n"));
    html.push_str(
        "<style>body{background:#131722;color:#d1d4dc;font-family:monospace}\
         text{fill:#787b86;font-size:11px}</style>\n",
    );
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h3>{title}</h3>\n"));

    if window.is_empty() {
        html.push_str("<p>No data</p>\n</body>\n</html>\n");
        return html;
    }

    // Price bounds with 5% padding; levels count so lines stay on the plot.
    let in_window = |idx: usize| idx >= start && idx < bars.len();
    let mut lo = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let mut hi = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    for s in signals.iter().filter(|s| in_window(s.signal_index)) {
        lo = lo.min(s.stop).min(s.target);
        hi = hi.max(s.stop).max(s.target);
    }
    let range = hi - lo;
    let pad = if range > 0.0 { range * 0.05 } else { 1.0 };
    let scale = Scale {
        lower: lo - pad,
        upper: hi + pad,
    };

    let width = MARGIN_LEFT + window.len() as f64 * CANDLE_WIDTH + MARGIN_RIGHT;
    let height = MARGIN_TOP + PLOT_HEIGHT + MARGIN_BOTTOM;
    html.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\">\n"
    ));

    // Y-axis grid
    for k in 0..=4 {
        let price = scale.lower + (scale.upper - scale.lower) * k as f64 / 4.0;
        let y = scale.y(price);
        html.push_str(&format!(
            "<line x1=\"{MARGIN_LEFT}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#2a2e39\"/>\
             <text x=\"4\" y=\"{:.1}\">{price:.2}</text>\n",
            width - MARGIN_RIGHT,
            y + 4.0
        ));
    }

    // X-axis: first and last timestamp
    let base_y = MARGIN_TOP + PLOT_HEIGHT + 18.0;
    html.push_str(&format!(
        "<text x=\"{MARGIN_LEFT}\" y=\"{base_y:.1}\">{}</text>\n",
        window[0].time
    ));
    html.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{base_y:.1}\" text-anchor=\"end\">{}</text>\n",
        width - MARGIN_RIGHT,
        window[window.len() - 1].time
    ));

    // Candles
    for (slot, bar) in window.iter().enumerate() {
        let color = if bar.close >= bar.open { UP } else { DOWN };
        let x = x_center(slot);
        let body_top = scale.y(bar.open.max(bar.close));
        let body_bot = scale.y(bar.open.min(bar.close));
        html.push_str(&format!(
            "<g class=\"candle\"><line x1=\"{x:.1}\" y1=\"{:.1}\" x2=\"{x:.1}\" y2=\"{:.1}\" stroke=\"{color}\"/>\
             <rect x=\"{:.1}\" y=\"{body_top:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{color}\"/></g>\n",
            scale.y(bar.high),
            scale.y(bar.low),
            x - CANDLE_WIDTH * 0.35,
            CANDLE_WIDTH * 0.7,
            (body_bot - body_top).max(1.0),
        ));
    }

    // Swing markers
    for swing in swings.iter().filter(|s| in_window(s.bar_index)) {
        let x = x_center(swing.bar_index - start);
        let y = scale.y(swing.price);
        let (points, color, label) = match swing.kind {
            SwingKind::High => (
                format!("{:.1},{:.1} {:.1},{:.1} {x:.1},{:.1}", x - 4.0, y - 10.0, x + 4.0, y - 10.0, y - 3.0),
                SWING_HIGH,
                "SH",
            ),
            SwingKind::Low => (
                format!("{:.1},{:.1} {:.1},{:.1} {x:.1},{:.1}", x - 4.0, y + 10.0, x + 4.0, y + 10.0, y + 3.0),
                SWING_LOW,
                "SL",
            ),
        };
        html.push_str(&format!(
            "<polygon class=\"swing\" points=\"{points}\" fill=\"{color}\"><title>{label} {:.5} {}</title></polygon>\n",
            swing.price, swing.time
        ));
    }

    // Signals
    for s in signals.iter().filter(|s| in_window(s.signal_index)) {
        let slot = s.signal_index - start;
        let x1 = x_center(slot);
        let x2 = x_center((slot + LEVEL_SPAN).min(window.len() - 1));
        for (price, color, dash) in [
            (s.entry, "#d1d4dc", ""),
            (s.stop, DOWN, " stroke-dasharray=\"4 3\""),
            (s.target, UP, " stroke-dasharray=\"4 3\""),
        ] {
            let y = scale.y(price);
            html.push_str(&format!(
                "<line class=\"level\" x1=\"{x1:.1}\" y1=\"{y:.1}\" x2=\"{x2:.1}\" y2=\"{y:.1}\" stroke=\"{color}\"{dash}/>\n"
            ));
        }

        let y = scale.y(s.entry);
        let (points, color) = match s.direction {
            Direction::Buy => (
                format!("{:.1},{:.1} {:.1},{:.1} {x1:.1},{y:.1}", x1 - 6.0, y + 12.0, x1 + 6.0, y + 12.0),
                "#00e676",
            ),
            Direction::Sell => (
                format!("{:.1},{:.1} {:.1},{:.1} {x1:.1},{y:.1}", x1 - 6.0, y - 12.0, x1 + 6.0, y - 12.0),
                "#ff1744",
            ),
        };
        html.push_str(&format!(
            "<polygon class=\"signal\" points=\"{points}\" fill=\"{color}\" stroke=\"white\">\
             <title>{} {} entry {:.5} stop {:.5} target {:.5} RR {:.2} [{}]</title></polygon>\n",
            s.direction.as_str(),
            s.signal_time,
            s.entry,
            s.stop,
            s.target,
            s.planned_rr(),
            s.result.as_str(),
        ));
    }

    html.push_str("</svg>\n</body>\n</html>\n");
    html
}

/// Render and write the chart to `path`.
pub fn write_chart_html(
    path: &Path,
    series: &BarSeries,
    signals: &[Signal],
    swings: &[SwingPoint],
    title: &str,
) -> Result<()> {
    let html = render_chart_html(series, signals, swings, title);
    std::fs::write(path, html).with_context(|| format!("failed to write chart {}", path.display()))
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
