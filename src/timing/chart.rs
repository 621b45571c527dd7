//! Static SVG chart of baseline vs. optimized timer means.
//!
//! Each timer gets one horizontal row: a light blue bar for the baseline
//! mean, a baseline marker with a min/max error bar just above the bar's
//! center line, and a dark red optimized marker with its own error bar just
//! below it. Rows whose difference passes the annotation threshold carry a
//! `12.3% faster` style label next to the optimized marker.

use crate::timing::children::ChildrenReport;
use crate::timing::compare::{AnnotationStyle, TimerComparison, TimerStats, annotation};
use crate::Result;
use std::fmt::Write;
use std::path::Path;

const BASELINE_COLOR: &str = "#88c2f0";
const OPTIMIZED_COLOR: &str = "#8B0000";

const WIDTH: f64 = 900.0;
const ROW_HEIGHT: f64 = 44.0;
const MARGIN_LEFT: f64 = 240.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 90.0;
/// Upper bound on x-axis ticks.
const MAX_TICKS: usize = 20;
/// Vertical offset of the markers from the row center.
const MARKER_DY: f64 = 0.25 * ROW_HEIGHT;

/// One row of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub label: String,
    pub baseline: TimerStats,
    pub optimized: Option<TimerStats>,
    pub annotation: Option<String>,
}

/// Text and placement options.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub title: String,
    pub baseline_label: String,
    pub optimized_label: String,
    pub x_label: String,
    /// Shift of the annotation text left of the optimized mean, in seconds
    pub label_offset: f64,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Baseline vs Optimized Timings".to_string(),
            baseline_label: "Baseline".to_string(),
            optimized_label: "Optimized".to_string(),
            x_label: "time (s)".to_string(),
            label_offset: 1.4,
        }
    }
}

/// Rows for a named-timer comparison.
pub fn rows_from_comparison(
    rows: &[TimerComparison],
    threshold: f64,
    style: AnnotationStyle,
) -> Vec<ChartRow> {
    rows.iter()
        .map(|r| ChartRow {
            label: r.label.clone(),
            baseline: r.baseline,
            optimized: r.optimized,
            annotation: r.annotation(threshold, style),
        })
        .collect()
}

/// Rows for a children report.
pub fn rows_from_children(
    report: &ChildrenReport,
    threshold: f64,
    style: AnnotationStyle,
) -> Vec<ChartRow> {
    report
        .children
        .iter()
        .map(|c| {
            let baseline = TimerStats::from(&c.baseline);
            let optimized = c.optimized.as_ref().map(TimerStats::from);
            ChartRow {
                label: c.baseline.region.clone(),
                baseline,
                optimized,
                annotation: optimized
                    .and_then(|o| annotation(baseline.mean, o.mean, threshold, style)),
            }
        })
        .collect()
}

/// Escape text for use in SVG content and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// A "nice" tick step (1, 2 or 5 times a power of ten) giving roughly
/// `target` intervals over `[0, max]`.
pub fn nice_step(max: f64, target: usize) -> f64 {
    if max <= 0.0 || !max.is_finite() {
        return 1.0;
    }
    let raw = max / target.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    format!("{:.*}", decimals, value)
}

/// Render the chart as an SVG document.
pub fn render_svg(rows: &[ChartRow], opts: &ChartOptions) -> String {
    let plot_height = ROW_HEIGHT * rows.len().max(1) as f64;
    let height = MARGIN_TOP + plot_height + MARGIN_BOTTOM;
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;

    let data_max = rows
        .iter()
        .flat_map(|r| {
            std::iter::once(r.baseline.max.max(r.baseline.mean))
                .chain(r.optimized.map(|o| o.max.max(o.mean)))
        })
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max)
        .min(f64::MAX / 2.0);
    let step = nice_step(data_max * 1.05, 6);
    let x_max = ((data_max * 1.05) / step).ceil().max(1.0) * step;
    let x = |v: f64| MARGIN_LEFT + (v.max(0.0) / x_max) * plot_width;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = height
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="20" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        MARGIN_TOP / 2.0 + 6.0,
        escape_xml(&opts.title)
    );

    // x axis with grid lines
    let axis_y = MARGIN_TOP + plot_height;
    let ticks = ((x_max / step).round() as usize).min(MAX_TICKS);
    for k in 0..=ticks {
        let tick = k as f64 * step;
        let tx = x(tick);
        let _ = writeln!(
            svg,
            "<line x1=\"{tx:.1}\" y1=\"{MARGIN_TOP}\" x2=\"{tx:.1}\" y2=\"{axis_y}\" stroke=\"#e0e0e0\"/>"
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{}" font-size="12" text-anchor="middle">{}</text>"#,
            tx,
            axis_y + 18.0,
            format_tick(tick, step)
        );
    }
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{axis_y}" x2="{:.1}" y2="{axis_y}" stroke="black"/>"#,
        MARGIN_LEFT + plot_width
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{}" font-size="14" text-anchor="middle">{}</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        axis_y + 40.0,
        escape_xml(&opts.x_label)
    );

    for (i, row) in rows.iter().enumerate() {
        let cy = MARGIN_TOP + ROW_HEIGHT * (i as f64 + 0.5);
        let base = &row.baseline;

        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{:.1}" font-size="14" text-anchor="end" dominant-baseline="middle">{}</text>"#,
            MARGIN_LEFT - 8.0,
            cy,
            escape_xml(&row.label)
        );
        let _ = writeln!(
            svg,
            r#"<rect class="bar" x="{MARGIN_LEFT}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{BASELINE_COLOR}"/>"#,
            cy - 0.4 * ROW_HEIGHT,
            x(base.mean) - MARGIN_LEFT,
            0.8 * ROW_HEIGHT
        );
        error_bar(&mut svg, &x, base, cy - MARKER_DY, "black", BASELINE_COLOR);

        if let Some(ref opt) = row.optimized {
            error_bar(&mut svg, &x, opt, cy + MARKER_DY, OPTIMIZED_COLOR, OPTIMIZED_COLOR);
            if let Some(ref text) = row.annotation {
                let tx = x(opt.mean - opts.label_offset).max(MARGIN_LEFT + 4.0);
                let _ = writeln!(
                    svg,
                    r#"<text class="annotation" x="{:.1}" y="{:.1}" font-size="15" fill="{OPTIMIZED_COLOR}" dominant-baseline="middle">{}</text>"#,
                    tx,
                    cy,
                    escape_xml(text)
                );
            }
        }
    }

    // legend
    let ly = axis_y + 66.0;
    let entries = [
        (BASELINE_COLOR, opts.baseline_label.as_str()),
        (OPTIMIZED_COLOR, opts.optimized_label.as_str()),
    ];
    for (k, (color, label)) in entries.iter().enumerate() {
        let lx = WIDTH - MARGIN_RIGHT - 300.0 + 150.0 * k as f64;
        let _ = writeln!(svg, r#"<circle cx="{lx}" cy="{ly}" r="5" fill="{color}"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{ly}" font-size="14" dominant-baseline="middle">{}</text>"#,
            lx + 10.0,
            escape_xml(label)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn error_bar(
    svg: &mut String,
    x: &dyn Fn(f64) -> f64,
    stats: &TimerStats,
    y: f64,
    stroke: &str,
    fill: &str,
) {
    let lo = x(stats.mean - stats.err_low());
    let hi = x(stats.mean + stats.err_high());
    let cap = 4.0;
    let _ = writeln!(
        svg,
        r#"<g class="errorbar" stroke="{stroke}" stroke-width="2"><line x1="{lo:.1}" y1="{y:.1}" x2="{hi:.1}" y2="{y:.1}"/><line x1="{lo:.1}" y1="{:.1}" x2="{lo:.1}" y2="{:.1}"/><line x1="{hi:.1}" y1="{:.1}" x2="{hi:.1}" y2="{:.1}"/></g>"#,
        y - cap,
        y + cap,
        y - cap,
        y + cap
    );
    let _ = writeln!(
        svg,
        r#"<circle class="marker" cx="{:.1}" cy="{y:.1}" r="5" fill="{fill}"/>"#,
        x(stats.mean)
    );
}

/// Render and write the chart to `path`.
pub fn write_svg(path: &Path, rows: &[ChartRow], opts: &ChartOptions) -> Result<()> {
    std::fs::write(path, render_svg(rows, opts))?;
    Ok(())
}
