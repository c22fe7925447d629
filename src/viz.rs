//! Visualization utilities for analysis results.
//!
//! Terminal-friendly sparklines for NAV paths, excess-return series, and
//! rolling active ratios, plus self-contained SVG renderings of the two
//! standard study charts: the active/passive bar chart and the
//! weight-versus-return scatter.

use std::fmt::Write;

use crate::decompose::{DecompositionResult, RollingPoint};
use crate::types::AlignedSeries;

/// Characters used for sparkline rendering, ordered from low to high.
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Generate an ASCII sparkline from a slice of values.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let sampled = if values.len() > width {
        downsample(values, width)
    } else {
        values.to_vec()
    };

    let min = sampled.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = sampled.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    sampled
        .iter()
        .map(|&v| {
            let normalized = if range > 0.0 {
                ((v - min) / range).clamp(0.0, 1.0)
            } else {
                0.5
            };
            let idx = ((normalized * 7.0).round() as usize).min(7);
            SPARKLINE_CHARS[idx]
        })
        .collect()
}

/// Downsample a slice to a target length by chunk averaging.
fn downsample(values: &[f64], target_len: usize) -> Vec<f64> {
    let chunk = values.len() as f64 / target_len as f64;
    let mut result = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let start = (i as f64 * chunk).floor() as usize;
        let end = (((i + 1) as f64 * chunk).ceil() as usize).min(values.len());
        if start < end {
            let sum: f64 = values[start..end].iter().sum();
            result.push(sum / (end - start) as f64);
        }
    }

    result
}

/// Sparkline of the active ratio across a rolling decomposition.
///
/// Undefined windows are skipped; the line covers defined windows only.
pub fn rolling_ratio_sparkline(points: &[RollingPoint], width: usize) -> String {
    let ratios: Vec<f64> = points.iter().filter_map(|p| p.active_ratio).collect();
    sparkline(&ratios, width)
}

/// SVG bar chart of the active and passive components.
pub fn decomposition_bar_svg(result: &DecompositionResult) -> String {
    const WIDTH: f64 = 420.0;
    const HEIGHT: f64 = 260.0;
    const BAR_WIDTH: f64 = 110.0;
    let baseline = HEIGHT / 2.0;

    let magnitude = result
        .active_component
        .abs()
        .max(result.passive_component.abs())
        .max(f64::MIN_POSITIVE);
    let scale = (HEIGHT / 2.0 - 40.0) / magnitude;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = write!(
        svg,
        r##"<rect width="{w}" height="{h}" fill="white"/>"##,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = write!(
        svg,
        r##"<line x1="0" y1="{y}" x2="{w}" y2="{y}" stroke="#999" stroke-width="1"/>"##,
        y = baseline,
        w = WIDTH
    );

    let bars = [
        ("Active", result.active_component, "#2c7fb8", 70.0),
        ("Passive", result.passive_component, "#7fcdbb", 240.0),
    ];
    for (label, value, color, x) in bars {
        let height = (value * scale).abs();
        let y = if value >= 0.0 {
            baseline - height
        } else {
            baseline
        };
        let _ = write!(
            svg,
            r##"<rect x="{x}" y="{y}" width="{bw}" height="{hh}" fill="{color}"/>"##,
            x = x,
            y = y,
            bw = BAR_WIDTH,
            hh = height,
            color = color
        );
        let _ = write!(
            svg,
            r##"<text x="{tx}" y="{ty}" font-family="sans-serif" font-size="13" text-anchor="middle">{label}</text>"##,
            tx = x + BAR_WIDTH / 2.0,
            ty = HEIGHT - 12.0,
            label = label
        );
        let _ = write!(
            svg,
            r##"<text x="{tx}" y="{ty}" font-family="sans-serif" font-size="11" text-anchor="middle">{value:.6}</text>"##,
            tx = x + BAR_WIDTH / 2.0,
            ty = if value >= 0.0 { y - 6.0 } else { y + height + 14.0 },
            value = value
        );
    }

    svg.push_str("</svg>");
    svg
}

/// SVG scatter plot of per-period weights against returns.
pub fn weight_return_scatter_svg(series: &AlignedSeries) -> String {
    const WIDTH: f64 = 420.0;
    const HEIGHT: f64 = 320.0;
    const MARGIN: f64 = 36.0;

    let samples = series.samples();
    let mut svg = String::new();
    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = write!(
        svg,
        r##"<rect width="{w}" height="{h}" fill="white"/>"##,
        w = WIDTH,
        h = HEIGHT
    );

    if !samples.is_empty() {
        let (mut w_min, mut w_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut r_min, mut r_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for s in samples {
            w_min = w_min.min(s.weight);
            w_max = w_max.max(s.weight);
            r_min = r_min.min(s.ret);
            r_max = r_max.max(s.ret);
        }
        let w_span = (w_max - w_min).max(f64::MIN_POSITIVE);
        let r_span = (r_max - r_min).max(f64::MIN_POSITIVE);

        let _ = write!(
            svg,
            r##"<line x1="{m}" y1="{b}" x2="{r}" y2="{b}" stroke="#999"/><line x1="{m}" y1="{t}" x2="{m}" y2="{b}" stroke="#999"/>"##,
            m = MARGIN,
            b = HEIGHT - MARGIN,
            r = WIDTH - MARGIN,
            t = MARGIN
        );

        for s in samples {
            let x = MARGIN + (s.weight - w_min) / w_span * (WIDTH - 2.0 * MARGIN);
            let y = HEIGHT - MARGIN - (s.ret - r_min) / r_span * (HEIGHT - 2.0 * MARGIN);
            let _ = write!(
                svg,
                r##"<circle cx="{x:.1}" cy="{y:.1}" r="2.5" fill="#2c7fb8" fill-opacity="0.6"/>"##,
                x = x,
                y = y
            );
        }

        let _ = write!(
            svg,
            r##"<text x="{tx}" y="{ty}" font-family="sans-serif" font-size="12" text-anchor="middle">weight</text>"##,
            tx = WIDTH / 2.0,
            ty = HEIGHT - 8.0
        );
        let _ = write!(
            svg,
            r##"<text x="12" y="{ty}" font-family="sans-serif" font-size="12" text-anchor="middle" transform="rotate(-90 12 {ty})">return</text>"##,
            ty = HEIGHT / 2.0
        );
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NonFinitePolicy;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_sparkline_basic() {
        let spark = sparkline(&[1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(spark.chars().count(), 4);
        assert!(spark.starts_with('▁'));
        assert!(spark.ends_with('█'));
    }

    #[test]
    fn test_sparkline_flat_series() {
        let spark = sparkline(&[5.0; 10], 10);
        assert_eq!(spark.chars().count(), 10);
        // All values equal render at mid-height.
        assert!(spark.chars().all(|c| c == SPARKLINE_CHARS[4]));
    }

    #[test]
    fn test_sparkline_downsamples() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let spark = sparkline(&values, 20);
        assert_eq!(spark.chars().count(), 20);
    }

    #[test]
    fn test_sparkline_empty() {
        assert_eq!(sparkline(&[], 10), "");
        assert_eq!(sparkline(&[1.0], 0), "");
    }

    #[test]
    fn test_decomposition_bar_svg_structure() {
        let result = DecompositionResult {
            active_component: 0.0003,
            passive_component: 0.0009,
            active_ratio: 0.25,
            weight_return_correlation: Some(0.2),
            sample_size: 100,
            weight_mean: 1.0,
            weight_std: 0.2,
            return_mean: 0.001,
            return_std: 0.01,
        };
        let svg = decomposition_bar_svg(&result);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Active"));
        assert!(svg.contains("Passive"));
    }

    #[test]
    fn test_scatter_svg_has_one_circle_per_sample() {
        let periods = (0..5)
            .map(|i| {
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::days(i as i64)
            })
            .collect();
        let series = AlignedSeries::from_parts(
            periods,
            vec![1.0, 1.1, 0.9, 1.3, 0.7],
            vec![0.01, 0.02, -0.01, 0.04, -0.03],
            NonFinitePolicy::Fail,
        )
        .unwrap();

        let svg = weight_return_scatter_svg(&series);
        assert_eq!(svg.matches("<circle").count(), 5);
        assert!(svg.contains("weight"));
        assert!(svg.contains("return"));
    }

    #[test]
    fn test_rolling_ratio_sparkline_skips_undefined() {
        let period = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = vec![
            RollingPoint {
                period,
                active_component: 0.1,
                passive_component: 0.2,
                active_ratio: Some(0.33),
                weight_return_correlation: Some(0.5),
            },
            RollingPoint {
                period,
                active_component: 0.0,
                passive_component: 0.0,
                active_ratio: None,
                weight_return_correlation: None,
            },
            RollingPoint {
                period,
                active_component: 0.2,
                passive_component: 0.2,
                active_ratio: Some(0.5),
                weight_return_correlation: Some(0.6),
            },
        ];
        let spark = rolling_ratio_sparkline(&points, 10);
        assert_eq!(spark.chars().count(), 2);
    }
}
