//! Line-chart description and the renderer seam.
//!
//! The bootstrap engine describes what to draw as a [`LineChart`]; a
//! [`ChartRenderer`] turns it into image bytes. [`SvgRenderer`] is the
//! built-in implementation.

use std::fmt::Write as _;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("chart canvas {width}x{height} leaves no room to plot")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("chart has no data")]
    NoData,
    #[error("series {0} contains a non-finite value")]
    NonFinite(usize),
    #[error("write chart: {0}")]
    Format(#[from] std::fmt::Error),
    #[error("renderer failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

pub const PATH_COLOR: Rgba = Rgba::new(192, 192, 192, 96);
pub const ZERO_COLOR: Rgba = Rgba::new(128, 128, 128, 255);
pub const MEAN_COLOR: Rgba = Rgba::new(16, 16, 16, 255);
pub const BAND_COLOR: Rgba = Rgba::new(80, 80, 80, 255);

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub series: Vec<Vec<f64>>,
    /// One color per series.
    pub colors: Vec<Rgba>,
    pub x_labels: Vec<String>,
    pub x_title: String,
    pub y_title: String,
    pub width: u32,
    pub height: u32,
    pub stroke_width: f64,
    pub label_font_size: u32,
}

impl LineChart {
    /// Chart of resampled equity paths. The last four series are the zero
    /// baseline, the mean and the two one-sigma bands.
    pub fn equity_ensemble(series: Vec<Vec<f64>>, width: u32, height: u32) -> Self {
        let points = series.first().map_or(0, Vec::len);
        let paths = series.len().saturating_sub(4);

        let mut colors = vec![PATH_COLOR; paths];
        colors.extend([ZERO_COLOR, MEAN_COLOR, BAND_COLOR, BAND_COLOR]);
        colors.truncate(series.len());

        Self {
            series,
            colors,
            x_labels: (1..=points).map(|i| i.to_string()).collect(),
            x_title: "Trades".into(),
            y_title: "Cumulative R multiples".into(),
            width,
            height,
            stroke_width: 1.0,
            label_font_size: 8,
        }
    }
}

pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &LineChart) -> Result<Vec<u8>, RenderError>;
}

const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 50.0;
const MAX_X_LABELS: usize = 10;
const Y_TICKS: usize = 5;

/// Renders a [`LineChart`] as a standalone SVG document.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgRenderer;

impl ChartRenderer for SvgRenderer {
    fn render(&self, chart: &LineChart) -> Result<Vec<u8>, RenderError> {
        let width = f64::from(chart.width);
        let height = f64::from(chart.height);
        let plot_w = width - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = height - MARGIN_TOP - MARGIN_BOTTOM;
        if plot_w <= 0.0 || plot_h <= 0.0 {
            return Err(RenderError::EmptyCanvas {
                width: chart.width,
                height: chart.height,
            });
        }

        let points = chart.series.iter().map(Vec::len).max().unwrap_or(0);
        if points == 0 {
            return Err(RenderError::NoData);
        }
        if let Some(i) = chart.series.iter().position(|s| s.iter().any(|v| !v.is_finite())) {
            return Err(RenderError::NonFinite(i));
        }

        let (mut lo, mut hi) = chart
            .series
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if lo == hi {
            lo -= 1.0;
            hi += 1.0;
        }

        let x_at = |i: usize| {
            if points == 1 {
                MARGIN_LEFT + plot_w / 2.0
            } else {
                MARGIN_LEFT + plot_w * i as f64 / (points - 1) as f64
            }
        };
        let y_at = |v: f64| MARGIN_TOP + plot_h * (hi - v) / (hi - lo);

        let mut svg = String::new();
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = chart.width,
            h = chart.height
        )?;
        writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;

        // Axes
        let x0 = MARGIN_LEFT;
        let y0 = MARGIN_TOP + plot_h;
        writeln!(
            svg,
            r#"<path d="M{x0:.1} {top:.1} L{x0:.1} {y0:.1} L{x1:.1} {y0:.1}" stroke="black" fill="none"/>"#,
            top = MARGIN_TOP,
            x1 = MARGIN_LEFT + plot_w
        )?;

        let font = chart.label_font_size;
        let step = points.div_ceil(MAX_X_LABELS).max(1);
        for (i, label) in chart.x_labels.iter().enumerate().step_by(step) {
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="{font}" text-anchor="middle">{}</text>"#,
                x_at(i),
                y0 + f64::from(font) + 4.0,
                escape(label)
            )?;
        }
        for t in 0..=Y_TICKS {
            let v = lo + (hi - lo) * t as f64 / Y_TICKS as f64;
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="{font}" text-anchor="end">{v:.1}</text>"#,
                MARGIN_LEFT - 4.0,
                y_at(v)
            )?;
        }
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="{}" text-anchor="middle">{}</text>"#,
            MARGIN_LEFT + plot_w / 2.0,
            height - 10.0,
            font + 2,
            escape(&chart.x_title)
        )?;
        writeln!(
            svg,
            r#"<text x="14" y="{y:.1}" font-size="{}" text-anchor="middle" transform="rotate(-90 14 {y:.1})">{}</text>"#,
            font + 2,
            escape(&chart.y_title),
            y = MARGIN_TOP + plot_h / 2.0
        )?;

        for (i, series) in chart.series.iter().enumerate() {
            let color = chart.colors.get(i).copied().unwrap_or(MEAN_COLOR);
            write!(
                svg,
                r#"<polyline fill="none" stroke="rgb({},{},{})" stroke-opacity="{:.3}" stroke-width="{}" points=""#,
                color.r,
                color.g,
                color.b,
                f64::from(color.a) / 255.0,
                chart.stroke_width
            )?;
            for (j, &v) in series.iter().enumerate() {
                if j > 0 {
                    svg.push(' ');
                }
                write!(svg, "{:.1},{:.1}", x_at(j), y_at(v))?;
            }
            writeln!(svg, r#""/>"#)?;
        }
        writeln!(svg, "</svg>")?;

        Ok(svg.into_bytes())
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
