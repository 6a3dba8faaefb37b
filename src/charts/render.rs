//! PNG and SVG rendering of chart specs with plotters.
//!
//! Raster text needs a TrueType font. One is looked up once per process
//! (`AIRSIGHT_CHART_FONT` first, then common system locations); without it
//! PNG charts are drawn without labels while SVG output keeps its text.

use super::{CategoricalPoint, ChartData, ChartKind, ChartSpec, TrendPoint, TREND_Y_MAX};
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontFamily, FontStyle};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::panic;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 420;

const BACKGROUND: RGBColor = RGBColor(15, 23, 42);
const TEXT: RGBAColor = RGBAColor(255, 255, 255, 0.9);
const MUTED: RGBAColor = RGBAColor(255, 255, 255, 0.7);
const GRID: RGBAColor = RGBAColor(255, 255, 255, 0.1);
const LINE: RGBColor = RGBColor(84, 160, 255);
const FALLBACK_COLOR: RGBAColor = RGBAColor(128, 128, 128, 1.0);

/// Environment variable naming a TrueType font for raster charts.
pub const FONT_ENV: &str = "AIRSIGHT_CHART_FONT";

const FONT_CANDIDATES: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Image file format for chart output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

/// Render a chart into `path` in the given format.
pub fn render_to_file(chart: &ChartSpec, path: &Path, format: ImageFormat) -> Result<()> {
    match format {
        ImageFormat::Png => render_png(chart, path),
        ImageFormat::Svg => {
            let svg = render_svg(chart)?;
            std::fs::write(path, svg)
                .with_context(|| format!("Failed to write {}", path.display()))
        }
    }
}

/// Render a chart to a PNG file.
pub fn render_png(chart: &ChartSpec, path: &Path) -> Result<()> {
    let backend = BitMapBackend::new(path, (WIDTH, HEIGHT));
    let root = FontSafeBackend::new(backend, false).into_drawing_area();
    draw_chart(root, chart)
        .with_context(|| format!("Failed to render chart {}", chart.id.artifact()))
}

/// Render a chart to an SVG document.
pub fn render_svg(chart: &ChartSpec) -> Result<String> {
    let mut svg = String::new();
    {
        let backend = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT));
        let root = FontSafeBackend::new(backend, true).into_drawing_area();
        draw_chart(root, chart)
            .with_context(|| format!("Failed to render chart {}", chart.id.artifact()))?;
    }
    Ok(svg)
}

fn draw_chart<DB>(root: DrawingArea<DB, Shift>, chart: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&BACKGROUND)?;

    match (&chart.kind, &chart.data) {
        (ChartKind::Doughnut, ChartData::Categorical(points)) => {
            draw_doughnut(&root, chart, points)?
        }
        (_, ChartData::Categorical(points)) => draw_bars(&root, chart, points)?,
        (_, ChartData::TimeSeries(points)) => draw_trend(&root, chart, points)?,
    }

    root.present()?;
    Ok(())
}

fn title_style() -> TextStyle<'static> {
    (FontFamily::SansSerif, 20).into_font().color(&TEXT)
}

fn label_style() -> TextStyle<'static> {
    (FontFamily::SansSerif, 13).into_font().color(&MUTED)
}

fn draw_no_data<DB>(root: &DrawingArea<DB, Shift>, chart: &ChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let area = root.titled(&chart.title, title_style())?;
    let (width, height) = area.dim_in_pixel();
    let centered = label_style().pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(
        "No data",
        (width as i32 / 2, height as i32 / 2),
        centered,
    ))?;
    Ok(())
}

fn draw_trend<DB>(root: &DrawingArea<DB, Shift>, chart: &ChartSpec, points: &[TrendPoint]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return draw_no_data(root, chart);
    };

    // x is hours since the first reading.
    let hours = |p: &TrendPoint| (p.timestamp - first.timestamp).num_seconds() as f64 / 3600.0;
    let span = hours(last).max(1.0);
    let origin = first.timestamp;

    let mut plot = ChartBuilder::on(root)
        .caption(&chart.title, title_style())
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0.0..span, 0.0..TREND_Y_MAX)?;

    plot.configure_mesh()
        .x_labels(6)
        .y_labels(6)
        .x_label_formatter(&|v| {
            (origin + chrono::Duration::seconds((v * 3600.0) as i64))
                .format("%b %d %H:%M")
                .to_string()
        })
        .y_label_formatter(&|v| format!("{:.0} AQI", v))
        .label_style(label_style())
        .axis_style(Color::stroke_width(&MUTED, 1))
        .bold_line_style(Color::stroke_width(&GRID, 1))
        .light_line_style(Color::stroke_width(&TRANSPARENT, 0))
        .draw()?;

    let coords: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (hours(p), f64::from(p.value).clamp(0.0, TREND_Y_MAX)))
        .collect();

    plot.draw_series(LineSeries::new(coords.iter().copied(), Color::stroke_width(&LINE, 3)))?;
    plot.draw_series(
        points
            .iter()
            .zip(&coords)
            .map(|(p, &coord)| Circle::new(coord, 4, parse_color(&p.color).filled())),
    )?;

    Ok(())
}

fn draw_bars<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartSpec,
    points: &[CategoricalPoint],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if points.is_empty() {
        return draw_no_data(root, chart);
    }

    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    let scale_max = if max > 0.0 { max * 1.1 } else { 1.0 };

    let mut plot = ChartBuilder::on(root)
        .caption(&chart.title, title_style())
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d((0..points.len()).into_segmented(), 0.0..scale_max)?;

    plot.configure_mesh()
        .disable_x_mesh()
        .x_labels(points.len() + 1)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => points
                .get(*i)
                .map(|p| p.label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .y_label_formatter(&|v| format!("{:.1}", v))
        .y_desc(chart.dataset_label.as_str())
        .label_style(label_style())
        .axis_style(Color::stroke_width(&MUTED, 1))
        .bold_line_style(Color::stroke_width(&GRID, 1))
        .light_line_style(Color::stroke_width(&TRANSPARENT, 0))
        .draw()?;

    plot.draw_series(points.iter().enumerate().map(|(i, p)| {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i), 0.0),
                (SegmentValue::Exact(i + 1), p.value.max(0.0)),
            ],
            parse_color(&p.color).filled(),
        );
        bar.set_margin(0, 0, 12, 12);
        bar
    }))?;

    let above = label_style().pos(Pos::new(HPos::Center, VPos::Bottom));
    plot.draw_series(points.iter().enumerate().map(|(i, p)| {
        Text::new(
            format_value(p.value),
            (SegmentValue::CenterOf(i), p.value.max(0.0)),
            above.clone(),
        )
    }))?;

    Ok(())
}

fn draw_doughnut<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartSpec,
    points: &[CategoricalPoint],
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let total: f64 = points.iter().map(|p| p.value.max(0.0)).sum();
    if total <= 0.0 {
        return draw_no_data(root, chart);
    }

    let area = root.titled(&chart.title, title_style())?;
    let (width, height) = area.dim_in_pixel();
    let center = (f64::from(width) * 0.3, f64::from(height) / 2.0);
    let outer = (f64::from(height) * 0.42).min(f64::from(width) * 0.25);
    let inner = outer * 0.55;

    let mut angle = -PI / 2.0;
    for point in points.iter().filter(|p| p.value > 0.0) {
        let sweep = point.value / total * 2.0 * PI;
        area.draw(&Polygon::new(
            ring_segment(center, outer, inner, angle, angle + sweep),
            parse_color(&point.color).filled(),
        ))?;
        angle += sweep;
    }

    let legend_x = (f64::from(width) * 0.6) as i32;
    let text_style = (FontFamily::SansSerif, 14).into_font().color(&TEXT);
    for (i, (point, text)) in points.iter().zip(chart.share_labels()).enumerate() {
        let y = 40 + i as i32 * 30;
        area.draw(&Rectangle::new(
            [(legend_x, y), (legend_x + 14, y + 14)],
            parse_color(&point.color).filled(),
        ))?;
        area.draw(&Text::new(text, (legend_x + 24, y), text_style.clone()))?;
    }

    Ok(())
}

/// Outline of an annular sector from `from` to `to` radians, as pixels.
fn ring_segment(center: (f64, f64), outer: f64, inner: f64, from: f64, to: f64) -> Vec<(i32, i32)> {
    let steps = ((to - from) / (PI / 90.0)).ceil().max(1.0) as usize;
    let at = |radius: f64, step: usize| {
        let a = from + (to - from) * step as f64 / steps as f64;
        (
            (center.0 + radius * a.cos()).round() as i32,
            (center.1 + radius * a.sin()).round() as i32,
        )
    };

    let mut outline: Vec<(i32, i32)> = (0..=steps).map(|s| at(outer, s)).collect();
    outline.extend((0..=steps).rev().map(|s| at(inner, s)));
    outline
}

/// Parse `#rrggbb` or `rgba(r, g, b, a)`; anything else renders grey.
fn parse_color(value: &str) -> RGBAColor {
    let value = value.trim();

    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 6 {
            if let Ok(rgb) = u32::from_str_radix(hex, 16) {
                return RGBAColor((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 1.0);
            }
        }
    } else if let Some(body) = value
        .strip_prefix("rgba(")
        .and_then(|v| v.strip_suffix(')'))
    {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if let [r, g, b, a] = parts.as_slice() {
            if let (Ok(r), Ok(g), Ok(b), Ok(a)) =
                (r.parse::<u8>(), g.parse::<u8>(), b.parse::<u8>(), a.parse::<f64>())
            {
                return RGBAColor(r, g, b, a);
            }
        }
    }

    FALLBACK_COLOR
}

/// Whole numbers without decimals, everything else with two.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Registers a TrueType font for raster text. Returns whether one is available.
fn font_available() -> bool {
    *FONT_READY.get_or_init(|| {
        let from_env = std::env::var(FONT_ENV).ok();
        let candidates = from_env
            .iter()
            .map(String::as_str)
            .chain(FONT_CANDIDATES.iter().copied());

        for path in candidates {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            // plotters keeps registered fonts for the life of the process.
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            match register_font(FontFamily::SansSerif.as_str(), FontStyle::Normal, bytes) {
                Ok(()) => {
                    debug!("Chart font: {}", path);
                    return true;
                }
                Err(_) => debug!("Not a usable font: {}", path),
            }
        }

        warn!(
            "No TrueType font found; PNG charts are drawn without labels (set {} to a .ttf file)",
            FONT_ENV
        );
        false
    })
}

/// Backend wrapper that keeps text problems from aborting a chart.
///
/// Text is skipped on raster backends when no font is registered, and text
/// measurement falls back to an estimate from the font size.
struct FontSafeBackend<DB> {
    inner: DB,
    fonts: bool,
    native_text: bool,
}

impl<DB> FontSafeBackend<DB> {
    fn new(inner: DB, native_text: bool) -> Self {
        Self {
            inner,
            fonts: font_available(),
            native_text,
        }
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if !self.fonts && !self.native_text {
            return Ok(());
        }

        match panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.inner.draw_text(text, style, pos)
        })) {
            Ok(result) => result,
            Err(_) => {
                debug!("Skipped chart text {:?}", text);
                Ok(())
            }
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        if self.fonts {
            if let Ok(size) = self.inner.estimate_text_size(text, style) {
                return Ok(size);
            }
        }

        let size = style.size().max(1.0);
        let width = size * 0.6 * text.chars().count() as f64;
        Ok((width.ceil() as u32, size.ceil() as u32))
    }
}
