use std::f64::consts::TAU;

use eframe::egui::Color32;

use crate::color::ColorMap;
use crate::config::ChartTheme;
use crate::data::model::{CellValue, Table};
use crate::data::summary::{proportions, Summary};
use crate::error::DashboardError;

pub const RAW_TITLE: &str = "Raw data";
pub const FILTERED_TITLE: &str = "Filtered data";

/// Vertices used to approximate a full circle.
const CIRCLE_SEGMENTS: usize = 96;

const QUARTER_TURN: f64 = TAU / 4.0;

// ---------------------------------------------------------------------------
// Chart style
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChartStyle {
    #[default]
    Bars,
    Pie,
}

impl ChartStyle {
    pub const ALL: [ChartStyle; 2] = [ChartStyle::Bars, ChartStyle::Pie];

    pub fn label(&self) -> &'static str {
        match self {
            ChartStyle::Bars => "bar",
            ChartStyle::Pie => "pie",
        }
    }
}

// ---------------------------------------------------------------------------
// Chart data
// ---------------------------------------------------------------------------

/// One bar per outcome label, annotated with its percentage.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSpec {
    pub label: String,
    pub x: f64,
    pub percent: f64,
    pub annotation: String,
    pub color: Color32,
}

/// One pie slice per outcome label. Angles are in radians, counter-clockwise
/// from the positive x axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceSpec {
    pub label: String,
    pub percent: f64,
    pub start: f64,
    pub end: f64,
    pub annotation: String,
    pub color: Color32,
}

impl SliceSpec {
    /// Outlines of the slice on a circle of `radius` centred at the origin,
    /// split into wedges of at most a quarter turn so each one is convex.
    pub fn wedges(&self, radius: f64) -> Vec<Vec<[f64; 2]>> {
        let sweep = self.end - self.start;
        let pieces = (sweep / QUARTER_TURN).ceil().max(1.0) as usize;
        (0..pieces)
            .map(|k| {
                let from = self.start + sweep * k as f64 / pieces as f64;
                let to = self.start + sweep * (k + 1) as f64 / pieces as f64;
                wedge(from, to, radius)
            })
            .collect()
    }

    /// Point on the bisector of the slice at distance `radius` from the centre.
    pub fn anchor(&self, radius: f64) -> [f64; 2] {
        let mid = (self.start + self.end) / 2.0;
        [radius * mid.cos(), radius * mid.sin()]
    }
}

/// Closed outline from the centre along the arc `[from, to]`.
fn wedge(from: f64, to: f64, radius: f64) -> Vec<[f64; 2]> {
    let sweep = to - from;
    let steps = ((sweep / TAU) * CIRCLE_SEGMENTS as f64).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push([0.0, 0.0]);
    for i in 0..=steps {
        let angle = from + sweep * i as f64 / steps as f64;
        points.push([radius * angle.cos(), radius * angle.sin()]);
    }
    points
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartBody {
    Bars(Vec<BarSpec>),
    Pie(Vec<SliceSpec>),
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub body: ChartBody,
    pub show_grid: bool,
    pub bar_width: f64,
}

/// Raw-data chart on the left, filtered-data chart on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPair {
    pub left: Chart,
    pub right: Chart,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Lay out one summary as a chart of the given style.
pub fn render_chart(
    summary: &Summary,
    title: &str,
    style: ChartStyle,
    colors: &ColorMap,
    theme: &ChartTheme,
) -> Chart {
    let decimals = theme.label_decimals;
    let body = match style {
        ChartStyle::Bars => ChartBody::Bars(
            summary
                .entries
                .iter()
                .enumerate()
                .map(|(i, (label, pct))| BarSpec {
                    label: label.to_string(),
                    x: i as f64,
                    percent: *pct,
                    annotation: format!("{pct:.decimals$}"),
                    color: colors.color_for(label),
                })
                .collect(),
        ),
        ChartStyle::Pie => {
            let mut start = 0.0;
            ChartBody::Pie(
                summary
                    .entries
                    .iter()
                    .map(|(label, pct)| {
                        let end = start + TAU * pct / 100.0;
                        let slice = SliceSpec {
                            label: label.to_string(),
                            percent: *pct,
                            start,
                            end,
                            annotation: format!("{pct:.decimals$}%"),
                            color: colors.color_for(label),
                        };
                        start = end;
                        slice
                    })
                    .collect(),
            )
        }
    };

    Chart {
        title: title.to_string(),
        body,
        show_grid: theme.show_grid,
        bar_width: theme.bar_width,
    }
}

/// Colour map shared by both sides of a comparison.
fn shared_colors<'a, I>(summaries: I, theme: &ChartTheme) -> ColorMap
where
    I: IntoIterator<Item = &'a Summary>,
{
    let mut labels: Vec<&CellValue> = summaries
        .into_iter()
        .flat_map(|s| s.entries.iter().map(|(label, _)| label))
        .collect();
    labels.sort();
    labels.dedup();
    ColorMap::new(labels, theme)
}

/// Side-by-side charts of the raw and the filtered distribution.
pub fn render_comparison(
    raw: &Summary,
    filtered: &Summary,
    style: ChartStyle,
    theme: &ChartTheme,
) -> ChartPair {
    let colors = shared_colors([raw, filtered], theme);
    ChartPair {
        left: render_chart(raw, RAW_TITLE, style, &colors, theme),
        right: render_chart(filtered, FILTERED_TITLE, style, &colors, theme),
    }
}

/// A chart pair where each side fails on its own.
#[derive(Debug)]
pub struct Comparison {
    pub raw: Result<Chart, DashboardError>,
    pub filtered: Result<Chart, DashboardError>,
}

/// Summarise `outcome_column` of both tables and lay out the charts.
///
/// An empty population only blanks its own side; the other side is still
/// rendered.
pub fn compare(
    raw: &Table,
    filtered: &Table,
    outcome_column: &str,
    style: ChartStyle,
    theme: &ChartTheme,
) -> Comparison {
    let raw_summary = proportions(raw, outcome_column);
    let filtered_summary = proportions(filtered, outcome_column);

    if let (Ok(r), Ok(f)) = (&raw_summary, &filtered_summary) {
        let pair = render_comparison(r, f, style, theme);
        return Comparison {
            raw: Ok(pair.left),
            filtered: Ok(pair.right),
        };
    }

    let colors = shared_colors(
        [&raw_summary, &filtered_summary]
            .into_iter()
            .filter_map(|s| s.as_ref().ok()),
        theme,
    );
    Comparison {
        raw: raw_summary.map(|s| render_chart(&s, RAW_TITLE, style, &colors, theme)),
        filtered: filtered_summary
            .map(|s| render_chart(&s, FILTERED_TITLE, style, &colors, theme)),
    }
}
