use eframe::egui::{Align2, Color32, RichText, Stroke, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoint, PlotPoints, Polygon, Text};

use crate::chart::{BarSpec, Chart, ChartBody, SliceSpec};
use crate::error::DashboardError;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 340.0;
const PIE_RADIUS: f64 = 1.0;

// ---------------------------------------------------------------------------
// Acceptance proportion charts (central panel)
// ---------------------------------------------------------------------------

/// Render the raw / filtered chart pair side by side.
pub fn comparison(ui: &mut Ui, state: &AppState) {
    ui.heading("Acceptance proportion");

    let Some(comparison) = &state.comparison else {
        return;
    };

    ui.columns(2, |columns: &mut [Ui]| {
        chart_side(&mut columns[0], &comparison.raw);
        chart_side(&mut columns[1], &comparison.filtered);
    });
}

fn chart_side(ui: &mut Ui, chart: &Result<Chart, DashboardError>) {
    match chart {
        Ok(chart) => {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.label(RichText::new(&chart.title).strong());
            });
            match &chart.body {
                ChartBody::Bars(bars) => bar_plot(ui, chart, bars),
                ChartBody::Pie(slices) => pie_plot(ui, chart, slices),
            }
        }
        Err(e) => {
            ui.colored_label(Color32::RED, format!("Error: no data available for the chart ({e})"));
        }
    }
}

fn bar_plot(ui: &mut Ui, chart: &Chart, bars: &[BarSpec]) {
    let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();

    Plot::new(format!("{}_bars", chart.title))
        .height(CHART_HEIGHT)
        .show_grid(chart.show_grid)
        .include_y(0.0)
        .include_y(100.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .y_axis_label("%")
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            for bar in bars {
                plot_ui.bar_chart(
                    BarChart::new(vec![Bar::new(bar.x, bar.percent)
                        .name(&bar.label)
                        .fill(bar.color)
                        .width(chart.bar_width)])
                    .color(bar.color)
                    .name(&bar.label),
                );
                plot_ui.text(
                    Text::new(PlotPoint::new(bar.x, bar.percent), bar.annotation.as_str())
                        .anchor(Align2::CENTER_BOTTOM),
                );
            }
        });
}

fn pie_plot(ui: &mut Ui, chart: &Chart, slices: &[SliceSpec]) {
    Plot::new(format!("{}_pie", chart.title))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .include_x(-1.5 * PIE_RADIUS)
        .include_x(1.5 * PIE_RADIUS)
        .include_y(-1.3 * PIE_RADIUS)
        .include_y(1.3 * PIE_RADIUS)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for slice in slices {
                for wedge in slice.wedges(PIE_RADIUS) {
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(wedge))
                            .name(&slice.label)
                            .fill_color(slice.color)
                            .stroke(Stroke::new(1.0, Color32::WHITE)),
                    );
                }
                let [px, py] = slice.anchor(0.6 * PIE_RADIUS);
                plot_ui.text(Text::new(PlotPoint::new(px, py), slice.annotation.as_str()));
                let [lx, ly] = slice.anchor(1.15 * PIE_RADIUS);
                plot_ui.text(Text::new(PlotPoint::new(lx, ly), slice.label.as_str()));
            }
        });
}
