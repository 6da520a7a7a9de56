use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::chart::ChartStyle;
use crate::data::filter::{ALL_LABEL, CATEGORICAL_COLUMNS};
use crate::state::{AppState, ExportFormat, ExportTarget};

/// Multiselect captions, in [`CATEGORICAL_COLUMNS`] order.
const COLUMN_CAPTIONS: [&str; 8] = [
    "Job",
    "Marital status",
    "Default",
    "Has housing loan?",
    "Has personal loan?",
    "Contact channel",
    "Contact month",
    "Day of week",
];

// ---------------------------------------------------------------------------
// Left side panel – filter form
// ---------------------------------------------------------------------------

/// Render the left filter form. Edits go to the draft until "Apply".
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        if ui.button("Open…").clicked() {
            open_file_dialog(state);
        }
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Chart style ----
            ui.strong("Chart type");
            ui.horizontal(|ui: &mut Ui| {
                for style in ChartStyle::ALL {
                    ui.radio_value(&mut state.draft.style, style, style.label());
                }
            });
            ui.separator();

            // ---- Age range ----
            ui.strong("Age");
            let (lo, hi) = state.age_bounds;
            let mut min = state.draft.spec.age.min;
            let mut max = state.draft.spec.age.max;
            ui.add(egui::Slider::new(&mut min, lo..=hi).text("from"));
            ui.add(egui::Slider::new(&mut max, lo..=hi).text("to"));
            if min > max {
                max = min;
            }
            state.set_age_range(min, max);
            ui.separator();

            // ---- Per-column multiselects (collapsible) ----
            for (col, caption) in CATEGORICAL_COLUMNS.iter().zip(COLUMN_CAPTIONS) {
                multiselect(ui, state, col, caption);
            }
            ui.separator();

            if ui.button(RichText::new("Apply").strong()).clicked() {
                state.submit();
            }
            if state.draft != state.applied {
                ui.label(RichText::new("Unapplied changes").italics());
            }
        });
}

fn multiselect(ui: &mut Ui, state: &mut AppState, column: &str, caption: &str) {
    let Some(options) = state.choices.get(column).cloned() else {
        return;
    };
    let selection = state.draft.spec.selection(column);

    let summary = if selection.includes_all() {
        ALL_LABEL.to_string()
    } else {
        format!("{}/{}", selection.values().len(), options.len())
    };

    egui::CollapsingHeader::new(RichText::new(format!("{caption}  ({summary})")).strong())
        .id_salt(column)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let mut all = selection.includes_all();
            if ui.checkbox(&mut all, ALL_LABEL).changed() {
                state.set_select_all(column, all);
            }

            for value in &options {
                let mut checked = selection.values().contains(value);
                if ui.checkbox(&mut checked, value.to_string()).changed() {
                    state.toggle_filter_value(column, value);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.add_enabled_ui(state.filtered.is_some(), |ui: &mut Ui| {
            ui.menu_button("Download", |ui: &mut Ui| {
                for (label, target, format) in [
                    ("Filtered table (CSV)", ExportTarget::FilteredTable, ExportFormat::Csv),
                    ("Filtered table (Excel)", ExportTarget::FilteredTable, ExportFormat::Xlsx),
                    ("Proportions (CSV)", ExportTarget::FilteredSummary, ExportFormat::Csv),
                    ("Proportions (Excel)", ExportTarget::FilteredSummary, ExportFormat::Xlsx),
                ] {
                    if ui.button(label).clicked() {
                        save_file_dialog(state, target, format);
                        ui.close_menu();
                    }
                }
            });
        });

        ui.separator();

        if let (Some(name), Some(ds)) = (&state.source_name, &state.dataset) {
            let visible = state.filtered.as_ref().map_or(0, |t| t.len());
            ui.label(format!("{name}: {} rows loaded, {visible} after filters", ds.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open bank marketing data")
        .add_filter("Supported files", &["csv", "xlsx", "xls"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx", "xls"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.open_path(&path) {
            log::error!("Failed to open file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn save_file_dialog(state: &mut AppState, target: ExportTarget, format: ExportFormat) {
    let ext = format.extension();
    let file = rfd::FileDialog::new()
        .set_title("Save download")
        .set_file_name(format!("{}.{ext}", target.file_stem()))
        .add_filter(ext, &[ext])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.save_export(&path, target, format) {
            log::error!("Failed to save download: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
