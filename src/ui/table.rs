use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Table;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Before / after previews (central panel)
// ---------------------------------------------------------------------------

/// Show the head of the raw and the filtered table.
/// Returns `false` when there is nothing loaded yet.
pub fn previews(ui: &mut Ui, state: &AppState) -> bool {
    let Some(raw) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a bank marketing file to start  (File → Open…)");
        });
        return false;
    };
    let n = state.config.preview_rows;

    ui.heading("Before filters");
    ui.label(format!("{} rows", raw.len()));
    preview_table(ui, "raw_preview", &raw.head(n));

    ui.add_space(8.0);
    ui.heading("After filters");
    if let Some(filtered) = &state.filtered {
        ui.label(format!("{} of {} rows", filtered.len(), raw.len()));
        preview_table(ui, "filtered_preview", &filtered.head(n));
    }
    true
}

fn preview_table(ui: &mut Ui, id: &str, table: &Table) {
    if table.is_empty() {
        ui.label(RichText::new("No rows match the current filters.").italics());
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .columns(Column::auto().at_least(48.0), table.columns.len())
                .header(20.0, |mut header| {
                    for name in &table.columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|mut body| {
                    for record in &table.rows {
                        body.row(18.0, |mut row| {
                            for value in &record.values {
                                row.col(|ui: &mut Ui| {
                                    ui.label(value.to_string());
                                });
                            }
                        });
                    }
                });
        });
    });
}
