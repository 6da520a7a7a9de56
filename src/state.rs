use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::chart::{compare, ChartStyle, Comparison};
use crate::config::DashboardConfig;
use crate::data::cache::PipelineCache;
use crate::data::export::{to_delimited_text, to_spreadsheet};
use crate::data::filter::{
    AgeRange, FilterPipeline, FilterSpec, StageTrace, AGE_COLUMN, CATEGORICAL_COLUMNS,
};
use crate::data::loader::load;
use crate::data::model::{CellValue, Table};
use crate::data::summary::proportions;
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Filter form
// ---------------------------------------------------------------------------

/// What the sidebar form submits.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterForm {
    pub style: ChartStyle,
    pub spec: FilterSpec,
}

impl FilterForm {
    fn unrestricted(age_bounds: (i64, i64)) -> Self {
        FilterForm {
            style: ChartStyle::default(),
            spec: FilterSpec::new(AgeRange::new(age_bounds.0, age_bounds.1)),
        }
    }
}

// ---------------------------------------------------------------------------
// Downloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// The live filtered table.
    FilteredTable,
    /// Outcome proportions of the filtered table.
    FilteredSummary,
}

impl ExportTarget {
    pub fn file_stem(&self) -> &'static str {
        match self {
            ExportTarget::FilteredTable => "bank_filtered",
            ExportTarget::FilteredSummary => "acceptance_proportion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Memoised loads and filter results for the current upload.
    cache: PipelineCache,

    /// File name of the current upload.
    pub source_name: Option<String>,

    /// Raw table (None until a file was loaded successfully).
    pub dataset: Option<Arc<Table>>,

    /// Values offered in each categorical multiselect.
    pub choices: BTreeMap<String, BTreeSet<CellValue>>,

    /// Observed integer bounds of the age column.
    pub age_bounds: (i64, i64),

    /// Form being edited in the sidebar.
    pub draft: FilterForm,

    /// Form last submitted with "Apply".
    pub applied: FilterForm,

    /// Result of applying `applied` to the raw table.
    pub filtered: Option<Arc<Table>>,

    /// Row counts of the last computed filter run.
    pub stage_traces: Vec<StageTrace>,

    /// Charts for the applied form.
    pub comparison: Option<Comparison>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            cache: PipelineCache::default(),
            source_name: None,
            dataset: None,
            choices: BTreeMap::new(),
            age_bounds: (0, 0),
            draft: FilterForm::unrestricted((0, 0)),
            applied: FilterForm::unrestricted((0, 0)),
            filtered: None,
            stage_traces: Vec::new(),
            comparison: None,
            status_message: None,
        }
    }

    /// Columns an upload must provide.
    pub fn required_columns(&self) -> Vec<&str> {
        std::iter::once(AGE_COLUMN)
            .chain(CATEGORICAL_COLUMNS)
            .chain(std::iter::once(self.config.outcome_column.as_str()))
            .collect()
    }

    /// Read a file from disk and ingest it.
    pub fn open_path(&mut self, path: &Path) -> anyhow::Result<()> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.ingest(&name, &bytes)?;
        Ok(())
    }

    /// Parse an upload, validate its columns and show it unfiltered.
    ///
    /// On failure nothing of the upload is kept and the previous dataset is
    /// dropped as well.
    pub fn ingest(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let delimiter = self.config.input_delimiter;
        let required: Vec<String> = self
            .required_columns()
            .into_iter()
            .map(String::from)
            .collect();

        let loaded = self.cache.dataset_or_load(bytes, |b| {
            let table = load(b, delimiter)?;
            table.require_columns(&required)?;
            Ok(table)
        });

        match loaded {
            Ok(table) => {
                log::info!(
                    "Loaded {} with {} rows and columns {:?}",
                    name,
                    table.len(),
                    table.columns
                );
                self.set_dataset(name, table)
            }
            Err(e) => {
                log::error!("Failed to load {name}: {e}");
                self.clear();
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    fn set_dataset(&mut self, name: &str, table: Arc<Table>) -> Result<()> {
        let mut choices = BTreeMap::new();
        for col in CATEGORICAL_COLUMNS {
            choices.insert(col.to_string(), table.unique_values(col)?);
        }
        self.age_bounds = table
            .numeric_bounds(AGE_COLUMN)?
            .map(|(lo, hi)| (lo.floor() as i64, hi.ceil() as i64))
            .unwrap_or((0, 0));

        self.choices = choices;
        self.draft = FilterForm::unrestricted(self.age_bounds);
        self.applied = self.draft.clone();
        self.source_name = Some(name.to_string());
        self.dataset = Some(table);
        self.status_message = None;
        self.recompute()
    }

    /// Forget the dataset and everything derived from it.
    pub fn clear(&mut self) {
        self.cache.invalidate();
        self.source_name = None;
        self.dataset = None;
        self.choices.clear();
        self.age_bounds = (0, 0);
        self.draft = FilterForm::unrestricted((0, 0));
        self.applied = self.draft.clone();
        self.filtered = None;
        self.stage_traces.clear();
        self.comparison = None;
    }

    /// Make the draft form the applied one and recompute.
    /// A new submission replaces the previous filtered table.
    pub fn submit(&mut self) {
        self.applied = self.draft.clone();
        if let Err(e) = self.recompute() {
            log::error!("Failed to apply filters: {e}");
            self.status_message = Some(format!("Error: {e}"));
        } else {
            self.status_message = None;
        }
    }

    /// Filter the raw table with the applied form and rebuild the charts.
    fn recompute(&mut self) -> Result<()> {
        let Some(dataset) = self.dataset.clone() else {
            return Ok(());
        };
        let spec = self.applied.spec.clone();
        let pipeline = FilterPipeline::from_spec(&spec);

        let run = self
            .cache
            .filtered_or_compute(&spec, || pipeline.run_traced(&dataset))?;
        for t in &run.traces {
            log::debug!("filter on {}: {} -> {} rows", t.column, t.rows_in, t.rows_out);
        }
        self.stage_traces = run.traces;
        let filtered = run.table;
        log::debug!(
            "pipeline cache: {} hits, {} misses",
            self.cache.hits(),
            self.cache.misses()
        );
        log::info!(
            "Filters applied: {} of {} rows kept",
            filtered.len(),
            dataset.len()
        );

        let comparison = compare(
            &dataset,
            &filtered,
            &self.config.outcome_column,
            self.applied.style,
            &self.config.theme,
        );
        for side in [&comparison.raw, &comparison.filtered] {
            if let Err(e) = side {
                log::warn!("Chart skipped: {e}");
            }
        }

        self.filtered = Some(filtered);
        self.comparison = Some(comparison);
        Ok(())
    }

    // -- Draft form editing --

    /// Toggle a single value in a column's draft selection.
    pub fn toggle_filter_value(&mut self, column: &str, value: &CellValue) {
        self.draft.spec.selection_mut(column).toggle(value);
    }

    /// Switch the `all` sentinel of a column's draft selection.
    pub fn set_select_all(&mut self, column: &str, all: bool) {
        self.draft.spec.selection_mut(column).set_all(all);
    }

    /// Set the draft age range, keeping it ordered and within the data bounds.
    pub fn set_age_range(&mut self, min: i64, max: i64) {
        let (lo, hi) = self.age_bounds;
        let min = min.clamp(lo, hi);
        let max = max.clamp(min, hi);
        self.draft.spec.age = AgeRange::new(min, max);
    }

    // -- Downloads --

    /// Serialise the current filtered table or its summary.
    pub fn export(&self, target: ExportTarget, format: ExportFormat) -> Result<Vec<u8>> {
        let filtered = self
            .filtered
            .as_ref()
            .ok_or_else(|| DashboardError::Export("no dataset loaded".into()))?;
        let table = match target {
            ExportTarget::FilteredTable => Table::clone(filtered),
            ExportTarget::FilteredSummary => {
                proportions(filtered, &self.config.outcome_column)?.to_table()
            }
        };
        match format {
            ExportFormat::Csv => to_delimited_text(&table),
            ExportFormat::Xlsx => to_spreadsheet(&table),
        }
    }

    /// Export and write to `path`.
    pub fn save_export(
        &self,
        path: &Path,
        target: ExportTarget,
        format: ExportFormat,
    ) -> anyhow::Result<()> {
        let bytes = self.export(target, format)?;
        std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_delimited;
    use crate::data::filter::Selection;

    const HEADER: &str = "age;job;marital;default;housing;loan;contact;month;day_of_week;y";

    fn bank_csv(rows: &[(i64, &str, &str)]) -> Vec<u8> {
        let mut text = String::from(HEADER);
        for (age, job, y) in rows {
            text.push_str(&format!(
                "\n{age};{job};married;no;yes;no;cellular;may;mon;{y}"
            ));
        }
        text.into_bytes()
    }

    fn scenario_state() -> AppState {
        let mut state = AppState::default();
        state
            .ingest(
                "bank.csv",
                &bank_csv(&[(30, "services", "yes"), (45, "services", "no"), (60, "retired", "yes")]),
            )
            .unwrap();
        state
    }

    #[test]
    fn upload_shows_everything_unfiltered() {
        let state = scenario_state();
        assert_eq!(state.age_bounds, (30, 60));
        assert_eq!(state.filtered.as_ref().unwrap().len(), 3);
        assert_eq!(state.choices["job"].len(), 2);
        let comparison = state.comparison.as_ref().unwrap();
        assert!(comparison.raw.is_ok() && comparison.filtered.is_ok());
    }

    #[test]
    fn age_filter_keeps_rows_two_and_three() {
        let mut state = scenario_state();
        state.set_age_range(40, 70);
        assert_eq!(state.draft.spec.age, AgeRange::new(40, 60));
        // nothing changes before submit
        assert_eq!(state.filtered.as_ref().unwrap().len(), 3);

        state.submit();
        let filtered = state.filtered.clone().unwrap();
        assert_eq!(filtered.len(), 2);
        let summary = proportions(&filtered, "y").unwrap();
        assert_eq!(summary.percent_of(&"no".into()), Some(50.0));
        assert_eq!(summary.percent_of(&"yes".into()), Some(50.0));
        assert_eq!(state.stage_traces[0].rows_out, 2);
    }

    #[test]
    fn unmatched_job_blanks_only_the_filtered_chart() {
        let mut state = scenario_state();
        state.set_select_all("job", false);
        state.toggle_filter_value("job", &CellValue::from("admin."));
        state.submit();

        assert!(state.filtered.as_ref().unwrap().is_empty());
        let comparison = state.comparison.as_ref().unwrap();
        assert!(comparison.raw.is_ok());
        assert!(matches!(comparison.filtered, Err(DashboardError::EmptyResult(_))));
        assert!(state.status_message.is_none());
    }

    #[test]
    fn resubmitting_the_same_form_reuses_the_cached_table() {
        let mut state = scenario_state();
        state.draft.spec = state
            .draft
            .spec
            .clone()
            .with_selection("job", Selection::only([CellValue::from("services")]));
        state.submit();
        let first = state.filtered.clone().unwrap();
        state.submit();
        assert!(Arc::ptr_eq(&first, state.filtered.as_ref().unwrap()));
    }

    #[test]
    fn returning_to_an_earlier_form_restores_its_traces() {
        let mut state = scenario_state();
        let unrestricted = state.draft.clone();

        state.set_select_all("job", false);
        state.toggle_filter_value("job", &CellValue::from("services"));
        state.submit();
        let job_trace = |s: &AppState| s.stage_traces.iter().find(|t| t.column == "job").cloned();
        assert_eq!(job_trace(&state).map(|t| t.rows_out), Some(2));

        state.draft = unrestricted;
        state.submit();
        assert_eq!(state.filtered.as_ref().unwrap().len(), 3);
        assert_eq!(job_trace(&state).map(|t| (t.rows_in, t.rows_out)), Some((3, 3)));
    }

    #[test]
    fn missing_column_halts_the_upload() {
        let mut state = scenario_state();
        let err = state
            .ingest("partial.csv", b"age;job;y\n30;admin.;no\n")
            .unwrap_err();
        assert!(matches!(err, DashboardError::MissingColumn(c) if c == "marital"));
        assert!(state.dataset.is_none());
        assert!(state.filtered.is_none());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn unreadable_upload_is_a_format_error() {
        let mut state = AppState::default();
        let err = state.ingest("photo.png", &[0x89, 0x50, 0x4e, 0x47, 0xff, 0x00]).unwrap_err();
        assert!(matches!(err, DashboardError::DataFormat(_)));
        assert!(state.dataset.is_none());
    }

    #[test]
    fn filtered_table_downloads_as_csv() {
        let mut state = scenario_state();
        state.set_age_range(40, 60);
        state.submit();
        let bytes = state
            .export(ExportTarget::FilteredTable, ExportFormat::Csv)
            .unwrap();
        let table = parse_delimited(&bytes, b',').unwrap();
        assert_eq!(&table, state.filtered.as_ref().unwrap().as_ref());
    }

    #[test]
    fn summary_of_empty_filter_cannot_be_exported() {
        let mut state = scenario_state();
        state.set_select_all("month", false);
        state.submit();
        let err = state
            .export(ExportTarget::FilteredSummary, ExportFormat::Xlsx)
            .unwrap_err();
        assert!(matches!(err, DashboardError::EmptyResult(_)));
    }

    #[test]
    fn export_without_dataset_fails() {
        let state = AppState::default();
        assert!(state.export(ExportTarget::FilteredTable, ExportFormat::Csv).is_err());
    }
}
