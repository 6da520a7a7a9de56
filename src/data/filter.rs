use std::collections::{BTreeMap, BTreeSet};

use super::model::{CellValue, Table};
use crate::error::Result;

/// Numeric column narrowed by the range control.
pub const AGE_COLUMN: &str = "age";

/// Categorical columns in the order their filters are applied.
pub const CATEGORICAL_COLUMNS: [&str; 8] = [
    "job",
    "marital",
    "default",
    "housing",
    "loan",
    "contact",
    "month",
    "day_of_week",
];

/// Label of the "no restriction" entry in every multiselect.
pub const ALL_LABEL: &str = "all";

// ---------------------------------------------------------------------------
// Selection: the allowed values of one categorical column
// ---------------------------------------------------------------------------

/// The values picked in one multiselect.
///
/// When the `all` sentinel is part of the selection the column is not
/// restricted, whatever else is picked. Without it, only rows whose value is
/// in `values` pass; an empty set lets nothing through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    all: bool,
    values: BTreeSet<CellValue>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::all()
    }
}

impl Selection {
    /// Just the sentinel.
    pub fn all() -> Self {
        Selection {
            all: true,
            values: BTreeSet::new(),
        }
    }

    /// An explicit set of allowed values, without the sentinel.
    pub fn only<I: IntoIterator<Item = CellValue>>(values: I) -> Self {
        Selection {
            all: false,
            values: values.into_iter().collect(),
        }
    }

    /// Whether the sentinel is selected.
    pub fn includes_all(&self) -> bool {
        self.all
    }

    /// Explicitly picked values (ignored while the sentinel is selected).
    pub fn values(&self) -> &BTreeSet<CellValue> {
        &self.values
    }

    /// Whether a row with `value` passes this selection.
    pub fn admits(&self, value: &CellValue) -> bool {
        self.all || self.values.contains(value)
    }

    pub fn set_all(&mut self, all: bool) {
        self.all = all;
    }

    /// Add or remove one explicit value.
    pub fn toggle(&mut self, value: &CellValue) {
        if !self.values.remove(value) {
            self.values.insert(value.clone());
        }
    }
}

/// Keep the rows whose `column` value is selected.
///
/// With the sentinel selected the input is returned unchanged. Otherwise the
/// surviving rows keep their relative order and are renumbered from zero.
pub fn filter_by_values(table: &Table, column: &str, selected: &Selection) -> Result<Table> {
    retain_values(table.clone(), column, selected)
}

fn retain_values(mut table: Table, column: &str, selected: &Selection) -> Result<Table> {
    if selected.includes_all() {
        return Ok(table);
    }
    let idx = table.column_index(column)?;
    table.rows.retain(|row| selected.admits(row.get(idx)));
    Ok(table)
}

// ---------------------------------------------------------------------------
// Age range
// ---------------------------------------------------------------------------

/// Inclusive integer range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgeRange {
    pub min: i64,
    pub max: i64,
}

impl AgeRange {
    pub fn new(min: i64, max: i64) -> Self {
        AgeRange { min, max }
    }

    /// Non-numeric cells never pass.
    pub fn contains(&self, value: &CellValue) -> bool {
        value
            .as_f64()
            .is_some_and(|v| v >= self.min as f64 && v <= self.max as f64)
    }
}

// ---------------------------------------------------------------------------
// Filter specification
// ---------------------------------------------------------------------------

/// Everything the filter form submits: one age range plus one selection per
/// categorical column. Columns without an entry are unrestricted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterSpec {
    pub age: AgeRange,
    pub selections: BTreeMap<String, Selection>,
}

impl FilterSpec {
    /// A spec restricting only the age range.
    pub fn new(age: AgeRange) -> Self {
        FilterSpec {
            age,
            selections: CATEGORICAL_COLUMNS
                .iter()
                .map(|c| (c.to_string(), Selection::all()))
                .collect(),
        }
    }

    /// Replace the selection of one column.
    pub fn with_selection(mut self, column: &str, selection: Selection) -> Self {
        self.selections.insert(column.to_string(), selection);
        self
    }

    /// The selection for a column (`all` if none was set).
    pub fn selection(&self, column: &str) -> Selection {
        self.selections.get(column).cloned().unwrap_or_default()
    }

    pub fn selection_mut(&mut self, column: &str) -> &mut Selection {
        self.selections.entry(column.to_string()).or_default()
    }
}

// ---------------------------------------------------------------------------
// Pipeline: an ordered list of stages folded over the table
// ---------------------------------------------------------------------------

/// One narrowing step.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Range { column: String, range: AgeRange },
    Values { column: String, selection: Selection },
}

impl Stage {
    pub fn column(&self) -> &str {
        match self {
            Stage::Range { column, .. } | Stage::Values { column, .. } => column,
        }
    }

    fn apply(&self, mut table: Table) -> Result<Table> {
        match self {
            Stage::Range { column, range } => {
                let idx = table.column_index(column)?;
                table.rows.retain(|row| range.contains(row.get(idx)));
                Ok(table)
            }
            Stage::Values { column, selection } => retain_values(table, column, selection),
        }
    }
}

/// Row counts around one stage, for logging and inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTrace {
    pub column: String,
    pub rows_in: usize,
    pub rows_out: usize,
}

/// Stages applied left to right, each one to the output of the previous.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPipeline {
    stages: Vec<Stage>,
}

impl FilterPipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        FilterPipeline { stages }
    }

    /// Age range first, then the categorical columns in
    /// [`CATEGORICAL_COLUMNS`] order.
    pub fn from_spec(spec: &FilterSpec) -> Self {
        let mut stages = vec![Stage::Range {
            column: AGE_COLUMN.to_string(),
            range: spec.age,
        }];
        stages.extend(CATEGORICAL_COLUMNS.iter().map(|col| Stage::Values {
            column: col.to_string(),
            selection: spec.selection(col),
        }));
        FilterPipeline { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn run(&self, table: &Table) -> Result<Table> {
        self.stages
            .iter()
            .try_fold(table.clone(), |acc, stage| stage.apply(acc))
    }

    /// Like [`run`](Self::run), also reporting the row count after each stage.
    pub fn run_traced(&self, table: &Table) -> Result<(Table, Vec<StageTrace>)> {
        let mut traces = Vec::with_capacity(self.stages.len());
        let mut current = table.clone();
        for stage in &self.stages {
            let rows_in = current.len();
            current = stage.apply(current)?;
            traces.push(StageTrace {
                column: stage.column().to_string(),
                rows_in,
                rows_out: current.len(),
            });
        }
        Ok((current, traces))
    }
}

/// The maximal subsequence of `table` satisfying every constraint of `spec`.
pub fn apply_filters(table: &Table, spec: &FilterSpec) -> Result<Table> {
    FilterPipeline::from_spec(spec).run(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use crate::error::DashboardError;
    use proptest::prelude::*;

    const POOL: [&str; 3] = ["a", "b", "c"];

    fn columns() -> Vec<String> {
        std::iter::once(AGE_COLUMN)
            .chain(CATEGORICAL_COLUMNS)
            .chain(std::iter::once("y"))
            .map(String::from)
            .collect()
    }

    fn row(age: i64, cats: [&str; 8], y: &str) -> Record {
        let mut values = vec![CellValue::Integer(age)];
        values.extend(cats.iter().map(|c| CellValue::from(*c)));
        values.push(CellValue::from(y));
        Record::new(values)
    }

    fn scenario_table() -> Table {
        let cats = ["admin.", "married", "no", "yes", "no", "cellular", "may", "mon"];
        Table::new(
            columns(),
            vec![row(30, cats, "yes"), row(45, cats, "no"), row(60, cats, "yes")],
        )
    }

    #[test]
    fn age_range_is_inclusive_and_renumbers_rows() {
        let spec = FilterSpec::new(AgeRange::new(40, 70));
        let filtered = apply_filters(&scenario_table(), &spec).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.rows[0].values[0], CellValue::Integer(45));
        assert_eq!(filtered.rows[1].values[0], CellValue::Integer(60));

        let edges = apply_filters(&scenario_table(), &FilterSpec::new(AgeRange::new(30, 45)));
        assert_eq!(edges.unwrap().len(), 2);
    }

    #[test]
    fn unmatched_selection_yields_zero_rows() {
        let spec = FilterSpec::new(AgeRange::new(0, 100))
            .with_selection("job", Selection::only([CellValue::from("technician")]));
        let filtered = apply_filters(&scenario_table(), &spec).unwrap();
        assert!(filtered.is_empty());
        assert_eq!(filtered.columns, scenario_table().columns);
    }

    #[test]
    fn empty_explicit_selection_is_not_an_error() {
        let filtered =
            filter_by_values(&scenario_table(), "marital", &Selection::only([])).unwrap();
        assert!(filtered.is_empty());
    }

    #[test]
    fn sentinel_wins_over_explicit_values() {
        let mut selection = Selection::only([CellValue::from("nobody")]);
        selection.set_all(true);
        let filtered = filter_by_values(&scenario_table(), "job", &selection).unwrap();
        assert_eq!(filtered, scenario_table());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = Selection::only([]);
        selection.toggle(&CellValue::from("a"));
        assert!(selection.admits(&CellValue::from("a")));
        selection.toggle(&CellValue::from("a"));
        assert!(selection.values().is_empty());
    }

    #[test]
    fn non_numeric_age_never_passes_the_range() {
        assert!(!AgeRange::new(0, 100).contains(&CellValue::Null));
        assert!(!AgeRange::new(0, 100).contains(&CellValue::from("40")));
        assert!(AgeRange::new(0, 100).contains(&CellValue::Float(99.5)));
    }

    #[test]
    fn missing_filtered_column_is_reported() {
        let table = Table::new(vec!["job".into()], vec![]);
        let err = apply_filters(&table, &FilterSpec::new(AgeRange::new(0, 1))).unwrap_err();
        assert!(matches!(err, DashboardError::MissingColumn(c) if c == AGE_COLUMN));
    }

    #[test]
    fn trace_reports_each_stage_in_order() {
        let spec = FilterSpec::new(AgeRange::new(40, 70))
            .with_selection("month", Selection::only([CellValue::from("jun")]));
        let (table, traces) = FilterPipeline::from_spec(&spec)
            .run_traced(&scenario_table())
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(traces.len(), 9);
        assert_eq!(traces[0], StageTrace { column: "age".into(), rows_in: 3, rows_out: 2 });
        assert_eq!(traces[7].column, "month");
        assert_eq!((traces[7].rows_in, traces[7].rows_out), (2, 0));
    }

    // -- Property tests --

    fn arb_table() -> impl Strategy<Value = Table> {
        prop::collection::vec(
            (
                18i64..90,
                prop::array::uniform8(0usize..POOL.len()),
                prop::bool::ANY,
            ),
            0..40,
        )
        .prop_map(|rows| {
            let rows = rows
                .into_iter()
                .map(|(age, cats, yes)| {
                    row(age, cats.map(|i| POOL[i]), if yes { "yes" } else { "no" })
                })
                .collect();
            Table::new(columns(), rows)
        })
    }

    fn arb_selection() -> impl Strategy<Value = Selection> {
        prop_oneof![
            Just(Selection::all()),
            prop::sample::subsequence(POOL.to_vec(), 0..=POOL.len())
                .prop_map(|picked| Selection::only(picked.into_iter().map(CellValue::from))),
        ]
    }

    fn arb_spec() -> impl Strategy<Value = FilterSpec> {
        (18i64..90, 18i64..90, prop::collection::vec(arb_selection(), 8)).prop_map(
            |(a, b, selections)| {
                CATEGORICAL_COLUMNS.iter().zip(selections).fold(
                    FilterSpec::new(AgeRange::new(a.min(b), a.max(b))),
                    |spec, (col, sel)| spec.with_selection(col, sel),
                )
            },
        )
    }

    proptest! {
        #[test]
        fn sentinel_selection_is_identity(table in arb_table(), col in 0usize..8) {
            let out = filter_by_values(&table, CATEGORICAL_COLUMNS[col], &Selection::all()).unwrap();
            prop_assert_eq!(out, table);
        }

        #[test]
        fn survivors_are_exactly_the_members(
            table in arb_table(),
            col in 0usize..8,
            picked in prop::sample::subsequence(POOL.to_vec(), 1..=POOL.len()),
        ) {
            let column = CATEGORICAL_COLUMNS[col];
            let selection = Selection::only(picked.into_iter().map(CellValue::from));
            let out = filter_by_values(&table, column, &selection).unwrap();
            let idx = table.column_index(column).unwrap();

            prop_assert!(out.rows.iter().all(|r| selection.values().contains(r.get(idx))));
            let expected = table
                .rows
                .iter()
                .filter(|r| selection.values().contains(r.get(idx)))
                .count();
            prop_assert_eq!(out.len(), expected);
        }

        #[test]
        fn apply_filters_is_idempotent(table in arb_table(), spec in arb_spec()) {
            let once = apply_filters(&table, &spec).unwrap();
            let twice = apply_filters(&once, &spec).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn categorical_order_does_not_change_the_result(
            table in arb_table(),
            spec in arb_spec(),
            order in Just((0..8).collect::<Vec<usize>>()).prop_shuffle(),
        ) {
            let canonical = FilterPipeline::from_spec(&spec);
            let mut stages = vec![canonical.stages()[0].clone()];
            stages.extend(order.iter().map(|&i| canonical.stages()[i + 1].clone()));
            let permuted = FilterPipeline::new(stages).run(&table).unwrap();
            prop_assert_eq!(permuted, canonical.run(&table).unwrap());
        }
    }
}
