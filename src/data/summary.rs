use std::collections::BTreeMap;

use super::model::{CellValue, Record, Table};
use crate::error::{DashboardError, Result};

/// Relative frequency of each outcome label, in percent, sorted by label.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Name of the summarised column.
    pub column: String,
    /// `(label, percent)` pairs in ascending label order.
    pub entries: Vec<(CellValue, f64)>,
    /// Number of non-null cells the percentages are taken over.
    pub population: usize,
}

impl Summary {
    pub fn percent_of(&self, label: &CellValue) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, pct)| *pct)
    }

    /// Two-column table (`column`, `proportion`) for download.
    pub fn to_table(&self) -> Table {
        let rows = self
            .entries
            .iter()
            .map(|(label, pct)| Record::new(vec![label.clone(), CellValue::Float(*pct)]))
            .collect();
        Table::new(vec![self.column.clone(), "proportion".to_string()], rows)
    }
}

/// Percentage of each distinct value of `outcome_column` within `table`.
///
/// Null cells are not counted. Fails with [`DashboardError::EmptyResult`]
/// when nothing is left to count.
pub fn proportions(table: &Table, outcome_column: &str) -> Result<Summary> {
    let mut counts: BTreeMap<CellValue, usize> = BTreeMap::new();
    for value in table.column_values(outcome_column)? {
        if !value.is_null() {
            *counts.entry(value.clone()).or_default() += 1;
        }
    }

    let population: usize = counts.values().sum();
    if population == 0 {
        return Err(DashboardError::EmptyResult(outcome_column.to_string()));
    }

    let entries = counts
        .into_iter()
        .map(|(label, n)| (label, n as f64 * 100.0 / population as f64))
        .collect();

    Ok(Summary {
        column: outcome_column.to_string(),
        entries,
        population,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(labels: &[&str]) -> Table {
        Table::new(
            vec!["y".into()],
            labels
                .iter()
                .map(|l| Record::new(vec![CellValue::guess(l)]))
                .collect(),
        )
    }

    #[test]
    fn percentages_are_label_sorted_and_sum_to_100() {
        let summary = proportions(&outcomes(&["yes", "no", "no", "yes", "no", "no"]), "y").unwrap();
        let labels: Vec<String> = summary.entries.iter().map(|(l, _)| l.to_string()).collect();
        assert_eq!(labels, vec!["no", "yes"]);
        assert!((summary.percent_of(&"no".into()).unwrap() - 66.666_666).abs() < 1e-3);
        let total: f64 = summary.entries.iter().map(|(_, p)| p).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(summary.population, 6);
    }

    #[test]
    fn even_split_is_fifty_fifty() {
        let summary = proportions(&outcomes(&["no", "yes"]), "y").unwrap();
        assert_eq!(summary.percent_of(&"no".into()), Some(50.0));
        assert_eq!(summary.percent_of(&"yes".into()), Some(50.0));
    }

    #[test]
    fn empty_population_is_an_error() {
        let err = proportions(&outcomes(&[]), "y").unwrap_err();
        assert!(matches!(err, DashboardError::EmptyResult(c) if c == "y"));

        let only_nulls = proportions(&outcomes(&["", ""]), "y");
        assert!(matches!(only_nulls, Err(DashboardError::EmptyResult(_))));
    }

    #[test]
    fn missing_outcome_column_is_reported() {
        let err = proportions(&outcomes(&["yes"]), "outcome").unwrap_err();
        assert!(matches!(err, DashboardError::MissingColumn(_)));
    }

    #[test]
    fn summary_table_has_one_row_per_label() {
        let summary = proportions(&outcomes(&["no", "no", "yes", "no"]), "y").unwrap();
        let table = summary.to_table();
        assert_eq!(table.columns, vec!["y", "proportion"]);
        assert_eq!(table.rows[1].values, vec![CellValue::from("yes"), CellValue::Float(25.0)]);
    }
}
