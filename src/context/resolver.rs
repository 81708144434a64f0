//! Resolves symbolic table references against one financial document.
//!
//! A `DocumentContext` is built once per report and shared read-only
//! across every turn of a conversation. Lookups are by normalized label;
//! duplicate labels resolve to their first occurrence and carry an
//! ambiguity flag so an auditing layer can choose to fail instead of
//! guessing.

use super::table::{normalize_label, parse_cell, CellValue};
use crate::records::DocumentRecord;
use std::collections::HashSet;

/// A successfully resolved numeric reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub value: f64,
    /// The source cell carried a trailing `%` (value already rescaled).
    pub percent_scaled: bool,
    /// The row or column label matched more than one table entry; the
    /// first occurrence was used.
    pub ambiguous: bool,
}

#[derive(Debug, Clone)]
struct TableRow {
    label: String,
    cells: Vec<CellValue>,
}

/// Immutable per-report lookup from symbolic reference to numeric value.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
    rows: Vec<TableRow>,
    columns: Vec<String>,
    duplicate_rows: HashSet<String>,
    duplicate_columns: HashSet<String>,
    pre_text: Vec<String>,
    post_text: Vec<String>,
}

impl DocumentContext {
    /// Builds a context from the raw document shape: row 0 is the
    /// header row, column 0 of each subsequent row is the row label.
    pub fn new(table: &[Vec<String>], pre_text: &[String], post_text: &[String]) -> Self {
        let mut columns = Vec::new();
        let mut duplicate_columns = HashSet::new();
        if let Some(header) = table.first() {
            for raw in header.iter().skip(1) {
                let label = normalize_label(raw);
                if columns.contains(&label) {
                    duplicate_columns.insert(label.clone());
                }
                columns.push(label);
            }
        }

        let mut rows = Vec::new();
        let mut duplicate_rows = HashSet::new();
        for raw_row in table.iter().skip(1) {
            let Some(raw_label) = raw_row.first() else {
                continue;
            };
            let label = normalize_label(raw_label);
            if rows.iter().any(|r: &TableRow| r.label == label) {
                duplicate_rows.insert(label.clone());
            }
            let cells = raw_row.iter().skip(1).map(|c| parse_cell(c)).collect();
            rows.push(TableRow { label, cells });
        }

        Self {
            rows,
            columns,
            duplicate_rows,
            duplicate_columns,
            pre_text: pre_text.to_vec(),
            post_text: post_text.to_vec(),
        }
    }

    pub fn from_record(record: &DocumentRecord) -> Self {
        Self::new(&record.table, &record.pre_text, &record.post_text)
    }

    /// Resolves a single `(row, column)` cell. `None` means not found;
    /// a non-numeric cell is also not found (never a default of zero).
    pub fn resolve_cell(&self, row: &str, column: &str) -> Option<Resolution> {
        let row_label = normalize_label(row);
        let column_label = normalize_label(column);

        let row_entry = self.rows.iter().find(|r| r.label == row_label)?;
        let column_index = self.columns.iter().position(|c| *c == column_label)?;

        let ambiguous = self.duplicate_rows.contains(&row_label)
            || self.duplicate_columns.contains(&column_label);
        if ambiguous {
            tracing::warn!(
                row = %row_label,
                column = %column_label,
                "ambiguous table label, resolving to first occurrence"
            );
        }

        match row_entry.cells.get(column_index)? {
            CellValue::Number {
                value,
                percent_scaled,
            } => Some(Resolution {
                value: *value,
                percent_scaled: *percent_scaled,
                ambiguous,
            }),
            CellValue::NonNumeric => None,
        }
    }

    /// Resolves a scalar table token: `row :: column` names one cell.
    /// A bare row token does not resolve to a scalar.
    pub fn resolve_scalar(&self, token: &str) -> Option<Resolution> {
        let (row, column) = token.split_once("::")?;
        self.resolve_cell(row, column)
    }

    /// Resolves a token for an aggregate operand: `row :: column` yields
    /// at most one value, a bare token yields every numeric cell of that
    /// row. Non-numeric and missing entries are simply absent from the
    /// returned list.
    pub fn resolve_values(&self, token: &str) -> Vec<Resolution> {
        if token.contains("::") {
            return self.resolve_scalar(token).into_iter().collect();
        }

        let row_label = normalize_label(token);
        let Some(row_entry) = self.rows.iter().find(|r| r.label == row_label) else {
            return Vec::new();
        };
        let ambiguous = self.duplicate_rows.contains(&row_label);
        if ambiguous {
            tracing::warn!(row = %row_label, "ambiguous row label in aggregate, using first occurrence");
        }

        row_entry
            .cells
            .iter()
            .filter_map(|cell| match cell {
                CellValue::Number {
                    value,
                    percent_scaled,
                } => Some(Resolution {
                    value: *value,
                    percent_scaled: *percent_scaled,
                    ambiguous,
                }),
                CellValue::NonNumeric => None,
            })
            .collect()
    }

    /// Free-form passages preceding the table. Exposed as opaque text;
    /// the core never retrieves over them itself.
    pub fn pre_text(&self) -> &[String] {
        &self.pre_text
    }

    /// Free-form passages following the table.
    pub fn post_text(&self) -> &[String] {
        &self.post_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ups_table() -> Vec<Vec<String>> {
        vec![
            vec!["", "12/31/04", "12/31/05", "12/31/06"],
            vec!["United Parcel Service Inc.", "$ 100.00", "89.49", "91.06"],
            vec!["S&P 500 Index", "100.00", "104.91", "121.48"],
            vec!["Margin", "n/a", "4.1%", "(2.3%)"],
        ]
        .into_iter()
        .map(|row| row.into_iter().map(String::from).collect())
        .collect()
    }

    fn context() -> DocumentContext {
        DocumentContext::new(&ups_table(), &[], &[])
    }

    #[test]
    fn resolves_cell_with_currency_stripped() {
        let res = context()
            .resolve_cell("united parcel service inc.", "12/31/04")
            .unwrap();
        assert_eq!(res.value, 100.0);
        assert!(!res.percent_scaled);
        assert!(!res.ambiguous);
    }

    #[test]
    fn lookup_is_case_and_punctuation_insensitive() {
        let res = context()
            .resolve_cell("UNITED PARCEL SERVICE, INC", "12-31-06")
            .unwrap();
        assert_eq!(res.value, 91.06);
    }

    #[test]
    fn percent_cells_are_rescaled_and_flagged() {
        let res = context().resolve_cell("margin", "12/31/05").unwrap();
        assert!((res.value - 0.041).abs() < 1e-12);
        assert!(res.percent_scaled);

        let neg = context().resolve_cell("margin", "12/31/06").unwrap();
        assert!((neg.value + 0.023).abs() < 1e-12);
    }

    #[test]
    fn non_numeric_cell_is_not_found() {
        assert!(context().resolve_cell("margin", "12/31/04").is_none());
    }

    #[test]
    fn missing_row_or_column_is_not_found() {
        let ctx = context();
        assert!(ctx.resolve_cell("fedex", "12/31/04").is_none());
        assert!(ctx.resolve_cell("margin", "12/31/09").is_none());
    }

    #[test]
    fn scalar_token_requires_cell_form() {
        let ctx = context();
        let res = ctx.resolve_scalar("s&p 500 index :: 12/31/05").unwrap();
        assert_eq!(res.value, 104.91);
        assert!(ctx.resolve_scalar("s&p 500 index").is_none());
    }

    #[test]
    fn bare_row_token_expands_for_aggregates() {
        let values: Vec<f64> = context()
            .resolve_values("s&p 500 index")
            .into_iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, vec![100.0, 104.91, 121.48]);
    }

    #[test]
    fn aggregate_expansion_skips_non_numeric_cells() {
        let values = context().resolve_values("margin");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn duplicate_row_label_resolves_first_and_flags() {
        let mut table = ups_table();
        table.push(
            vec!["margin", "9.9%", "9.9%", "9.9%"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        let ctx = DocumentContext::new(&table, &[], &[]);
        let res = ctx.resolve_cell("margin", "12/31/05").unwrap();
        assert!((res.value - 0.041).abs() < 1e-12);
        assert!(res.ambiguous);
    }

    #[test]
    fn unknown_token_yields_no_values() {
        assert!(context().resolve_values("none").is_empty());
    }
}
