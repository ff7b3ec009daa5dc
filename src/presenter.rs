//! Display mapping for processing results.
//!
//! Rows are always shown, as `N/A` when the service omitted them. Columns and contracts
//! are shown whenever the service sent them, zero included.

use crate::model::SubmissionResult;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayField {
    pub label: &'static str,
    pub value: String,
}

pub fn present(result: &SubmissionResult) -> Vec<DisplayField> {
    let mut fields = vec![DisplayField {
        label: "Total de Linhas",
        value: result
            .total_rows
            .map(|n| n.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }];
    if let Some(n) = result.total_columns {
        fields.push(DisplayField {
            label: "Total de Colunas",
            value: n.to_string(),
        });
    }
    if let Some(n) = result.total_contracts {
        fields.push(DisplayField {
            label: "Total de Contratos",
            value: n.to_string(),
        });
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(fields: &[DisplayField]) -> Vec<&str> {
        fields.iter().map(|f| f.label).collect()
    }

    #[test]
    fn rows_and_columns_without_contracts() {
        let fields = present(&SubmissionResult {
            total_rows: Some(42),
            total_columns: Some(5),
            total_contracts: None,
        });
        assert_eq!(labels(&fields), vec!["Total de Linhas", "Total de Colunas"]);
        assert_eq!(fields[0].value, "42");
        assert_eq!(fields[1].value, "5");
    }

    #[test]
    fn absent_rows_show_not_available() {
        let fields = present(&SubmissionResult::default());
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value, NOT_AVAILABLE);
    }

    #[test]
    fn zero_counts_are_shown() {
        let fields = present(&SubmissionResult {
            total_rows: Some(0),
            total_columns: Some(0),
            total_contracts: Some(0),
        });
        assert_eq!(fields.len(), 3);
        assert!(fields.iter().all(|f| f.value == "0"));
    }
}
