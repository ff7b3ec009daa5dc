//! End-of-session processing.

use crate::history::HistoryLog;
use anyhow::{Context, Result};
use std::path::Path;

/// Write the session history as a pretty-printed JSON array, most recent first.
pub(crate) fn export_history(path: &Path, history: &HistoryLog) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(history).context("serialize history")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), entries = history.len(), "history exported");
    Ok(())
}

/// Line reported on stderr once an export has been written.
pub(crate) fn export_notice(path: &Path) -> String {
    format!("Exportado: {}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterOption, SubmissionResult};

    #[test]
    fn writes_history_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("historico.json");

        let mut history = HistoryLog::new();
        history.record_outcome(Some("a.xlsx"), FilterOption::Audited, None);
        history.record_outcome(
            Some("b.xlsx"),
            FilterOption::All,
            Some(SubmissionResult {
                total_rows: Some(12),
                total_columns: None,
                total_contracts: Some(4),
            }),
        );

        export_history(&path, &history).unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let arr = v.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["filename"], "b.xlsx");
        assert_eq!(arr[0]["status"], "success");
        assert_eq!(arr[0]["result"]["total_contracts"], 4);
        assert_eq!(arr[1]["status"], "error");
    }

    #[test]
    fn export_notice_names_the_file() {
        let notice = export_notice(Path::new("saida/historico.json"));
        assert_eq!(notice, "Exportado: saida/historico.json");
    }
}
