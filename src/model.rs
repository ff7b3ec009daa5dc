use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Processing service used when no `--base-url` is given.
pub const DEFAULT_BASE_URL: &str = "https://leitorback-2.onrender.com";

/// Path of the processing endpoint, relative to the base URL.
pub const PROCESS_PATH: &str = "/processar/";

/// Multipart field name the service reads the spreadsheet from.
pub const FILE_FIELD: &str = "file";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Filename recorded in history when a submission had no file attached.
pub const UNKNOWN_FILENAME: &str = "Arquivo desconhecido";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: String,
}

impl SubmitConfig {
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), PROCESS_PATH)
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("contratos-cli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A spreadsheet chosen by the user, held fully in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk. Type and size are not checked here; the service decides.
    pub async fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, content))
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

// Content is omitted so logging a selection never dumps a spreadsheet.
impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size", &self.size())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum FilterOption {
    #[default]
    #[serde(rename = "auditado")]
    #[value(name = "auditado")]
    Audited,
    #[serde(rename = "nao_auditado")]
    #[value(name = "nao-auditado")]
    NotAudited,
    #[serde(rename = "todos")]
    #[value(name = "todos")]
    All,
}

impl FilterOption {
    pub const ALL: [FilterOption; 3] = [
        FilterOption::Audited,
        FilterOption::NotAudited,
        FilterOption::All,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterOption::Audited => "Auditados",
            FilterOption::NotAudited => "Não auditados",
            FilterOption::All => "Todos",
        }
    }

    /// Next option in display order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub file: Option<SelectedFile>,
    pub filter: FilterOption,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Idle,
    Uploading,
    Processing,
    Success,
    Error,
}

impl ProcessingStatus {
    pub fn is_in_flight(self) -> bool {
        matches!(self, ProcessingStatus::Uploading | ProcessingStatus::Processing)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Success | ProcessingStatus::Error)
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcessingStatus::Idle => "Aguardando",
            ProcessingStatus::Uploading => "Enviando arquivo…",
            ProcessingStatus::Processing => "Processando…",
            ProcessingStatus::Success => "Concluído",
            ProcessingStatus::Error => "Erro",
        }
    }
}

/// Counts extracted from a successful processing response. Other fields are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    pub total_rows: Option<u64>,
    pub total_columns: Option<u64>,
    pub total_contracts: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HistoryOutcome {
    Success { result: SubmissionResult },
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub filename: String,
    pub filter: FilterOption,
    pub timestamp: String,
    #[serde(flatten)]
    pub outcome: HistoryOutcome,
}

impl HistoryEntry {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, HistoryOutcome::Success { .. })
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        match &self.outcome {
            HistoryOutcome::Success { result } => Some(result),
            HistoryOutcome::Error => None,
        }
    }
}

/// Events emitted by the lifecycle controller for presentation layers.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    StatusChanged(ProcessingStatus),
    SelectionChanged {
        filename: Option<String>,
        filter: FilterOption,
    },
    Completed(Box<SubmissionSnapshot>),
    Info(String),
}

/// Terminal state of one submission, handed to presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSnapshot {
    pub status: ProcessingStatus,
    pub filter: FilterOption,
    pub filename: Option<String>,
    pub error: Option<String>,
    pub result: Option<SubmissionResult>,
    /// Entry appended by this submission; `None` when nothing was sent.
    pub entry: Option<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        let cfg = SubmitConfig {
            base_url: "http://localhost:8000/".into(),
            ..Default::default()
        };
        assert_eq!(cfg.endpoint(), "http://localhost:8000/processar/");
    }

    #[test]
    fn filter_defaults_to_audited_and_cycles() {
        assert_eq!(FilterOption::default(), FilterOption::Audited);
        let mut f = FilterOption::default();
        for _ in 0..FilterOption::ALL.len() {
            f = f.next();
        }
        assert_eq!(f, FilterOption::Audited);
    }

    #[test]
    fn in_flight_statuses() {
        assert!(ProcessingStatus::Uploading.is_in_flight());
        assert!(ProcessingStatus::Processing.is_in_flight());
        assert!(!ProcessingStatus::Idle.is_in_flight());
        assert!(ProcessingStatus::Error.is_terminal());
        assert!(!ProcessingStatus::Processing.is_terminal());
    }

    #[test]
    fn history_entry_serializes_flat_outcome() {
        let entry = HistoryEntry {
            id: 1,
            filename: "contratos.xlsx".into(),
            filter: FilterOption::Audited,
            timestamp: "15/10/2026, 10:00:00".into(),
            outcome: HistoryOutcome::Error,
        };
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["filter"], "auditado");
        assert!(v.get("result").is_none());
    }

    #[test]
    fn absent_counts_export_as_null() {
        let result = SubmissionResult {
            total_rows: Some(9),
            ..Default::default()
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["total_rows"], 9);
        assert!(v["total_columns"].is_null());
        assert!(v["total_contracts"].is_null());
    }

    #[test]
    fn debug_omits_file_content() {
        let file = SelectedFile::new("a.xlsx", vec![1u8, 2, 3]);
        let dbg = format!("{file:?}");
        assert!(dbg.contains("size: 3"));
        assert!(!dbg.contains("content"));
    }
}
