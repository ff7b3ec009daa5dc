//! Text summary builder for CLI output.

use crate::model::{ProcessingStatus, SubmissionSnapshot};
use crate::presenter;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished submission.
pub(crate) fn build_text_summary(snap: &SubmissionSnapshot) -> TextSummary {
    let mut lines = Vec::new();

    if let Some(name) = snap.filename.as_deref() {
        lines.push(format!("Arquivo: {name}"));
    }
    lines.push(format!("Filtro: {}", snap.filter.label()));
    lines.push(format!("Status: {}", snap.status.label()));

    match snap.status {
        ProcessingStatus::Success => {
            if let Some(result) = snap.result.as_ref() {
                for field in presenter::present(result) {
                    lines.push(format!("{}: {}", field.label, field.value));
                }
            }
        }
        ProcessingStatus::Error => {
            if let Some(msg) = snap.error.as_deref() {
                lines.push(format!("Erro: {msg}"));
            }
        }
        _ => {}
    }

    if let Some(entry) = snap.entry.as_ref() {
        lines.push(format!("Registrado em: {}", entry.timestamp));
    }

    TextSummary { lines }
}
