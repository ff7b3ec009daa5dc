use crate::model::{
    FilterOption, HistoryEntry, LifecycleEvent, ProcessingStatus, SubmissionResult,
};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// View state owned by the UI thread. It mirrors the controller through events only.
pub struct UiState {
    pub tab: usize,
    pub info: String,
    pub tick: usize,

    // Selection as last reported by the controller
    pub filename: Option<String>,
    pub filter: FilterOption,

    // Path input
    pub path_input: String,
    pub editing_path: bool,

    pub status: ProcessingStatus,
    pub error_message: Option<String>,
    pub result: Option<SubmissionResult>,

    pub history: Vec<HistoryEntry>,
    pub history_selected: usize, // 0 = most recent
    pub history_scroll_offset: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            info: String::new(),
            tick: 0,
            filename: None,
            filter: FilterOption::default(),
            path_input: String::new(),
            editing_path: false,
            status: ProcessingStatus::Idle,
            error_message: None,
            result: None,
            history: Vec::new(),
            history_selected: 0,
            history_scroll_offset: 0,
        }
    }
}

impl UiState {
    /// Selection, filter and process inputs are disabled while a request is in flight.
    pub fn inputs_locked(&self) -> bool {
        self.status.is_in_flight()
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[(self.tick / 2) % SPINNER.len()]
    }

    pub fn selected_entry(&self) -> Option<&HistoryEntry> {
        self.history.get(self.history_selected)
    }

    pub fn apply_event(&mut self, ev: LifecycleEvent) {
        match ev {
            LifecycleEvent::StatusChanged(status) => {
                self.status = status;
                if status == ProcessingStatus::Idle || status.is_in_flight() {
                    self.error_message = None;
                    self.result = None;
                }
            }
            LifecycleEvent::SelectionChanged { filename, filter } => {
                if filename != self.filename {
                    if let Some(name) = filename.as_deref() {
                        self.info = format!("Arquivo selecionado: {name}");
                    }
                }
                self.filename = filename;
                self.filter = filter;
            }
            LifecycleEvent::Completed(snap) => {
                self.status = snap.status;
                self.error_message = snap.error;
                self.result = snap.result;
                if let Some(entry) = snap.entry {
                    self.history.insert(0, entry);
                    // Keep the highlighted entry stable when a new one lands on top.
                    if self.history.len() > 1 {
                        self.history_selected += 1;
                    }
                }
                self.info = match self.status {
                    ProcessingStatus::Success => "Processamento concluído".into(),
                    _ => "Processamento falhou".into(),
                };
            }
            LifecycleEvent::Info(msg) => self.info = msg,
        }
    }

    pub fn status_style(&self) -> Style {
        let color = match self.status {
            ProcessingStatus::Idle => Color::Gray,
            ProcessingStatus::Uploading | ProcessingStatus::Processing => Color::Yellow,
            ProcessingStatus::Success => Color::Green,
            ProcessingStatus::Error => Color::Red,
        };
        Style::default().fg(color)
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HistoryOutcome, SubmissionSnapshot};

    fn entry(id: u64) -> HistoryEntry {
        HistoryEntry {
            id,
            filename: "a.xlsx".into(),
            filter: FilterOption::Audited,
            timestamp: "15/10/2026, 09:00:00".into(),
            outcome: HistoryOutcome::Error,
        }
    }

    fn completed(status: ProcessingStatus, id: u64) -> LifecycleEvent {
        LifecycleEvent::Completed(Box::new(SubmissionSnapshot {
            status,
            filter: FilterOption::Audited,
            filename: Some("a.xlsx".into()),
            error: Some("falhou".into()),
            result: None,
            entry: Some(entry(id)),
        }))
    }

    #[test]
    fn in_flight_locks_inputs_and_clears_outcome() {
        let mut state = UiState {
            error_message: Some("antigo".into()),
            ..Default::default()
        };
        state.apply_event(LifecycleEvent::StatusChanged(ProcessingStatus::Processing));
        assert!(state.inputs_locked());
        assert!(state.error_message.is_none());
    }

    #[test]
    fn completion_prepends_history_and_keeps_selection() {
        let mut state = UiState::default();
        state.apply_event(completed(ProcessingStatus::Error, 1));
        assert_eq!(state.history_selected, 0);
        state.apply_event(completed(ProcessingStatus::Error, 2));
        assert_eq!(state.history[0].id, 2);
        assert_eq!(state.selected_entry().map(|e| e.id), Some(1));
        assert!(!state.inputs_locked());
        assert_eq!(state.error_message.as_deref(), Some("falhou"));
    }

    #[test]
    fn wraps_long_values() {
        let mut out = Vec::new();
        push_wrapped_status_kv(&mut out, "Erro", &"x".repeat(50), 24);
        assert!(out.len() > 1);
    }
}
