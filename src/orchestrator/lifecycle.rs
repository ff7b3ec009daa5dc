//! Request lifecycle state machine.
//!
//! `LifecycleController` owns the selection, the processing status, the last result or
//! error message, and the session history. Front-ends only go through its operations.

use crate::engine::{execute_submission, SubmissionError, Transport};
use crate::history::HistoryLog;
use crate::model::{
    FilterOption, HistoryEntry, LifecycleEvent, ProcessingStatus, SelectedFile, Selection,
    SubmissionResult, SubmissionSnapshot, SubmitConfig,
};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

pub struct LifecycleController<T> {
    transport: T,
    timeout: Duration,
    selection: Selection,
    status: ProcessingStatus,
    error_message: Option<String>,
    result: Option<SubmissionResult>,
    history: HistoryLog,
    event_tx: Option<UnboundedSender<LifecycleEvent>>,
}

impl<T: Transport> LifecycleController<T> {
    pub fn new(transport: T, cfg: &SubmitConfig) -> Self {
        Self {
            transport,
            timeout: cfg.timeout,
            selection: Selection::default(),
            status: ProcessingStatus::Idle,
            error_message: None,
            result: None,
            history: HistoryLog::new(),
            event_tx: None,
        }
    }

    /// Forward status changes and completions to a presentation layer.
    pub fn with_events(mut self, tx: UnboundedSender<LifecycleEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Replace the selected file and reset to `idle`, dropping any previous outcome.
    pub fn select_file(&mut self, file: SelectedFile) {
        tracing::debug!(file = ?file, "file selected");
        self.selection.file = Some(file);
        self.error_message = None;
        self.result = None;
        self.set_status(ProcessingStatus::Idle);
        self.emit_selection();
    }

    pub fn set_filter(&mut self, filter: FilterOption) {
        self.selection.filter = filter;
        self.emit_selection();
    }

    /// Run one submission to completion.
    ///
    /// Every failure is absorbed into the controller state; the returned snapshot is
    /// what a front-end needs to render the terminal state.
    pub async fn submit(&mut self) -> SubmissionSnapshot {
        let filter = self.selection.filter;

        let Some(file) = self.selection.file.clone() else {
            // Nothing was sent, so nothing is recorded.
            self.result = None;
            self.error_message = Some(SubmissionError::NoFileSelected.to_string());
            self.set_status(ProcessingStatus::Error);
            return self.finish(filter, None, None);
        };

        self.error_message = None;
        self.result = None;
        self.set_status(ProcessingStatus::Uploading);

        self.set_status(ProcessingStatus::Processing);
        tracing::info!(file = %file.name, size = file.size(), ?filter, "submitting");
        let outcome = execute_submission(&self.transport, &file, self.timeout).await;

        let entry = match outcome {
            Ok(result) => {
                tracing::info!(file = %file.name, ?result, "processing succeeded");
                self.result = Some(result.clone());
                self.set_status(ProcessingStatus::Success);
                Some(
                    self.history
                        .record_outcome(Some(&file.name), filter, Some(result)),
                )
            }
            Err(err) => {
                tracing::warn!(file = %file.name, kind = err.kind(), error = %err, "processing failed");
                self.error_message = Some(err.to_string());
                self.set_status(ProcessingStatus::Error);
                err.records_history()
                    .then(|| self.history.record_outcome(Some(&file.name), filter, None))
            }
        };

        self.finish(filter, Some(file.name), entry)
    }

    fn finish(
        &self,
        filter: FilterOption,
        filename: Option<String>,
        entry: Option<HistoryEntry>,
    ) -> SubmissionSnapshot {
        debug_assert!(self.status.is_terminal());
        let snapshot = SubmissionSnapshot {
            status: self.status,
            filter,
            filename,
            error: self.error_message.clone(),
            result: self.result.clone(),
            entry,
        };
        self.emit(LifecycleEvent::Completed(Box::new(snapshot.clone())));
        snapshot
    }

    fn set_status(&mut self, status: ProcessingStatus) {
        if self.status != status {
            tracing::debug!(from = ?self.status, to = ?status, "status transition");
        }
        self.status = status;
        self.emit(LifecycleEvent::StatusChanged(status));
    }

    fn emit_selection(&self) {
        self.emit(LifecycleEvent::SelectionChanged {
            filename: self.selection.file.as_ref().map(|f| f.name.clone()),
            filter: self.selection.filter,
        });
    }

    fn emit(&self, ev: LifecycleEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(ev);
        }
    }
}
