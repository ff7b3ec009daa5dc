//! Command loop around the lifecycle controller.
//!
//! Presentation layers send `UiCommand`s and receive `LifecycleEvent`s; the loop owns the
//! controller so every mutation is serialized on one task.

use super::lifecycle::LifecycleController;
use crate::engine::Transport;
use crate::history::HistoryLog;
use crate::model::{FilterOption, LifecycleEvent, SelectedFile};
use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    SelectFile(PathBuf),
    SetFilter(FilterOption),
    Submit,
    Quit,
}

/// Drive the controller until `Quit` (or the command channel closes) and hand back
/// the session history.
pub(crate) async fn run_controller<T: Transport>(
    mut ctrl: LifecycleController<T>,
    event_tx: UnboundedSender<LifecycleEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<HistoryLog> {
    let info = |msg: String| {
        let _ = event_tx.send(LifecycleEvent::Info(msg));
    };

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            UiCommand::SelectFile(path) => match SelectedFile::from_path(&path).await {
                Ok(file) => ctrl.select_file(file),
                Err(e) => info(format!("Falha ao abrir arquivo: {e:#}")),
            },
            UiCommand::SetFilter(filter) => ctrl.set_filter(filter),
            UiCommand::Submit => {
                let mut quit = false;
                {
                    let submission = ctrl.submit();
                    tokio::pin!(submission);
                    // Keep listening while the request is in flight: selection changes are
                    // rejected, quitting drops the request.
                    loop {
                        tokio::select! {
                            biased;
                            _ = &mut submission => break,
                            cmd = cmd_rx.recv() => match cmd {
                                Some(UiCommand::Quit) | None => {
                                    quit = true;
                                    break;
                                }
                                Some(other) => {
                                    tracing::debug!(?other, "command rejected while in flight");
                                    info("Aguarde o processamento terminar".into());
                                }
                            }
                        }
                    }
                }
                if quit {
                    tracing::info!("quit requested during submission; request dropped");
                    break;
                }
            }
            UiCommand::Quit => break,
        }
    }

    Ok(ctrl.history().clone())
}
