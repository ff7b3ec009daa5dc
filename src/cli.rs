use crate::engine::ReqwestTransport;
use crate::model::{FilterOption, ProcessingStatus, SelectedFile, SubmitConfig, DEFAULT_BASE_URL};
use crate::orchestrator::{export_history, export_notice, LifecycleController};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "contratos-cli",
    version,
    about = "Upload contract spreadsheets to the processing service"
)]
pub struct Cli {
    /// Spreadsheet to submit (required to actually send anything in --text/--json mode)
    pub file: Option<PathBuf>,

    /// Base URL of the processing service
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Filter option active for the submission
    #[arg(long, value_enum, default_value_t = FilterOption::Audited)]
    pub filter: FilterOption,

    /// Abort the request if no response arrives within this time
    #[arg(long, default_value = "120s")]
    pub timeout: humantime::Duration,

    /// Print JSON result and exit (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Write the session history as JSON when the session ends
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        !self.json && !self.text
    }
}

pub async fn run(args: Cli) -> Result<ExitCode> {
    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            crate::tui::run(args).await?;
            return Ok(ExitCode::SUCCESS);
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_once(args).await;
        }
    }

    run_once(args).await
}

/// Build a `SubmitConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> SubmitConfig {
    SubmitConfig {
        base_url: args.base_url.clone(),
        timeout: Duration::from(args.timeout),
        ..Default::default()
    }
}

/// Submit once, print the outcome, and map it to the process exit code.
async fn run_once(args: Cli) -> Result<ExitCode> {
    let cfg = build_config(&args);
    let transport = ReqwestTransport::new(&cfg).context("failed to build HTTP client")?;
    tracing::debug!(endpoint = %transport.endpoint(), timeout = ?cfg.timeout, "client ready");
    let mut ctrl = LifecycleController::new(transport, &cfg);

    if let Some(path) = args.file.as_deref() {
        let file = SelectedFile::from_path(path).await?;
        ctrl.select_file(file);
    }
    ctrl.set_filter(args.filter);

    let (out_tx, out_handle) = spawn_output_writer();
    if args.text {
        if let Some(name) = ctrl.selection().file.as_ref().map(|f| f.name.clone()) {
            let _ = out_tx.send(OutputLine::Stderr(format!("Enviando {name}…")));
        }
    }

    let snapshot = ctrl.submit().await;

    if args.json {
        let out = serde_json::to_string_pretty(&snapshot)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        for line in crate::text_summary::build_text_summary(&snapshot).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    if let Some(path) = args.export_json.as_deref() {
        export_history(path, ctrl.history())?;
        let _ = out_tx.send(OutputLine::Stderr(export_notice(path)));
    }

    drop(out_tx);
    let _ = out_handle.await;

    Ok(match snapshot.status {
        ProcessingStatus::Success => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let args = Cli::parse_from(["contratos-cli"]);
        assert!(args.is_interactive());
        assert_eq!(args.filter, FilterOption::Audited);
        let cfg = build_config(&args);
        assert_eq!(cfg.timeout, Duration::from_secs(120));
        assert_eq!(cfg.endpoint(), "https://leitorback-2.onrender.com/processar/");
    }

    #[test]
    fn parses_text_mode_options() {
        let args = Cli::parse_from([
            "contratos-cli",
            "--text",
            "--filter",
            "nao-auditado",
            "--timeout",
            "30s",
            "-vv",
            "planilha.xlsx",
        ]);
        assert!(!args.is_interactive());
        assert_eq!(args.filter, FilterOption::NotAudited);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.file, Some(PathBuf::from("planilha.xlsx")));
        assert_eq!(build_config(&args).timeout, Duration::from_secs(30));
    }

    #[test]
    fn json_and_text_conflict() {
        assert!(Cli::try_parse_from(["contratos-cli", "--json", "--text"]).is_err());
    }
}
