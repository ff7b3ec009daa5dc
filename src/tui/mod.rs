mod export;
mod help;
mod state;

use crate::cli::{build_config, Cli};
use crate::engine::ReqwestTransport;
use crate::model::{HistoryEntry, LifecycleEvent, ProcessingStatus};
use crate::orchestrator::{self, LifecycleController, UiCommand};
use crate::presenter;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::{push_wrapped_status_kv, UiState};
use std::path::PathBuf;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const TAB_PROCESS: usize = 0;
const TAB_HISTORY: usize = 1;
const TAB_HELP: usize = 2;

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels keep the UI thread from ever blocking on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<LifecycleEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let cfg = build_config(&args);
    let transport = ReqwestTransport::new(&cfg).context("failed to build HTTP client")?;
    let mut ctrl = LifecycleController::new(transport, &cfg).with_events(event_tx.clone());
    ctrl.set_filter(args.filter);
    if let Some(path) = args.file.clone() {
        let _ = cmd_tx.send(UiCommand::SelectFile(path));
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(event_rx, cmd_tx));

    let res = orchestrator::run_controller(ctrl, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    let history = res?;
    if let Some(path) = args.export_json.as_deref() {
        orchestrator::export_history(path, &history)?;
        eprintln!("{}", orchestrator::export_notice(path));
    }
    Ok(())
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut event_rx: UnboundedReceiver<LifecycleEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; the controller reaches it through events.
    let mut state = UiState::default();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            state.tick = state.tick.wrapping_add(1);
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let Ok(Event::Key(k)) = event::read() else {
            continue;
        };
        if k.kind != KeyEventKind::Press {
            continue;
        }

        if k.modifiers == KeyModifiers::CONTROL && k.code == KeyCode::Char('c') {
            let _ = cmd_tx.send(UiCommand::Quit);
            break Ok(());
        }

        if state.editing_path {
            handle_path_input(&mut state, &cmd_tx, k.code);
            continue;
        }

        match k.code {
            KeyCode::Char('q') => {
                let _ = cmd_tx.send(UiCommand::Quit);
                break Ok(());
            }
            KeyCode::Char('o') => {
                if state.inputs_locked() {
                    state.info = "Aguarde o processamento terminar".into();
                } else {
                    state.tab = TAB_PROCESS;
                    state.editing_path = true;
                    state.info = "Digite o caminho do arquivo e pressione Enter".into();
                }
            }
            KeyCode::Char('f') => {
                if state.inputs_locked() {
                    state.info = "Aguarde o processamento terminar".into();
                } else {
                    let _ = cmd_tx.send(UiCommand::SetFilter(state.filter.next()));
                }
            }
            KeyCode::Enter | KeyCode::Char('p') => {
                if state.tab != TAB_PROCESS {
                    continue;
                }
                if state.inputs_locked() {
                    state.info = "Aguarde o processamento terminar".into();
                } else {
                    let _ = cmd_tx.send(UiCommand::Submit);
                }
            }
            KeyCode::Tab => {
                state.tab = (state.tab + 1) % 3;
                if state.tab == TAB_HISTORY {
                    state.history_selected = 0;
                    state.history_scroll_offset = 0;
                }
            }
            KeyCode::Char('?') => {
                state.tab = TAB_HELP;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if state.tab == TAB_HISTORY && state.history_selected > 0 {
                    state.history_selected -= 1;
                    if state.history_selected < state.history_scroll_offset {
                        state.history_scroll_offset = state.history_selected;
                    }
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if state.tab == TAB_HISTORY
                    && state.history_selected < state.history.len().saturating_sub(1)
                {
                    state.history_selected += 1;
                    let visible = terminal
                        .size()
                        .map(|s| (s.height as usize).saturating_sub(6).max(1))
                        .unwrap_or(20);
                    if state.history_selected >= state.history_scroll_offset + visible {
                        state.history_scroll_offset = state.history_selected + 1 - visible;
                    }
                }
            }
            KeyCode::Char('y') => {
                if state.tab == TAB_HISTORY {
                    state.info = match state.selected_entry().map(export::entry_json) {
                        Some(Ok(text)) => match export::copy_to_clipboard(&text) {
                            Ok(()) => "✓ Registro copiado para a área de transferência".into(),
                            Err(e) => format!("Falha ao copiar: {e:#}"),
                        },
                        Some(Err(e)) => format!("Falha ao copiar: {e:#}"),
                        None => "Histórico vazio".into(),
                    };
                }
            }
            _ => {}
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn handle_path_input(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>, code: KeyCode) {
    match code {
        KeyCode::Enter => {
            state.editing_path = false;
            let path = state.path_input.trim();
            if path.is_empty() {
                state.info = "Nenhum caminho informado".into();
            } else {
                let _ = cmd_tx.send(UiCommand::SelectFile(PathBuf::from(path)));
            }
        }
        KeyCode::Esc => {
            state.editing_path = false;
            state.info.clear();
        }
        KeyCode::Backspace => {
            state.path_input.pop();
        }
        KeyCode::Char(c) => state.path_input.push(c),
        _ => {}
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Processar"),
        Line::from(format!("Histórico ({})", state.history.len())),
        Line::from("Ajuda"),
    ])
    .select(state.tab)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Sistema de Contratos"),
    )
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_PROCESS => draw_process(chunks[1], f, state),
        TAB_HISTORY => draw_history(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn draw_process(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Min(5),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let dim = Style::default().fg(Color::Gray);
    let locked = state.inputs_locked();

    let mut selection = vec![Line::from(vec![
        Span::styled("Arquivo: ", dim),
        match state.filename.as_deref() {
            Some(name) => Span::raw(name.to_string()),
            None => Span::styled("(nenhum)", Style::default().fg(Color::DarkGray)),
        },
    ])];
    if state.editing_path {
        selection.push(Line::from(vec![
            Span::styled("Caminho: ", dim),
            Span::styled(
                format!("{}_", state.path_input),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    selection.push(Line::from(vec![
        Span::styled("Filtro: ", dim),
        Span::raw(state.filter.label()),
    ]));
    let action_style = if locked {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Magenta)
    };
    selection.push(Line::from(vec![
        Span::styled("o", action_style),
        Span::raw(": arquivo  "),
        Span::styled("f", action_style),
        Span::raw(": filtro  "),
        Span::styled("Enter", action_style),
        Span::raw(": processar"),
    ]));
    f.render_widget(
        Paragraph::new(selection).block(Block::default().borders(Borders::ALL).title("Seleção")),
        chunks[0],
    );

    let mut status_label = state.status.label().to_string();
    if locked {
        status_label = format!("{} {}", state.spinner(), status_label);
    }
    let mut status_lines = vec![Line::from(Span::styled(status_label, state.status_style()))];
    if let Some(msg) = state.error_message.as_deref() {
        push_wrapped_status_kv(&mut status_lines, "Erro", msg, chunks[1].width);
    }
    f.render_widget(
        Paragraph::new(status_lines).block(Block::default().borders(Borders::ALL).title("Status")),
        chunks[1],
    );

    let result_lines: Vec<Line> = match (state.status, state.result.as_ref()) {
        (ProcessingStatus::Success, Some(result)) => presenter::present(result)
            .into_iter()
            .map(|field| {
                Line::from(vec![
                    Span::styled(format!("{}: ", field.label), dim),
                    Span::styled(field.value, Style::default().add_modifier(Modifier::BOLD)),
                ])
            })
            .collect(),
        _ => vec![Line::from(Span::styled("-", Style::default().fg(Color::DarkGray)))],
    };
    f.render_widget(
        Paragraph::new(result_lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Resultado do Processamento"),
        ),
        chunks[2],
    );

    f.render_widget(
        Paragraph::new(state.info.clone()).block(Block::default().borders(Borders::ALL).title("Info")),
        chunks[3],
    );
}

fn history_line(entry: &HistoryEntry, selected: bool) -> Line<'static> {
    let marker = if selected { "> " } else { "  " };
    let (outcome, color) = if entry.is_success() {
        ("OK  ", Color::Green)
    } else {
        ("ERRO", Color::Red)
    };
    let rows = entry
        .result()
        .map(|r| {
            r.total_rows
                .map(|n| format!("{n} linhas"))
                .unwrap_or_else(|| format!("{} linhas", presenter::NOT_AVAILABLE))
        })
        .unwrap_or_default();
    let base = if selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(marker, base),
        Span::styled(format!("{}  ", entry.timestamp), base.fg(Color::Gray)),
        Span::styled(outcome, base.fg(color)),
        Span::styled(format!("  {}  [{}]  ", entry.filename, entry.filter.label()), base),
        Span::styled(rows, base),
    ])
}

fn draw_history(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines: Vec<Line> = Vec::new();

    // Header line plus borders.
    let max_items = (area.height as usize).saturating_sub(3);
    let total = state.history.len();
    let current_pos = if total > 0 { state.history_selected + 1 } else { 0 };

    lines.push(Line::from(vec![
        Span::raw(format!("Histórico ({current_pos}/{total}) - ")),
        Span::styled("↑/↓/j/k", Style::default().fg(Color::Magenta)),
        Span::raw(": navegar, "),
        Span::styled("y", Style::default().fg(Color::Magenta)),
        Span::raw(": copiar JSON"),
    ]));

    if total == 0 {
        lines.push(Line::from(Span::styled(
            "Nenhum processamento nesta sessão.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.extend(
        state
            .history
            .iter()
            .enumerate()
            .skip(state.history_scroll_offset)
            .take(max_items)
            .map(|(i, entry)| history_line(entry, i == state.history_selected)),
    );

    if !state.info.is_empty() && state.tab == TAB_HISTORY {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            state.info.clone(),
            Style::default().fg(Color::Gray),
        )));
    }

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Histórico")),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterOption, HistoryOutcome};

    #[test]
    fn path_input_sends_select_on_enter() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState {
            editing_path: true,
            ..Default::default()
        };
        for c in "  /tmp/c.xlsx ".chars() {
            handle_path_input(&mut state, &tx, KeyCode::Char(c));
        }
        handle_path_input(&mut state, &tx, KeyCode::Backspace);
        handle_path_input(&mut state, &tx, KeyCode::Enter);

        assert!(!state.editing_path);
        match rx.try_recv() {
            Ok(UiCommand::SelectFile(p)) => assert_eq!(p, PathBuf::from("/tmp/c.xlsx")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn empty_path_sends_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState {
            editing_path: true,
            ..Default::default()
        };
        handle_path_input(&mut state, &tx, KeyCode::Enter);
        assert!(rx.try_recv().is_err());
        assert!(!state.editing_path);
    }

    #[test]
    fn history_line_marks_outcome() {
        let entry = HistoryEntry {
            id: 1,
            filename: "a.xlsx".into(),
            filter: FilterOption::Audited,
            timestamp: "15/10/2026, 09:00:00".into(),
            outcome: HistoryOutcome::Error,
        };
        let text: String = history_line(&entry, false)
            .spans
            .iter()
            .map(|s| s.content.to_string())
            .collect();
        assert!(text.contains("ERRO"));
        assert!(text.contains("a.xlsx"));
    }
}
