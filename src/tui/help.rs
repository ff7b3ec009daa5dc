use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(desc),
    ])
}

fn help_lines() -> Vec<Line<'static>> {
    vec![
        Line::from("Teclas:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Sair"),
        ]),
        key_line("o", 11, "Escolher arquivo (digite o caminho, Enter confirma, Esc cancela)"),
        key_line("f", 11, "Trocar filtro"),
        key_line("Enter / p", 3, "Processar arquivo"),
        key_line("tab", 9, "Trocar aba"),
        key_line("?", 11, "Mostrar esta ajuda"),
        Line::from(""),
        Line::from("Aba Histórico:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("↑/↓", Style::default().fg(Color::Magenta)),
            Span::raw(" ou "),
            Span::styled("j/k", Style::default().fg(Color::Magenta)),
            Span::raw("  Navegar"),
        ]),
        key_line("y", 11, "Copiar registro selecionado como JSON"),
        Line::from(""),
        Line::from("Arquivo, filtro e processamento ficam bloqueados durante o envio."),
        Line::from("O histórico existe apenas nesta sessão (use --export-json para salvar)."),
    ]
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(help_lines())
        .block(Block::default().borders(Borders::ALL).title("Ajuda"));
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered() -> Vec<String> {
        help_lines()
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn lists_both_submit_keys() {
        assert!(rendered()
            .iter()
            .any(|l| l.contains("Enter / p") && l.contains("Processar arquivo")));
    }

    #[test]
    fn history_navigation_is_in_portuguese() {
        let lines = rendered();
        assert!(lines.iter().any(|l| l.contains("↑/↓ ou j/k")));
        assert!(!lines.iter().any(|l| l.contains(" or ")));
    }
}
