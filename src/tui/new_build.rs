use crate::app::{AppState, FormField};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let form = &state.form;

    let mut lines = vec![
        Line::from(Span::styled(
            " Queue a new build ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        field_line("origin", &form.origin, form.focus == FormField::Origin),
        field_line("rev", &form.rev, form.focus == FormField::Rev),
        field_line("paths", &form.paths, form.focus == FormField::Paths),
        Line::raw(""),
    ];

    if form.submitting {
        lines.push(Line::from(Span::styled(
            "Submitting…",
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "paths: space-separated nix files, empty for the repo default",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let para = Paragraph::new(lines).block(Block::default().borders(Borders::NONE));
    f.render_widget(para, area);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let value_style = if focused {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::REVERSED)
    } else {
        Style::default().fg(Color::White)
    };
    let shown = if focused {
        format!("{value}█")
    } else if value.is_empty() {
        " ".to_string()
    } else {
        value.to_string()
    };
    Line::from(vec![
        Span::styled(format!("{label:>8}  "), Style::default().fg(Color::DarkGray)),
        Span::styled(shown, value_style),
    ])
}
