use crate::app::{AppState, BuildDetail};
use crate::tail::{TailStatus, DISCONNECT_NOTICE};
use crate::tui::spinner;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let Some(detail) = &state.detail else {
        let para = Paragraph::new("Loading build…")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::NONE));
        f.render_widget(para, area);
        return;
    };

    let meta_height = meta_line_count(detail) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(meta_height), Constraint::Min(3)])
        .split(area);

    render_meta(f, chunks[0], detail);
    render_tail(f, chunks[1], state, detail);
}

fn meta_line_count(detail: &BuildDetail) -> usize {
    // build header, origin, rev, created, finished/status, blank
    let mut n = 6;
    if detail.build.error_msg.is_some() {
        n += 1;
    }
    n += detail
        .inputs
        .iter()
        .map(|input| 1 + input.outputs.len())
        .sum::<usize>();
    n
}

fn render_meta(f: &mut Frame, area: Rect, detail: &BuildDetail) {
    let build = &detail.build;
    let status_style = Style::default()
        .fg(crate::tui::table::status_color(build.status))
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" Build #{} ", build.id),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(build.status.label(), status_style),
        ]),
        meta_line("origin", &build.origin),
        meta_line("rev", &build.rev),
        meta_line(
            "created",
            &build.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
        match build.finished_at {
            Some(finished) => meta_line(
                "finished",
                &finished.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
            None => meta_line("finished", "-"),
        },
    ];

    if let Some(err) = &build.error_msg {
        lines.push(Line::from(vec![
            Span::styled("   error  ", Style::default().fg(Color::DarkGray)),
            Span::styled(err.clone(), Style::default().fg(Color::Red)),
        ]));
    }

    for input in &detail.inputs {
        lines.push(Line::from(vec![
            Span::styled("   input  ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                input.path.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]));
        for output in &input.outputs {
            lines.push(Line::from(vec![
                Span::raw("          "),
                Span::styled(
                    format!("{:<14} ", output.system),
                    Style::default().fg(Color::Blue),
                ),
                Span::styled(output.store_path.clone(), Style::default().fg(Color::Green)),
            ]));
        }
    }

    lines.push(Line::raw(""));

    let para = Paragraph::new(lines).block(Block::default().borders(Borders::NONE));
    f.render_widget(para, area);
}

fn meta_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:>8}  "), Style::default().fg(Color::DarkGray)),
        Span::styled(value.to_string(), Style::default().fg(Color::White)),
    ])
}

fn render_tail(f: &mut Frame, area: Rect, state: &AppState, detail: &BuildDetail) {
    let title = format!(
        " Last {} lines of log ({}) ",
        detail.tail.capacity(),
        state.raw_log_url(detail.build.id),
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let para = match detail.tail.status() {
        TailStatus::Loading => Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{} ", spinner::frame(state.spinner_frame)),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled("Waiting for log…", Style::default().fg(Color::DarkGray)),
        ]))
        .block(block),
        TailStatus::Disconnected => Paragraph::new(DISCONNECT_NOTICE)
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(block),
        TailStatus::Streaming => {
            let mut lines: Vec<Line> = detail
                .tail
                .completed_lines()
                .map(|l| Line::raw(l.to_string()))
                .collect();
            if !detail.tail.partial_line().is_empty() {
                lines.push(Line::styled(
                    detail.tail.partial_line().to_string(),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            // Pin to the bottom when the log outgrows the pane
            let inner_height = area.height.saturating_sub(1) as usize;
            let scroll = lines.len().saturating_sub(inner_height) as u16;
            Paragraph::new(lines).scroll((scroll, 0)).block(block)
        }
    };

    f.render_widget(para, area);
}
