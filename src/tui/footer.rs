use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, View};

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;

    let hints: &[(&str, &str)] = match state.view {
        View::NewBuild => &[
            ("Tab", "next field"),
            ("Enter", "submit"),
            ("Esc", "cancel"),
        ],
        View::Detail if state.can_restart() => &[
            ("R", "restart"),
            ("o", "raw log"),
            ("r", "refresh"),
            ("q/Esc", "back"),
        ],
        View::Detail => &[("o", "raw log"), ("r", "refresh"), ("q/Esc", "back")],
        View::Builds if narrow => &[
            ("j/k", "nav"),
            ("Enter", "open"),
            ("n", "new"),
            ("r", "refresh"),
            ("q", "quit"),
        ],
        View::Builds => &[
            ("↑↓/jk", "navigate"),
            ("→/l/Enter", "open build"),
            ("n", "new build"),
            ("r", "refresh"),
            ("q", "quit"),
        ],
    };

    // Notification display
    let line = if let Some(notif) = state.notifications.last() {
        Line::from(vec![
            Span::styled("★ ", Style::default().fg(Color::Yellow)),
            Span::styled(&notif.message, Style::default().fg(Color::Yellow)),
        ])
    } else {
        let mut spans: Vec<Span> = Vec::new();
        for (i, (key, desc)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::styled(
                format!(" {}", desc),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}
