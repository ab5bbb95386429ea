use crate::app::{AppState, Build, BuildStatus};
use chrono::Utc;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;
    let inner_width = area.width.saturating_sub(2) as usize;

    if state.builds.is_empty() {
        let msg = if state.is_loading {
            "Loading builds…"
        } else {
            "No builds found. Press n to queue one."
        };
        let para = Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::NONE));
        f.render_widget(para, area);
        return;
    }

    // Visible window (scroll)
    let visible_height = area.height as usize;
    let scroll_offset = if state.cursor >= visible_height {
        state.cursor - visible_height + 1
    } else {
        0
    };

    let mut lines: Vec<Line> = Vec::new();
    for (i, build) in state
        .builds
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
    {
        lines.push(render_build_line(
            build,
            i == state.cursor,
            narrow,
            inner_width,
        ));
    }

    let table = Paragraph::new(lines).block(Block::default().borders(Borders::NONE));
    f.render_widget(table, area);
}

pub fn status_color(status: BuildStatus) -> Color {
    match status {
        BuildStatus::Building | BuildStatus::Uploading => Color::Cyan,
        BuildStatus::Succeeded => Color::Green,
        BuildStatus::Queued => Color::DarkGray,
        BuildStatus::Canceled => Color::Yellow,
        BuildStatus::Failed => Color::Red,
        BuildStatus::Unknown => Color::Magenta,
    }
}

/// How long ago the build was created, compact.
fn format_age(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}

fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        s.to_string()
    } else {
        let mut result = String::new();
        let mut width = 0;
        for c in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if width + cw + 1 > max_width {
                result.push('…');
                break;
            }
            result.push(c);
            width += cw;
        }
        result
    }
}

fn render_build_line(
    build: &Build,
    is_selected: bool,
    narrow: bool,
    max_width: usize,
) -> Line<'static> {
    let number = format!("#{}", build.id);
    let status = build.status.label();
    let age = {
        let elapsed = Utc::now().signed_duration_since(build.created_at);
        format_age(elapsed.num_seconds())
    };
    let rev = truncate(&build.rev, 12);

    let prefix_width = 1 + number.len() + 1 + status.len() + 1;
    let suffix_width = if narrow {
        0
    } else {
        rev.len() + 1 + age.len() + 1
    };
    let origin_max = max_width.saturating_sub(prefix_width + suffix_width + 2);
    let origin = truncate(&build.origin, origin_max);

    let select_style = if is_selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", number), Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:<9} ", status),
            Style::default().fg(status_color(build.status)),
        ),
        Span::styled(origin, select_style),
    ];

    if !narrow {
        spans.push(Span::styled(
            format!(" {}", rev),
            Style::default().fg(Color::Blue),
        ));
        spans.push(Span::styled(
            format!(" {}", age),
            Style::default().fg(Color::DarkGray),
        ));
    }

    Line::from(spans)
}
