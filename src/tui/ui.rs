// UI rendering logic
//
// One screen, drawn every frame from App state:
// - Title bar (demo badge, endpoint)
// - Search box
// - Content: listing rows, detail text, or the page's status messages
// - System logs
// - Key hints

use super::app::App;
use super::modal::Modal;
use crate::logging::{LogEntry, LogLevel};
use crate::markup;
use crate::page::DisplayContent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Main UI render function - called on every frame
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Search box
            Constraint::Min(5),    // Content
            Constraint::Length(6), // System logs
            Constraint::Length(1), // Key hints
        ])
        .split(f.area());

    render_title(f, chunks[0], app);
    render_search(f, chunks[1], app);
    render_content(f, chunks[2], app);
    render_logs_panel(f, chunks[3], app);
    render_status(f, chunks[4], app);

    if let Some(modal) = &app.modal {
        render_modal(f, modal);
    }
}

fn render_title(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        " Utah HOA Registry",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if app.demo {
        spans.push(Span::styled(
            " [DEMO]",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        format!(" ──── {}", app.endpoint),
        Style::default().fg(Color::DarkGray),
    ));

    let title = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title_top(Line::from(" F1 ").right_aligned()),
    );
    f.render_widget(title, area);
}

fn render_search(f: &mut Frame, area: Rect, app: &App) {
    let border = if app.search_focused() && app.modal.is_none() {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let input = Paragraph::new(app.query.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Search by name or registration # "),
    );
    f.render_widget(input, area);

    if app.search_focused() && app.modal.is_none() {
        let x = area.x + 1 + app.query.width() as u16;
        f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn render_content(f: &mut Frame, area: Rect, app: &App) {
    if !app.rows.is_empty() {
        render_rows(f, area, app);
        return;
    }

    let block = Block::default().borders(Borders::ALL);
    match app.display.content() {
        DisplayContent::Empty => {
            let hint = Paragraph::new("Type to search, or press Ctrl+L to list every HOA.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(hint, area);
        }
        DisplayContent::Loading(message) => {
            let text = format!("{} {}", app.spinner_char(), message);
            let loading = Paragraph::new(text)
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            f.render_widget(loading, area);
        }
        DisplayContent::Notice(message) => {
            let notice = Paragraph::new(message)
                .style(Style::default().add_modifier(Modifier::ITALIC))
                .wrap(Wrap { trim: true })
                .block(block);
            f.render_widget(notice, area);
        }
        DisplayContent::Html(html) => {
            let text = markup::to_display_text(&html);
            let detail = Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .scroll((app.scroll, 0))
                .block(block.title(" Details (Esc to clear, ↑/↓ scroll) "));
            f.render_widget(detail, area);
        }
        DisplayContent::Error { message, payload } => {
            let mut lines = vec![Line::from(Span::styled(
                message,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))];
            if let Some(payload) = payload {
                lines.push(Line::default());
                lines.extend(
                    markup::to_display_text(&payload)
                        .lines()
                        .map(|l| Line::from(l.to_string())),
                );
            }
            let error = Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((app.scroll, 0))
                .block(
                    block
                        .border_style(Style::default().fg(Color::Red))
                        .title(" Request failed "),
                );
            f.render_widget(error, area);
        }
    }
}

fn render_rows(f: &mut Frame, area: Rect, app: &App) {
    let name_width = (area.width.saturating_sub(16) as usize).max(8);
    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| {
            let pid = row.pid.as_deref().unwrap_or("?");
            ListItem::new(Line::from(vec![
                Span::raw(fit_width(&row.name, name_width)),
                Span::styled(format!(" #{}", pid), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let title = format!(" {} HOAs (Enter to view) ", app.rows.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(app.selected);
    f.render_stateful_widget(list, area, &mut state);
}

/// Pad or truncate `s` to exactly `width` terminal columns
fn fit_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        let pad = width - s.width();
        return format!("{}{}", s, " ".repeat(pad));
    }

    let mut out = String::new();
    let mut used = 0;
    let budget = width.saturating_sub(1);
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

pub fn render_logs_panel(f: &mut Frame, area: Rect, app: &App) {
    let height = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .log_buffer
        .recent(height)
        .iter()
        .map(|entry| ListItem::new(format_log_entry(entry)).style(log_level_style(&entry.level)))
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" System Logs "),
    );
    f.render_widget(list, area);
}

fn format_log_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] {:5} {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.level.as_str(),
        entry.message
    )
}

fn log_level_style(level: &LogLevel) -> Style {
    match level {
        LogLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        LogLevel::Warn => Style::default().fg(Color::Yellow),
        LogLevel::Info => Style::default().fg(Color::Blue),
        LogLevel::Debug => Style::default().fg(Color::Gray),
        LogLevel::Trace => Style::default().fg(Color::DarkGray),
    }
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let mut hints = String::from(" type to search │ ↑/↓ select │ Enter view │ Ctrl+L list all");
    if let Some(label) = app.return_label() {
        hints.push_str(&format!(" │ Ctrl+R {}", label));
    }
    hints.push_str(" │ F1 help │ Ctrl+C quit");

    let status = Paragraph::new(hints).style(Style::default().fg(Color::DarkGray));
    f.render_widget(status, area);
}

fn render_modal(f: &mut Frame, modal: &Modal) {
    let (width, height, body, border) = match modal {
        Modal::Help => (60, 14, help_lines(), Color::Cyan),
        Modal::Alert(message) => (
            50,
            7,
            vec![
                Line::from(message.as_str()),
                Line::default(),
                Line::from(Span::styled(
                    "Press Enter to continue",
                    Style::default().fg(Color::DarkGray),
                )),
            ],
            Color::Red,
        ),
    };

    let area = centered_rect(width, height, f.area());
    f.render_widget(Clear, area);
    let popup = Paragraph::new(body).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(modal.title()),
    );
    f.render_widget(popup, area);
}

fn help_lines() -> Vec<Line<'static>> {
    let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    [
        ("any text", "search as you type"),
        ("Backspace", "edit the search"),
        ("Esc", "clear the search"),
        ("↑ / ↓", "move selection or scroll"),
        ("PgUp / PgDn", "scroll details"),
        ("Enter", "view the selected HOA"),
        ("Ctrl+L", "list every HOA"),
        ("Ctrl+R", "return to the HOA website"),
        ("Ctrl+C", "quit"),
    ]
    .into_iter()
    .map(|(k, what)| Line::from(vec![Span::styled(format!("{:>12}  ", k), key), Span::raw(what)]))
    .collect()
}

/// Fixed-size rect centered in `area`, clamped to fit
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_width_pads_and_truncates_by_columns() {
        assert_eq!(fit_width("Oak", 6), "Oak   ");
        assert_eq!(fit_width("Canyon View Estates", 8), "Canyon …");
        assert_eq!(fit_width("Café Ridge", 10), "Café Ridge");
        assert_eq!(fit_width("Café Ridge", 10).width(), 10);
    }

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_rect(60, 14, area), area);
        assert_eq!(centered_rect(20, 4, area), Rect::new(10, 3, 20, 4));
    }
}
