//! Home view: balance, random string and the calculator keypad.

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

/// Keypad rows as shown on screen, with the key that types each symbol
const KEYPAD: [[(&str, char); 4]; 5] = [
    [("7", '7'), ("8", '8'), ("9", '9'), ("÷", '/')],
    [("4", '4'), ("5", '5'), ("6", '6'), ("×", '*')],
    [("1", '1'), ("2", '2'), ("3", '3'), ("-", '-')],
    [("0", '0'), (".", '.'), ("√", 'r'), ("+", '+')],
    [("C", 'c'), ("=", '='), ("", ' '), ("", ' ')],
];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_account(frame, app, columns[0]);
    render_calculator(frame, app, columns[1]);
}

/// Time left on the token, rounded down to minutes once past one
fn expiry_display(seconds: i64) -> String {
    match seconds {
        s if s < 0 => "expired".to_string(),
        s if s < 60 => format!("expires in {}s", s),
        s if s < 3600 => format!("expires in {}m", s / 60),
        s => format!("expires in {}h {}m", s / 3600, (s % 3600) / 60),
    }
}

fn render_account(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(5)])
        .split(area);

    let user = app
        .session
        .user_id()
        .map(|id| format!("user #{}", id))
        .unwrap_or_else(|| "-".to_string());
    let expiry = app
        .session_expires_in(Utc::now())
        .map(expiry_display)
        .unwrap_or_else(|| "-".to_string());
    let balance = vec![
        Line::from(vec![
            Span::styled(" Balance: ", styles::muted_style()),
            Span::styled(app.dashboard.balance_display(), styles::display_style()),
            Span::styled(format!("   ({})", user), styles::muted_style()),
        ]),
        Line::from(Span::styled(
            format!(" Session: {}", expiry),
            styles::muted_style(),
        )),
    ];
    let block = Block::default()
        .title(Span::styled(" Account ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(balance).block(block), rows[0]);

    let random = match app.dashboard.random_string.as_deref() {
        Some(value) => Line::from(Span::styled(value.to_string(), styles::highlight_style())),
        None => Line::from(Span::styled(
            "Press [g] to generate",
            styles::muted_style(),
        )),
    };
    let block = Block::default()
        .title(Span::styled(" Random string ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(
        Paragraph::new(random)
            .block(block)
            .wrap(Wrap { trim: false }),
        rows[1],
    );
}

fn render_calculator(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(7)])
        .split(area);

    let block = Block::default()
        .title(Span::styled(" Calculator ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    let display = Paragraph::new(Span::styled(
        app.calculator.display().to_string(),
        styles::display_style(),
    ))
    .alignment(Alignment::Right)
    .block(block);
    frame.render_widget(display, rows[0]);

    let mut lines: Vec<Line> = Vec::with_capacity(KEYPAD.len() * 2);
    for row in KEYPAD.iter() {
        let mut spans = vec![Span::raw(" ")];
        for (label, key) in row.iter() {
            if label.is_empty() {
                continue;
            }
            spans.push(Span::styled(format!("[ {:^3} ]", label), styles::text_style()));
            spans.push(Span::styled(format!("{} ", key), styles::muted_style()));
        }
        lines.push(Line::from(spans));
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), rows[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_display() {
        assert_eq!(expiry_display(-1), "expired");
        assert_eq!(expiry_display(0), "expires in 0s");
        assert_eq!(expiry_display(59), "expires in 59s");
        assert_eq!(expiry_display(125), "expires in 2m");
        assert_eq!(expiry_display(7_260), "expires in 2h 1m");
    }
}
