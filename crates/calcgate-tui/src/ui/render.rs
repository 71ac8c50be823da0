use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use calcgate_core::{GuardState, Route};

use crate::app::{App, AppState};

use super::styles;
use super::views::{forms, home, notice};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

/// Result of the guard's most recent check
fn session_label(state: GuardState) -> &'static str {
    match state {
        GuardState::Authorized => "signed in",
        GuardState::Unauthorized => "signed out",
        GuardState::Unknown => "checking",
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        "  calcgate · {} ({})",
        app.route.title(),
        session_label(app.guard.state())
    );
    let help_hint = if matches!(app.route, Route::Login | Route::Register) {
        "[Esc] Quit"
    } else {
        "[?] Help"
    };

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + help_hint.len() + 4),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.route {
        Route::Login => forms::render_login(frame, app, area),
        Route::Register => forms::render_register(frame, app, area),
        Route::Home => home::render(frame, app, area),
        Route::Unauthorized => notice::render_unauthorized(frame, area),
        Route::NotFound => notice::render_not_found(frame, area),
    }
}

/// Keys worth showing for the current route
fn shortcuts(route: Route) -> &'static str {
    match route {
        Route::Home => "[=] eval | [c]lear | [g]enerate | [b]alance | [l]ogout | [q]uit",
        Route::Login | Route::Register => "[Tab] next field | [Enter] select",
        Route::Unauthorized | Route::NotFound => "[Enter] continue | [q]uit",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (left_text, left_style) = match app.notifications.latest(Utc::now()) {
        Some(note) => (
            format!(" {} ", note.message),
            styles::notification_style(note.level),
        ),
        None if app.pending > 0 => (" Working... ".to_string(), styles::muted_style()),
        None => (format!(" {} ", app.api.base_url()), styles::muted_style()),
    };
    let right_text = format!(" {} ", shortcuts(app.route));

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 20, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  calcgate", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Calculator", styles::highlight_style())),
        help_line("0-9 .", "Digits and decimal point"),
        help_line("+ - * /", "Operators (x also multiplies)"),
        help_line("r", "Square root (√)"),
        help_line("Enter =", "Evaluate on the server"),
        help_line("c Del", "Clear the display"),
        Line::from(""),
        Line::from(Span::styled(" Account", styles::highlight_style())),
        help_line("g", "Generate a random string"),
        help_line("b", "Refresh balance"),
        help_line("l", "Sign out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_inside_small_area() {
        let r = centered_rect_fixed(60, 14, Rect::new(0, 0, 40, 10));
        assert_eq!(r, Rect::new(0, 0, 40, 10));

        let r = centered_rect_fixed(20, 4, Rect::new(0, 0, 40, 10));
        assert_eq!(r, Rect::new(10, 3, 20, 4));
    }

    #[test]
    fn test_session_label() {
        assert_eq!(session_label(GuardState::Unknown), "checking");
        assert_eq!(session_label(GuardState::Authorized), "signed in");
        assert_eq!(session_label(GuardState::Unauthorized), "signed out");
    }
}
