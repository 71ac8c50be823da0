use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

pub fn render_unauthorized(frame: &mut Frame, area: Rect) {
    render_notice(
        frame,
        area,
        " 401 ",
        "Your session has expired or you are not signed in.",
        "Press Enter to sign in",
    );
}

pub fn render_not_found(frame: &mut Frame, area: Rect) {
    render_notice(
        frame,
        area,
        " 404 ",
        "There is nothing at this address.",
        "Press Enter to go home",
    );
}

fn render_notice(frame: &mut Frame, area: Rect, title: &str, message: &str, action: &str) {
    let area = centered_rect_fixed(60, 7, area);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), styles::highlight_style())),
        Line::from(""),
        Line::from(Span::styled(action.to_string(), styles::muted_style())),
    ];
    let block = Block::default()
        .title(Span::styled(title.to_string(), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}
