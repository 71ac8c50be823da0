//! Sign-in and sign-up views.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, CredentialForm, FormFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

/// Visible width of the input fields
const FIELD_WIDTH: usize = 20;

struct FormLabels {
    title: &'static str,
    button: &'static str,
    link_prompt: &'static str,
    link: &'static str,
}

const SIGN_IN: FormLabels = FormLabels {
    title: " Sign in ",
    button: "Sign in",
    link_prompt: "Don't have an account?",
    link: "Sign up",
};

const SIGN_UP: FormLabels = FormLabels {
    title: " Sign up ",
    button: "Sign up",
    link_prompt: "Already have an account?",
    link: "Sign in",
};

pub fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    render_form(frame, &app.login_form, &SIGN_IN, area);
}

pub fn render_register(frame: &mut Frame, app: &App, area: Rect) {
    render_form(frame, &app.register_form, &SIGN_UP, area);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        styles::selected_style()
    } else {
        styles::text_style()
    }
}

/// Last `FIELD_WIDTH` characters so the cursor end stays visible
fn visible_tail(value: &str) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
}

fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(label, styles::muted_style()),
        Span::styled("[", styles::muted_style()),
        Span::styled(
            format!("{:<width$}{}", value, cursor, width = FIELD_WIDTH),
            focus_style(focused),
        ),
        Span::styled("]", styles::muted_style()),
    ])
}

fn error_line(message: Option<&'static str>) -> Line<'static> {
    match message {
        Some(message) => Line::from(Span::styled(
            format!("             {}", message),
            styles::error_style(),
        )),
        None => Line::from(""),
    }
}

fn render_form(frame: &mut Frame, form: &CredentialForm, labels: &FormLabels, area: Rect) {
    let area = centered_rect_fixed(60, 14, area);

    let masked = "*".repeat(form.password.chars().count().min(FIELD_WIDTH));
    let button_focused = form.focus == FormFocus::Button;
    let button = if form.submitting {
        format!("  {}...  ", labels.button)
    } else if button_focused {
        format!(" ▶ {} ◀ ", labels.button)
    } else {
        format!("   {}   ", labels.button)
    };

    let lines = vec![
        Line::from(""),
        field_line(
            "Username: ",
            visible_tail(&form.username),
            form.focus == FormFocus::Username,
        ),
        error_line(form.errors.username),
        field_line("Password: ", masked, form.focus == FormFocus::Password),
        error_line(form.errors.password),
        Line::from(""),
        Line::from(vec![
            Span::raw("                  ["),
            Span::styled(button, focus_style(button_focused)),
            Span::raw("]"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("   "),
            Span::styled(labels.link_prompt, styles::muted_style()),
            Span::raw(" "),
            Span::styled(labels.link, focus_style(form.focus == FormFocus::Link)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "   Tab/↑/↓ move   Enter select   Esc quit",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .title(Span::styled(labels.title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_tail_keeps_end_of_long_input() {
        assert_eq!(visible_tail("short"), "short");
        let long = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(visible_tail(long), "ghijklmnopqrstuvwxyz");
    }
}
