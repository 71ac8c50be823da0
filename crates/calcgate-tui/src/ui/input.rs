//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use calcgate_core::{Key, Route};

use crate::app::{App, AppState, CredentialForm, FormFocus};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match app.route {
        Route::Login | Route::Register => handle_form_input(app, key),
        Route::Home => handle_home_input(app, key),
        Route::Unauthorized | Route::NotFound => handle_notice_input(app, key),
    }
}

/// Which form is on screen
fn active_form(app: &mut App) -> &mut CredentialForm {
    if app.route == Route::Register {
        &mut app.register_form
    } else {
        &mut app.login_form
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit straight from the sign-in screen
            return Ok(true);
        }
        KeyCode::Tab | KeyCode::Down => {
            let form = active_form(app);
            form.focus = form.focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            let form = active_form(app);
            form.focus = form.focus.prev();
        }
        KeyCode::Enter => {
            let focus = active_form(app).focus;
            match focus {
                FormFocus::Username | FormFocus::Password => {
                    let form = active_form(app);
                    form.focus = form.focus.next();
                }
                FormFocus::Button => {
                    if app.route == Route::Register {
                        app.submit_register();
                    } else {
                        app.submit_login();
                    }
                }
                FormFocus::Link => {
                    let target = if app.route == Route::Register {
                        Route::Login
                    } else {
                        Route::Register
                    };
                    app.navigate(target);
                }
            }
        }
        KeyCode::Backspace => active_form(app).pop_char(),
        KeyCode::Char(c) => active_form(app).push_char(c),
        _ => {}
    }
    Ok(false)
}

fn handle_home_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Enter | KeyCode::Char('=') => app.evaluate(),
        KeyCode::Char('c') | KeyCode::Delete | KeyCode::Esc => app.calculator.clear(),
        KeyCode::Char('g') => app.generate_random_string(),
        KeyCode::Char('b') => app.refresh_balance(),
        KeyCode::Char('l') => app.sign_out(),
        KeyCode::Char(c) => {
            if let Some(k) = Key::from_char(c) {
                app.press_key(k);
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_notice_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Enter | KeyCode::Esc => {
            // 401 goes back to sign-in, 404 tries home (the guard decides)
            let target = if app.route == Route::Unauthorized {
                Route::Login
            } else {
                Route::Home
            };
            app.navigate(target);
        }
        _ => {}
    }
    Ok(false)
}
