//! calcgate - a terminal client for the calculator gateway.
//!
//! Sign in or sign up, then use the keypad to send expressions to the
//! gateway for evaluation, check the account balance and generate random
//! strings. A few flags run the same flows without the TUI.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use calcgate_core::auth::flow;
use calcgate_core::{
    ApiClient, Calculator, Config, Credentials, GuardState, Level, Notifications, Route,
    RouteGuard,
};

use app::{open_session_store, App, AppState, StartOptions};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name in the data directory
const LOG_FILE_PREFIX: &str = "calcgate";
const LOG_FILE_SUFFIX: &str = "log";

const USAGE: &str = "\
Usage: calcgate [OPTIONS]

Options:
  --route <path>       Open at a route (/, /register, /home, /error)
  --login              Sign in from the terminal prompt and exit
  --logout             Forget the stored session and exit
  --eval <expression>  Evaluate an expression with the stored session
  --ephemeral          Keep the session in memory only
  -h, --help           Show this help";

/// What the command line asked for
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Tui { route: Option<Route> },
    Login,
    Logout,
    Eval(String),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cli {
    command: Command,
    ephemeral: bool,
}

fn parse_args<I>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut command = None;
    let mut route = None;
    let mut ephemeral = false;

    while let Some(arg) = args.next() {
        let next = match arg.as_str() {
            "--route" => {
                let path = args.next().context("--route needs a path")?;
                route = Some(Route::from_path(&path));
                continue;
            }
            "--ephemeral" => {
                ephemeral = true;
                continue;
            }
            "--login" => Command::Login,
            "--logout" => Command::Logout,
            "--eval" => Command::Eval(args.next().context("--eval needs an expression")?),
            "-h" | "--help" => Command::Help,
            other => bail!("Unknown argument: {}\n\n{}", other, USAGE),
        };
        if command.replace(next).is_some() {
            bail!("Only one of --login, --logout, --eval may be given");
        }
    }

    let command = command.unwrap_or(Command::Tui { route });
    if ephemeral && matches!(command, Command::Login | Command::Eval(_)) {
        // An in-memory session ends with the process
        bail!("--ephemeral cannot be combined with --login or --eval");
    }

    Ok(Cli { command, ephemeral })
}

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the TUI, so logs go to a file in the data
/// directory. Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = std::fs::create_dir_all(log_dir)
        .map_err(anyhow::Error::from)
        .and_then(|_| {
            RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix(LOG_FILE_SUFFIX)
                .build(log_dir)
                .map_err(anyhow::Error::from)
        });

    match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        Err(e) => {
            // No log file; stay quiet rather than draw over the TUI
            eprintln!("calcgate: logging disabled ({})", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = parse_args(std::env::args().skip(1))?;

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("calcgate: using default config ({})", e);
        Config::default()
    });
    let log_dir = config.data_dir().unwrap_or_else(|_| PathBuf::from("./data"));
    let _log_guard = init_tracing(&log_dir);

    match cli.command {
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        Command::Logout => logout(&config, cli.ephemeral),
        Command::Login => login_interactive(config, cli.ephemeral).await,
        Command::Eval(expression) => eval_headless(&config, cli.ephemeral, expression).await,
        Command::Tui { route } => run_tui(route, cli.ephemeral).await,
    }
}

async fn run_tui(route: Option<Route>, ephemeral: bool) -> Result<()> {
    info!("calcgate starting");

    // Create app before touching the terminal so config errors print normally
    let mut app = App::new(&StartOptions { ephemeral })?;
    app.start(route);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("calcgate shutting down");
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Apply finished requests, re-check expiry
        app.tick();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// Headless commands
// ============================================================================

fn logout(config: &Config, ephemeral: bool) -> Result<()> {
    let mut session = open_session_store(config, ephemeral);
    let mut notifications = Notifications::new();
    flow::sign_out(&mut session, &mut notifications);
    println!("Signed out");
    Ok(())
}

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let value = line.trim().to_string();
    Ok(match (value.is_empty(), default) {
        (true, Some(d)) => d.to_string(),
        _ => value,
    })
}

/// Print toasts collected by a headless flow
fn report(notifications: &Notifications) {
    for note in notifications.iter() {
        match note.level {
            Level::Error => eprintln!("{}", note.message),
            Level::Success | Level::Info => println!("{}", note.message),
        }
    }
}

async fn login_interactive(mut config: Config, ephemeral: bool) -> Result<()> {
    let username = prompt("Username", config.last_username.as_deref())?;
    let password = rpassword::prompt_password("Password: ")?;

    let credentials = match Credentials::validate(&username, &password) {
        Ok(c) => c,
        Err(errors) => bail!("{}", errors),
    };

    let api = ApiClient::new(&config.api_url, config.request_timeout())?;
    let mut session = open_session_store(&config, ephemeral);
    let mut notifications = Notifications::new();

    let next = flow::sign_in(&api, &mut session, &mut notifications, &credentials).await;
    report(&notifications);
    if next.is_none() {
        bail!("Login failed");
    }

    config.last_username = Some(credentials.user_name.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

async fn eval_headless(config: &Config, ephemeral: bool, expression: String) -> Result<()> {
    let mut session = open_session_store(config, ephemeral);

    // Same check the guard does before showing the calculator
    if RouteGuard::new(0).check(&mut session, Utc::now()) != GuardState::Authorized {
        bail!("Not signed in or session expired; run calcgate --login first");
    }
    let Some(token) = session.token().map(str::to_string) else {
        bail!("Not signed in; run calcgate --login first");
    };

    let api = ApiClient::new(&config.api_url, config.request_timeout())?.with_token(token);
    let mut notifications = Notifications::new();
    let mut calculator = Calculator::with_display(expression);

    let result = calculator.submit(&api, &session, &mut notifications).await;
    report(&notifications);
    match result {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => bail!("Operation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_starts_tui() {
        let cli = parse_args(args(&[])).unwrap();
        assert_eq!(cli.command, Command::Tui { route: None });
        assert!(!cli.ephemeral);
    }

    #[test]
    fn test_route_and_ephemeral() {
        let cli = parse_args(args(&["--ephemeral", "--route", "/home"])).unwrap();
        assert_eq!(
            cli.command,
            Command::Tui {
                route: Some(Route::Home)
            }
        );
        assert!(cli.ephemeral);

        let cli = parse_args(args(&["--route", "/nope"])).unwrap();
        assert_eq!(
            cli.command,
            Command::Tui {
                route: Some(Route::NotFound)
            }
        );
    }

    #[test]
    fn test_eval_takes_expression() {
        let cli = parse_args(args(&["--eval", "√9+1"])).unwrap();
        assert_eq!(cli.command, Command::Eval("√9+1".to_string()));
    }

    #[test]
    fn test_bad_args_are_errors() {
        assert!(parse_args(args(&["--eval"])).is_err());
        assert!(parse_args(args(&["--route"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["--login", "--logout"])).is_err());
    }

    #[test]
    fn test_ephemeral_only_with_tui_or_logout() {
        assert!(parse_args(args(&["--ephemeral", "--login"])).is_err());
        assert!(parse_args(args(&["--eval", "1+1", "--ephemeral"])).is_err());

        let cli = parse_args(args(&["--ephemeral", "--logout"])).unwrap();
        assert_eq!(cli.command, Command::Logout);
        assert!(cli.ephemeral);
    }
}
