// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks)
// - Turning key presses into page events

pub mod app;
pub mod host;
pub mod modal;
pub mod ui;

use crate::config::Config;
use crate::logging::LogBuffer;
use crate::registry::SharedTransport;
use anyhow::{Context, Result};
use app::App;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use modal::{Modal, ModalAction};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

/// Lines moved by PageUp / PageDown
const PAGE_SCROLL: u16 = 10;

/// Run the interactive lookup page
///
/// Sets up the terminal, runs the event loop, and restores the terminal
/// even when the loop fails. If the page navigated away, the target URL is
/// printed once the screen is back to normal.
pub async fn run_tui(
    transport: SharedTransport,
    log_buffer: LogBuffer,
    config: &Config,
    endpoint: &str,
) -> Result<()> {
    let mut app = App::new(
        transport,
        config.page_settings(),
        log_buffer,
        endpoint,
        config.demo_mode,
    )
    .context("Failed to mount lookup page")?;

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = run_event_loop(&mut terminal, &mut app).await;

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    if let Some(url) = &app.leave_to {
        println!("Leaving for {}", url);
    }

    result
}

/// Main event loop
///
/// Waits on keyboard input and a redraw tick. Page requests run as their own
/// tasks and land in the display region, which `sync` picks up each pass.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(150));

    loop {
        app.sync();
        if app.should_quit {
            break;
        }

        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    if let Ok(Event::Key(key_event)) = event::read() {
                        handle_key_event(app, key_event);
                    }
                }
            } => {}

            _ = tick_interval.tick() => {
                app.tick_animation();
            }
        }
    }

    Ok(())
}

/// Handle keyboard input
/// Layered dispatch: Modal → Global → Page
fn handle_key_event(app: &mut App, key_event: KeyEvent) {
    if key_event.kind != KeyEventKind::Press {
        return;
    }

    if handle_modal_input(app, &key_event) {
        return;
    }

    if handle_global_keys(app, &key_event) {
        return;
    }

    match key_event.code {
        KeyCode::Char(c) => app.type_char(c),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Esc => app.clear_query(),
        KeyCode::Down => app.select_next(),
        KeyCode::Up => app.select_prev(),
        KeyCode::PageDown => app.scroll = app.scroll.saturating_add(PAGE_SCROLL),
        KeyCode::PageUp => app.scroll = app.scroll.saturating_sub(PAGE_SCROLL),
        KeyCode::Enter => app.open_selected(),
        _ => {}
    }
}

/// Handle modal input - returns true if modal absorbed the input
fn handle_modal_input(app: &mut App, key_event: &KeyEvent) -> bool {
    let Some(ref mut modal) = app.modal else {
        return false;
    };

    match modal.handle_input(key_event.code) {
        ModalAction::None => {}
        ModalAction::Close => app.modal = None,
    }
    true
}

/// Handle global keys - returns true if handled
fn handle_global_keys(app: &mut App, key_event: &KeyEvent) -> bool {
    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);

    match key_event.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
            app.should_quit = true;
            true
        }
        KeyCode::Char('l') if ctrl => {
            app.list_all();
            true
        }
        KeyCode::Char('r') if ctrl => {
            app.return_to_site();
            true
        }
        KeyCode::F(1) => {
            app.modal = Some(Modal::Help);
            true
        }
        // Other control chords never reach the search box
        KeyCode::Char(_) if ctrl => true,
        _ => false,
    }
}
