pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::{resolve_theme, ThemeColors};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};
use tracing::debug;

use crate::store::{DocumentSource, SnapshotCache};
use crate::watch::{BoardWatch, ContestWatch};

pub async fn run_tui<S: DocumentSource>(
    mut app: App,
    source: S,
    cache: SnapshotCache,
) -> anyhow::Result<()> {
    // Buffer log lines while the TUI owns the terminal
    crate::logging::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();

    // 250ms tick drives the countdown, spinner and flash expiry
    let mut events = EventHandler::new(250);

    let mut board_watch: Option<BoardWatch> = None;
    let mut contest_watch: Option<ContestWatch> = None;

    loop {
        // Restart watches the app asked for. Dropping the old watch cancels
        // its subscriptions; anything it already queued carries an older
        // generation and is dropped by the app.
        if app.needs_contest_watch {
            app.needs_contest_watch = false;
            contest_watch = Some(ContestWatch::start(
                &source,
                app.board(),
                app.contest_generation,
                &cache,
                events.sender(),
            ));
        }
        if app.needs_watch {
            app.needs_watch = false;
            board_watch = None;
            if app.context().contest != crate::board::NO_CONTEST {
                board_watch = Some(BoardWatch::start(
                    &source,
                    app.context().clone(),
                    app.generation,
                    &cache,
                    events.sender(),
                ));
            }
        }

        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        match events.next().await {
            Event::Key(key) => handle_key_event(&mut app, key),
            Event::Tick => {
                app.update_flash();
                app.advance_spinner();
            }
            Event::Resize => {}
            Event::Store(update) => {
                app.apply_update(update);
            }
        }

        if app.should_quit {
            break;
        }
    }

    if let Some(watch) = &board_watch {
        debug!(contest = %watch.context().contest, "Stopping watch");
    }
    if let Some(watch) = &contest_watch {
        debug!(board = watch.board(), "Stopping contest watch");
    }
    drop(board_watch);
    drop(contest_watch);

    ratatui::restore();

    // Flush buffered log lines now that the terminal is restored
    for msg in crate::logging::drain() {
        eprintln!("{}", msg);
    }

    Ok(())
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    match app.input_mode {
        app::InputMode::Normal => match key.code {
            // Quit
            KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.should_quit = true
            }

            // Navigation
            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),

            // Open profile in browser
            KeyCode::Enter | KeyCode::Char('o') => app.open_selected(),

            // Contest picker
            KeyCode::Char('c') => app.open_picker(),

            // Board switching
            KeyCode::Tab => app.cycle_board(true),
            KeyCode::BackTab => app.cycle_board(false),

            // Re-subscribe from scratch
            KeyCode::Char('r') => app.reconnect(),

            // Help
            KeyCode::Char('?') => app.show_help(),

            _ => {}
        },
        app::InputMode::ContestPicker => match key.code {
            KeyCode::Enter => app.confirm_picker(),
            KeyCode::Esc | KeyCode::Char('q') => app.cancel_picker(),
            KeyCode::Char('j') | KeyCode::Down => app.picker_next(),
            KeyCode::Char('k') | KeyCode::Up => app.picker_previous(),
            _ => {}
        },
        app::InputMode::Help => {
            // Any key exits help
            app.dismiss_help();
        }
    }
}
