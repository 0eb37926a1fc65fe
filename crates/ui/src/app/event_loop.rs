use super::App;
use crate::event_handler::EventHandler;

use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::Result;
use std::{panic, time::Duration};
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(30);

/// Run the TUI until the user quits.
///
/// Terminal events arrive from a reader thread, so they are picked up even while stream updates
/// keep the other branches busy. Redraws after every terminal event, every change published by
/// the history store, the settings context or the orchestrator status, and whenever the visible
/// notice expires.
pub async fn run(app: &mut App) -> Result<()> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), EnterAlternateScreen, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let backend = CrosstermBackend::new(std::io::stdout());
        if let Ok(mut terminal) = Terminal::new(backend) {
            let _ = terminal.show_cursor();
        }
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(std::io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut events = EventHandler::spawn_reader(POLL_INTERVAL)?;
    let mut histories_rx = app.orchestrator().histories().subscribe();
    let mut settings_rx = app.orchestrator().settings().subscribe();
    let mut status_rx = app.orchestrator().subscribe_status();

    terminal.clear()?;
    app.refresh();
    app.draw(&mut terminal)?;

    while !app.should_exit() {
        let notice_deadline = app.state().notice.as_ref().map(|n| Instant::from_std(n.expires_at));
        let notice_expiry = async {
            match notice_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            Some(event) = events.next() => {
                app.handle_event(event);
                app.draw(&mut terminal)?;
            }
            Ok(()) = histories_rx.changed() => {
                app.refresh();
                app.draw(&mut terminal)?;
            }
            Ok(()) = settings_rx.changed() => {
                app.refresh();
                app.draw(&mut terminal)?;
            }
            Ok(()) = status_rx.changed() => {
                app.refresh();
                app.draw(&mut terminal)?;
            }
            _ = notice_expiry => {
                if app.state_mut().expire_notice(std::time::Instant::now()) {
                    app.draw(&mut terminal)?;
                }
            }
        }
    }

    app.orchestrator().cancel();
    drop(events);

    terminal.show_cursor()?;
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), DisableBracketedPaste, LeaveAlternateScreen)?;

    Ok(())
}
