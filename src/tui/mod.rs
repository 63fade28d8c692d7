mod app;
mod event;
mod render;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self as ct_event, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use log::info;
use ratatui::prelude::*;

use crate::session::{BoardCommand, DocumentSession, HostEvent};
use crate::watch;
use app::App;
use event::KeyAction;

pub fn run(session: &mut DocumentSession, poll_interval: u64) -> Result<()> {
    let mut app = App::new(session.board());

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, session, poll_interval);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    session: &mut DocumentSession,
    poll_interval: u64,
) -> Result<()> {
    let poll_duration = Duration::from_millis(poll_interval);

    let (_watcher, rx) = watch::watch_file(session.path(), session.guard())?;

    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if ct_event::poll(poll_duration)? {
            if let Event::Key(key) = ct_event::read()? {
                if key.kind == KeyEventKind::Press {
                    match event::handle_key(app, key) {
                        KeyAction::Quit => return Ok(()),
                        KeyAction::Rebuild => app.refresh(session.board()),
                        KeyAction::Reload => {
                            let events = session.on_file_changed();
                            apply_events(app, session, &events);
                            if app.error.is_none() {
                                app.status = Some("reloaded".into());
                            }
                        }
                        KeyAction::Command(cmd) => {
                            if let BoardCommand::Move { card_id, .. } = &cmd {
                                app.focus_after_refresh(card_id.clone());
                            }
                            let events = session.handle(&cmd);
                            apply_events(app, session, &events);
                        }
                        KeyAction::Continue => {}
                    }
                }
            }
        }

        // Check for file changes (non-blocking)
        if watch::wait_for_change(&rx, Duration::ZERO) {
            watch::drain_events(&rx);
            let events = session.on_file_changed();
            if !events.is_empty() {
                info!("board changed on disk");
            }
            apply_events(app, session, &events);
        }
    }
}

fn apply_events(app: &mut App, session: &DocumentSession, events: &[HostEvent]) {
    for ev in events {
        match ev {
            HostEvent::ReplaceText(_) => {
                app.status = Some(format!("saved {}", session.path().display()));
            }
            HostEvent::BoardUpdated => app.refresh(session.board()),
            HostEvent::Error { kind, message } => {
                app.status = None;
                app.error = Some(format!("{kind} error: {message}"));
            }
        }
    }
}
