use crossterm::event::{KeyCode, KeyEvent};

use super::app::{App, Mode};
use crate::session::BoardCommand;

/// Result of handling a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Rows changed locally (collapse); rebuild columns from the board.
    Rebuild,
    /// Re-read the file from disk.
    Reload,
    Command(BoardCommand),
    Continue,
}

/// Handle a key press. Returns an action indicating what the event loop should do.
pub fn handle_key(app: &mut App, key: KeyEvent) -> KeyAction {
    match app.mode {
        Mode::Help => {
            if matches!(
                key.code,
                KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')
            ) {
                app.mode = Mode::Normal;
            }
            KeyAction::Continue
        }
        Mode::ConfirmArchive => {
            app.mode = Mode::Normal;
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Enter) {
                KeyAction::Command(BoardCommand::ArchiveCompleted)
            } else {
                KeyAction::Continue
            }
        }
        Mode::Normal => {
            app.error = None;
            app.status = None;
            let command = match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
                KeyCode::Char('j') | KeyCode::Down => {
                    app.move_down();
                    None
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    app.move_up();
                    None
                }
                KeyCode::Char('h') | KeyCode::Left => {
                    app.move_left();
                    None
                }
                KeyCode::Char('l') | KeyCode::Right => {
                    app.move_right();
                    None
                }
                KeyCode::Char('z') => {
                    return if app.toggle_collapse() {
                        KeyAction::Rebuild
                    } else {
                        KeyAction::Continue
                    };
                }
                KeyCode::Char(' ') | KeyCode::Enter => app.toggle_complete(),
                KeyCode::Char('H') => app.move_to_lane(-1),
                KeyCode::Char('L') => app.move_to_lane(1),
                KeyCode::Char('K') => app.reorder(-1),
                KeyCode::Char('J') => app.reorder(1),
                KeyCode::Char('a') => {
                    app.mode = Mode::ConfirmArchive;
                    None
                }
                KeyCode::Char('r') => return KeyAction::Reload,
                KeyCode::Char('?') => {
                    app.toggle_help();
                    None
                }
                _ => None,
            };
            command.map_or(KeyAction::Continue, KeyAction::Command)
        }
    }
}
