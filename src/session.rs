//! One open board document: the parsed board, the text it came from, and the
//! write path back to disk.
//!
//! Writes are serialized through an [`EditGuard`]. Change notifications that
//! arrive while the guard is held, or whose on-disk text equals what we last
//! wrote, are our own echo and do not trigger a reparse.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use tempfile::NamedTempFile;

use crate::ids::{IdGenerator, SequentialIds};
use crate::model::Board;
use crate::ops;
use crate::parser::parse_with;
use crate::serializer::serialize;
use crate::settings::Settings;
use crate::validate::validate_board;

/// Per-document "edit in flight" flag. Clones share the same flag, so the
/// watcher callback can observe it.
#[derive(Debug, Clone, Default)]
pub struct EditGuard(Arc<AtomicBool>);

impl EditGuard {
    pub fn is_held(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Take the guard, or `None` if another edit holds it.
    pub fn try_hold(&self) -> Option<EditHold> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| EditHold(self.clone()))
    }
}

/// Releases the guard on drop.
#[derive(Debug)]
pub struct EditHold(EditGuard);

impl Drop for EditHold {
    fn drop(&mut self) {
        self.0 .0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Serialize,
    Write,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parse => "parse",
            Self::Serialize => "serialize",
            Self::Write => "write",
        })
    }
}

/// Signals from the session to whatever is hosting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The document text was replaced with this content.
    ReplaceText(String),
    /// The in-memory board changed and should be redrawn.
    BoardUpdated,
    Error { kind: ErrorKind, message: String },
}

/// Board edits requested by a UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardCommand {
    SetComplete {
        card_id: String,
        value: bool,
    },
    Move {
        card_id: String,
        target_lane_id: String,
        target_index: usize,
    },
    ArchiveCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The command did not match anything on the board.
    NoOp,
    /// The board changed but its text did not, so nothing was written.
    Unchanged,
    /// The new text was written to disk.
    Written(String),
}

/// The file changed under us since it was loaded.
#[derive(Debug)]
pub struct WriteConflict {
    pub path: PathBuf,
}

impl fmt::Display for WriteConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} was modified externally; reload before editing",
            self.path.display()
        )
    }
}

impl std::error::Error for WriteConflict {}

#[derive(Debug)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub error: anyhow::Error,
}

impl SessionError {
    fn new(kind: ErrorKind, error: anyhow::Error) -> Self {
        Self { kind, error }
    }

    pub fn is_conflict(&self) -> bool {
        self.error.downcast_ref::<WriteConflict>().is_some()
    }

    pub fn to_event(&self) -> HostEvent {
        HostEvent::Error {
            kind: self.kind,
            message: format!("{:#}", self.error),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {:#}", self.kind, self.error)
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    /// Our own write, or an edit is in flight.
    Suppressed,
    /// The on-disk text is what we already have.
    Unchanged,
    Reloaded,
}

pub struct DocumentSession {
    path: PathBuf,
    board: Board,
    /// Text the board was last loaded from or written as. `None` when the
    /// document could not be read as text, which blocks writes until reload.
    text: Option<String>,
    settings: Option<Settings>,
    guard: EditGuard,
    make_ids: fn() -> Box<dyn IdGenerator>,
}

impl DocumentSession {
    /// Load an existing document, failing if it cannot be read as text.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut session = Self::detached(path);
        session.board = session.parse(&text);
        session.text = Some(text);
        Ok(session)
    }

    /// Open a document for interactive use. Never fails: an unreadable or
    /// missing document yields an empty board with the problem recorded in
    /// `board.errors`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut session = Self::detached(path.into());
        match read_text(&session.path) {
            Ok(Some(text)) => {
                session.board = session.parse(&text);
                session.text = Some(text);
            }
            Ok(None) => {
                let message = format!("{} does not exist", session.path.display());
                debug!("{message}");
                session.board.errors.push(message);
                session.text = Some(String::new());
            }
            Err(e) => {
                warn!("{e:#}");
                session.board.errors.push(format!("{e:#}"));
            }
        }
        session
    }

    fn detached(path: PathBuf) -> Self {
        let make_ids = sequential_ids;
        Self {
            path,
            board: Board::empty(make_ids().as_mut()),
            text: None,
            settings: None,
            guard: EditGuard::default(),
            make_ids,
        }
    }

    /// Build a fresh id generator from `make_ids` for every later parse.
    pub fn with_ids(mut self, make_ids: fn() -> Box<dyn IdGenerator>) -> Self {
        self.make_ids = make_ids;
        self
    }

    /// Settings written as frontmatter when the board has none of its own.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    fn parse(&self, text: &str) -> Board {
        parse_with(text, (self.make_ids)().as_mut())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn guard(&self) -> EditGuard {
        self.guard.clone()
    }

    /// Text the board was last loaded from or written as.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Render the current board the way it would be written.
    pub fn render(&self) -> String {
        render(&self.board, self.settings.as_ref())
    }

    /// Apply `cmd` to a copy of the board and write the result. The session
    /// board is only replaced once the write succeeded.
    pub fn apply(&mut self, cmd: &BoardCommand) -> Result<Applied, SessionError> {
        let _hold = self.guard.try_hold().ok_or_else(|| {
            SessionError::new(ErrorKind::Write, anyhow!("another edit is in progress"))
        })?;

        let mut board = self.board.clone();
        if !apply_command(&mut board, cmd) {
            debug!("{cmd:?} matched nothing");
            return Ok(Applied::NoOp);
        }

        validate_board(&board).map_err(|e| SessionError::new(ErrorKind::Serialize, e))?;
        let text = render(&board, self.settings.as_ref());

        if self.text.as_deref() == Some(text.as_str()) {
            self.board = board;
            return Ok(Applied::Unchanged);
        }

        self.write(&text)
            .map_err(|e| SessionError::new(ErrorKind::Write, e))?;
        info!("wrote {} ({} bytes)", self.path.display(), text.len());
        board.errors.clear();
        self.board = board;
        self.text = Some(text.clone());
        Ok(Applied::Written(text))
    }

    /// [`apply`](Self::apply), reported as host events.
    pub fn handle(&mut self, cmd: &BoardCommand) -> Vec<HostEvent> {
        match self.apply(cmd) {
            Ok(Applied::NoOp) => Vec::new(),
            Ok(Applied::Unchanged) => vec![HostEvent::BoardUpdated],
            Ok(Applied::Written(text)) => {
                vec![HostEvent::ReplaceText(text), HostEvent::BoardUpdated]
            }
            Err(e) => {
                if e.is_conflict() {
                    warn!("{e}");
                }
                vec![e.to_event()]
            }
        }
    }

    /// Rewrite the document in canonical form. Returns whether anything was
    /// written.
    pub fn canonicalize(&mut self) -> Result<bool> {
        let _hold = self
            .guard
            .try_hold()
            .context("another edit is in progress")?;
        validate_board(&self.board)?;
        let text = render(&self.board, self.settings.as_ref());
        if self.text.as_deref() == Some(text.as_str()) {
            return Ok(false);
        }
        self.write(&text)?;
        info!("canonicalized {}", self.path.display());
        self.text = Some(text);
        Ok(true)
    }

    fn write(&self, text: &str) -> Result<()> {
        let conflict = || WriteConflict {
            path: self.path.clone(),
        };
        let Some(expected) = self.text.as_deref() else {
            return Err(conflict().into());
        };
        let on_disk = read_text(&self.path)?;
        if on_disk.as_deref().unwrap_or("") != expected {
            return Err(conflict().into());
        }
        write_atomic(&self.path, text)
    }

    /// Re-read the document after a change notification.
    pub fn reload(&mut self) -> Result<Reload> {
        if self.guard.is_held() {
            return Ok(Reload::Suppressed);
        }
        let text = read_text(&self.path)?.unwrap_or_default();
        if self.text.as_deref() == Some(text.as_str()) {
            debug!("ignoring change to {}: content matches", self.path.display());
            return Ok(Reload::Unchanged);
        }
        info!("reloading {}", self.path.display());
        self.board = self.parse(&text);
        self.text = Some(text);
        Ok(Reload::Reloaded)
    }

    /// [`reload`](Self::reload), reported as host events.
    pub fn on_file_changed(&mut self) -> Vec<HostEvent> {
        match self.reload() {
            Ok(Reload::Reloaded) => vec![HostEvent::BoardUpdated],
            Ok(_) => Vec::new(),
            Err(e) => {
                let message = format!("{e:#}");
                // Only the latest failure describes the document.
                self.board.errors = vec![message.clone()];
                vec![HostEvent::Error {
                    kind: ErrorKind::Parse,
                    message,
                }]
            }
        }
    }
}

/// Equal text always parses to equal ids.
fn sequential_ids() -> Box<dyn IdGenerator> {
    Box::new(SequentialIds::default())
}

/// Canonical document text: the serialized board plus a trailing newline.
pub fn render(board: &Board, settings: Option<&Settings>) -> String {
    let mut text = serialize(board, settings);
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Returns `false` when the command matched nothing.
pub fn apply_command(board: &mut Board, cmd: &BoardCommand) -> bool {
    match cmd {
        BoardCommand::SetComplete { card_id, value } => ops::set_complete(board, card_id, *value),
        BoardCommand::Move {
            card_id,
            target_lane_id,
            target_index,
        } => ops::move_item(board, card_id, target_lane_id, *target_index),
        BoardCommand::ArchiveCompleted => ops::archive_completed(board) > 0,
    }
}

/// Read `path` as text. `Ok(None)` if it does not exist.
pub fn read_text(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Write via a temp file in the same directory and rename over `path`.
pub fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(text.as_bytes())
        .context("failed to write temp file")?;
    tmp.as_file().sync_all().context("failed to sync temp file")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_exclusive_until_dropped() {
        let guard = EditGuard::default();
        let shared = guard.clone();
        let hold = guard.try_hold().unwrap();
        assert!(shared.is_held());
        assert!(shared.try_hold().is_none());
        drop(hold);
        assert!(!shared.is_held());
        assert!(shared.try_hold().is_some());
    }

    #[test]
    fn render_appends_newline_to_non_empty_text() {
        let board = crate::parser::parse("## A\n- [ ] a");
        assert_eq!(render(&board, None), "## A\n\n- [ ] a\n");
        assert_eq!(render(&crate::parser::parse(""), None), "");
    }

    #[test]
    fn archive_with_nothing_done_is_a_miss() {
        let mut board = crate::parser::parse("## A\n- [ ] a\n");
        assert!(!apply_command(&mut board, &BoardCommand::ArchiveCompleted));
    }

    #[test]
    fn session_error_reports_kind() {
        let err = SessionError::new(ErrorKind::Serialize, anyhow!("bad title"));
        assert_eq!(err.to_string(), "serialize failed: bad title");
        assert_eq!(
            err.to_event(),
            HostEvent::Error {
                kind: ErrorKind::Serialize,
                message: "bad title".into()
            }
        );
        assert!(!err.is_conflict());
    }
}
