use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::session::EditGuard;

/// Creates a watcher for the board file and returns a receiver for change events.
/// The watcher must be kept alive for events to be received.
///
/// We watch the parent directory because saves usually replace the file via
/// rename, which a watch on the file itself would not survive. Events for
/// other files in the directory are ignored, as are events that arrive while
/// `guard` is held.
pub fn watch_file(path: &Path, guard: EditGuard) -> Result<(RecommendedWatcher, Receiver<()>)> {
    let (tx, rx) = mpsc::channel();

    let filename = path.file_name().map(|f| f.to_os_string()).unwrap_or_default();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            let ours = event
                .paths
                .iter()
                .any(|p| p.file_name().is_some_and(|f| f == filename.as_os_str()));
            if !ours {
                return;
            }
            if guard.is_held() {
                debug!("suppressed change event during edit");
                return;
            }
            let _ = tx.send(());
        }
    })
    .context("failed to create file watcher")?;

    let watch_path = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    watcher
        .watch(watch_path, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", watch_path.display()))?;

    Ok((watcher, rx))
}

/// Waits for a change event with timeout.
/// Returns true if an event was received, false on timeout.
pub fn wait_for_change(rx: &Receiver<()>, timeout: Duration) -> bool {
    rx.recv_timeout(timeout).is_ok()
}

/// Drains any pending events from the receiver.
pub fn drain_events(rx: &Receiver<()>) {
    while rx.try_recv().is_ok() {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_channel() {
        let (tx, rx) = mpsc::channel();
        tx.send(()).unwrap();
        tx.send(()).unwrap();
        drain_events(&rx);
        assert!(!wait_for_change(&rx, Duration::from_millis(1)));
    }

    #[test]
    fn sees_external_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.md");
        std::fs::write(&path, "## A\n").unwrap();
        let (_watcher, rx) = watch_file(&path, EditGuard::default()).unwrap();
        std::fs::write(&path, "## B\n").unwrap();
        assert!(wait_for_change(&rx, Duration::from_secs(5)));
    }

    #[test]
    fn ignores_sibling_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.md");
        std::fs::write(&path, "## A\n").unwrap();
        let (_watcher, rx) = watch_file(&path, EditGuard::default()).unwrap();
        std::fs::write(dir.path().join("notes.md"), "hello").unwrap();
        assert!(!wait_for_change(&rx, Duration::from_millis(300)));
    }
}
