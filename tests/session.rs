use std::fs;
use std::time::Duration;

use mdkanban::ids::{IdGenerator, RandomIds};
use mdkanban::ops;
use mdkanban::session::{
    Applied, BoardCommand, DocumentSession, ErrorKind, HostEvent, Reload, WriteConflict,
};
use mdkanban::settings::{SettingValue, Settings};
use mdkanban::watch;

const BOARD: &str = "---\nkanban-plugin: board\n---\n\n## To Do\n\n- [ ] Buy milk\n- [x] Pay bills\n  - [ ] Pay rent\n\n## Done\n";

fn board_file(text: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.md");
    fs::write(&path, text).unwrap();
    (dir, path)
}

fn card_id(session: &DocumentSession, title: &str) -> String {
    ops::resolve_item(session.board(), title).unwrap().id.clone()
}

fn lane_id(session: &DocumentSession, title: &str) -> String {
    ops::resolve_lane(session.board(), title).unwrap().id.clone()
}

#[test]
fn set_complete_writes_canonical_text() {
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::load(&path).unwrap();
    let card_id = card_id(&session, "Pay rent");

    let applied = session
        .apply(&BoardCommand::SetComplete {
            card_id,
            value: true,
        })
        .unwrap();

    let expected = "---\nkanban-plugin: board\n---\n\n## To Do\n\n- [ ] Buy milk\n- [x] Pay bills\n  - [x] Pay rent\n\n## Done\n";
    assert_eq!(applied, Applied::Written(expected.to_string()));
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    assert_eq!(session.text(), Some(expected));
}

#[test]
fn move_then_reload_sees_same_board() {
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::load(&path).unwrap();
    let card_id = card_id(&session, "Pay bills");
    let done = lane_id(&session, "Done");

    let events = session.handle(&BoardCommand::Move {
        card_id,
        target_lane_id: done,
        target_index: 0,
    });
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], HostEvent::ReplaceText(_)));
    assert_eq!(events[1], HostEvent::BoardUpdated);

    let reloaded = DocumentSession::load(&path).unwrap();
    let done = ops::resolve_lane(reloaded.board(), "Done").unwrap();
    assert_eq!(done.children[0].title, "Pay bills");
    assert_eq!(done.children[0].children[0].title, "Pay rent");
}

#[test]
fn unknown_card_is_a_no_op() {
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::load(&path).unwrap();
    let applied = session
        .apply(&BoardCommand::SetComplete {
            card_id: "missing".into(),
            value: true,
        })
        .unwrap();
    assert_eq!(applied, Applied::NoOp);
    assert_eq!(fs::read_to_string(&path).unwrap(), BOARD);
    assert!(session
        .handle(&BoardCommand::SetComplete {
            card_id: "missing".into(),
            value: true,
        })
        .is_empty());
}

#[test]
fn move_to_unknown_lane_keeps_card() {
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::load(&path).unwrap();
    let card_id = card_id(&session, "Buy milk");
    let applied = session
        .apply(&BoardCommand::Move {
            card_id,
            target_lane_id: "nowhere".into(),
            target_index: 0,
        })
        .unwrap();
    assert_eq!(applied, Applied::NoOp);
    assert!(ops::resolve_item(session.board(), "Buy milk").is_some());
}

#[test]
fn external_edit_blocks_write() {
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::load(&path).unwrap();
    let card_id = card_id(&session, "Buy milk");

    let external = format!("{BOARD}- [ ] Added elsewhere\n");
    fs::write(&path, &external).unwrap();

    let err = session
        .apply(&BoardCommand::SetComplete {
            card_id: card_id.clone(),
            value: true,
        })
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Write);
    assert!(err.is_conflict());
    assert!(err.error.downcast_ref::<WriteConflict>().is_some());
    assert_eq!(fs::read_to_string(&path).unwrap(), external, "nothing written");
    assert!(
        !ops::find_item(session.board(), &card_id).unwrap().is_complete,
        "board unchanged after failed write"
    );

    let events = session.handle(&BoardCommand::SetComplete {
        card_id,
        value: true,
    });
    assert!(matches!(
        events.as_slice(),
        [HostEvent::Error {
            kind: ErrorKind::Write,
            ..
        }]
    ));
}

#[test]
fn reload_picks_up_external_edit() {
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::load(&path).unwrap();
    assert_eq!(session.reload().unwrap(), Reload::Unchanged);

    fs::write(&path, "## Fresh\n- [ ] new card\n").unwrap();
    assert_eq!(session.on_file_changed(), vec![HostEvent::BoardUpdated]);
    assert_eq!(session.board().children[0].title, "Fresh");

    // After a reload, edits are checked against the new text.
    let card_id = card_id(&session, "new card");
    assert!(matches!(
        session.apply(&BoardCommand::SetComplete {
            card_id,
            value: true
        }),
        Ok(Applied::Written(_))
    ));
}

#[test]
fn own_write_is_not_reloaded() {
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::load(&path).unwrap();
    let card_id = card_id(&session, "Buy milk");
    session
        .apply(&BoardCommand::SetComplete {
            card_id,
            value: true,
        })
        .unwrap();
    let board_before = session.board().clone();
    assert_eq!(session.reload().unwrap(), Reload::Unchanged);
    assert!(session.on_file_changed().is_empty());
    assert_eq!(session.board(), &board_before);
}

#[test]
fn reload_is_suppressed_while_guard_is_held() {
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::load(&path).unwrap();
    fs::write(&path, "## Other\n").unwrap();

    let guard = session.guard();
    let hold = guard.try_hold().unwrap();
    assert_eq!(session.reload().unwrap(), Reload::Suppressed);

    let err = session.apply(&BoardCommand::ArchiveCompleted).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Write);

    drop(hold);
    assert_eq!(session.reload().unwrap(), Reload::Reloaded);
}

#[test]
fn watcher_ignores_events_while_guard_is_held() {
    let (_dir, path) = board_file(BOARD);
    let session = DocumentSession::load(&path).unwrap();
    let guard = session.guard();
    let (_watcher, rx) = watch::watch_file(&path, guard.clone()).unwrap();

    {
        let _hold = guard.try_hold().unwrap();
        fs::write(&path, "## Held\n").unwrap();
        // Give the backend time to deliver while the guard is still held.
        std::thread::sleep(Duration::from_millis(500));
    }
    watch::drain_events(&rx);
    assert!(!watch::wait_for_change(&rx, Duration::from_millis(200)));

    fs::write(&path, "## Released\n").unwrap();
    assert!(watch::wait_for_change(&rx, Duration::from_secs(5)));
}

#[test]
fn archive_writes_archive_section() {
    let (_dir, path) = board_file("## A\n- [x] a\n- [ ] b\n");
    let mut session = DocumentSession::load(&path).unwrap();
    let applied = session.apply(&BoardCommand::ArchiveCompleted).unwrap();
    assert!(matches!(applied, Applied::Written(_)));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "## A\n\n- [ ] b\n\n***\n\n## Archive\n\n- [x] a\n"
    );
    assert_eq!(
        session.apply(&BoardCommand::ArchiveCompleted).unwrap(),
        Applied::NoOp
    );
}

#[test]
fn open_missing_file_yields_empty_board() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.md");
    let session = DocumentSession::open(&path);
    assert!(session.board().children.is_empty());
    assert_eq!(session.board().errors.len(), 1);
    assert!(session.board().errors[0].contains("does not exist"));
}

#[test]
fn open_binary_file_blocks_writes_until_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.md");
    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

    let mut session = DocumentSession::open(&path);
    assert!(session.board().children.is_empty());
    assert!(!session.board().errors.is_empty());
    assert!(session.text().is_none());

    let events = session.on_file_changed();
    assert!(matches!(
        events.as_slice(),
        [HostEvent::Error {
            kind: ErrorKind::Parse,
            ..
        }]
    ));

    fs::write(&path, "## Fixed\n").unwrap();
    assert_eq!(session.on_file_changed(), vec![HostEvent::BoardUpdated]);
    assert_eq!(session.board().children[0].title, "Fixed");
}

#[test]
fn repeated_reload_failures_keep_only_the_latest_error() {
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::load(&path).unwrap();
    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

    for _ in 0..3 {
        assert_eq!(session.on_file_changed().len(), 1);
    }
    assert_eq!(session.board().errors.len(), 1);

    fs::write(&path, "## Fixed\n").unwrap();
    assert_eq!(session.on_file_changed(), vec![HostEvent::BoardUpdated]);
    assert!(session.board().errors.is_empty());
}

#[test]
fn successful_write_clears_stale_errors() {
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::load(&path).unwrap();
    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
    session.on_file_changed();
    assert_eq!(session.board().errors.len(), 1);

    fs::write(&path, BOARD).unwrap();
    let card_id = card_id(&session, "Buy milk");
    let applied = session
        .apply(&BoardCommand::SetComplete {
            card_id,
            value: true,
        })
        .unwrap();
    assert!(matches!(applied, Applied::Written(_)));
    assert!(session.board().errors.is_empty());
}

#[test]
fn canonicalize_rewrites_once() {
    let (_dir, path) = board_file("## A\n- [X]   a  \n\n\n## B");
    let mut session = DocumentSession::load(&path).unwrap();
    assert!(session.canonicalize().unwrap());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "## A\n\n- [x] a\n\n## B\n"
    );
    assert!(!session.canonicalize().unwrap());
}

#[test]
fn settings_overlay_adds_frontmatter_to_plain_documents() {
    let (_dir, path) = board_file("## A\n- [ ] a\n");
    let mut settings = Settings::default();
    settings.insert("kanban-plugin", SettingValue::Text("board".into()));
    let mut session = DocumentSession::load(&path).unwrap().with_settings(settings);
    assert!(session.canonicalize().unwrap());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "---\nkanban-plugin: board\n---\n\n## A\n\n- [ ] a\n"
    );
}

#[test]
fn random_ids_survive_reload() {
    fn random() -> Box<dyn IdGenerator> {
        Box::new(RandomIds)
    }
    let (_dir, path) = board_file(BOARD);
    let mut session = DocumentSession::open(&path).with_ids(random);
    fs::write(&path, "## A\n- [ ] a\n").unwrap();
    session.reload().unwrap();
    assert!(session.board().children[0].id.starts_with("l-"));
    let card_id = card_id(&session, "a");
    assert!(card_id.starts_with("i-"));
    assert!(matches!(
        session.apply(&BoardCommand::SetComplete {
            card_id,
            value: true
        }),
        Ok(Applied::Written(_))
    ));
}
