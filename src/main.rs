mod cli;

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use mdkanban::config::Config;
use mdkanban::ids::SequentialIds;
use mdkanban::model::Board;
use mdkanban::session::{self, Applied, BoardCommand, DocumentSession, EditGuard};
use mdkanban::validate::validate_title;
use mdkanban::{ops, output, tui, watch};

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Logs go to stderr, except under the interactive board where they would
/// corrupt the screen: there they go to `$MDKANBAN_LOG` or nowhere.
fn setup_logging(interactive: bool) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if interactive {
        match std::env::var_os("MDKANBAN_LOG") {
            Some(log_path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&log_path)
                    .context("failed to open log file")?;
                builder
                    .target(env_logger::Target::Pipe(Box::new(file)))
                    .format_timestamp_secs();
            }
            None => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }
    builder.init();
    Ok(())
}

fn resolve_card(session: &DocumentSession, card: &str) -> Result<(String, String)> {
    let item = ops::resolve_item(session.board(), card)
        .with_context(|| format!("card '{card}' not found"))?;
    Ok((item.id.clone(), item.title.clone()))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(matches!(cli.command, Command::Watch { .. }))?;
    let config = Config::load()?;
    let path = cli.file.unwrap_or_else(|| config.board_file());

    match cli.command {
        Command::Init { lanes } => {
            let lanes = if lanes.is_empty() {
                config.default_lanes()
            } else {
                lanes
            };
            let mut ids = SequentialIds::default();
            let mut board = Board::empty(&mut ids);
            for lane in &lanes {
                validate_title(lane).with_context(|| format!("invalid lane name {lane:?}"))?;
                board.add_lane(&mut ids, lane);
            }
            let text = session::render(&board, Some(&config.init_settings()));

            ensure_parent_dir(&path)?;
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            file.write_all(text.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Created board {} with {} lane(s)", path.display(), lanes.len());
        }

        Command::Show { json, ids } => {
            let session = DocumentSession::load(&path)?;
            if json {
                println!("{}", output::format_board_json(session.board())?);
            } else {
                print!("{}", output::format_board(session.board(), ids));
            }
        }

        Command::Fmt { check } => {
            let mut session = DocumentSession::load(&path)?;
            if check {
                if session.text() != Some(session.render().as_str()) {
                    bail!("{} is not in canonical form", path.display());
                }
                eprintln!("{} is canonical", path.display());
            } else if session.canonicalize()? {
                eprintln!("Formatted {}", path.display());
            } else {
                eprintln!("{} is already canonical", path.display());
            }
        }

        Command::Done { card } => {
            let mut session = DocumentSession::load(&path)?;
            let (card_id, title) = resolve_card(&session, &card)?;
            match session.apply(&BoardCommand::SetComplete {
                card_id,
                value: true,
            })? {
                Applied::Written(_) => eprintln!("Marked '{title}' as done"),
                _ => eprintln!("'{title}' is already done"),
            }
        }

        Command::Reopen { card } => {
            let mut session = DocumentSession::load(&path)?;
            let (card_id, title) = resolve_card(&session, &card)?;
            match session.apply(&BoardCommand::SetComplete {
                card_id,
                value: false,
            })? {
                Applied::Written(_) => eprintln!("Reopened '{title}'"),
                _ => eprintln!("'{title}' is already open"),
            }
        }

        Command::Mv { card, lane, index } => {
            let mut session = DocumentSession::load(&path)?;
            let (card_id, title) = resolve_card(&session, &card)?;
            let target = ops::resolve_lane(session.board(), &lane)
                .with_context(|| format!("lane '{lane}' not found"))?;
            let target_lane_id = target.id.clone();
            let lane_title = target.title.clone();
            let target_index = index.unwrap_or(target.children.len());
            match session.apply(&BoardCommand::Move {
                card_id,
                target_lane_id,
                target_index,
            })? {
                Applied::Written(_) => eprintln!("Moved '{title}' to '{lane_title}'"),
                _ => eprintln!("'{title}' is already there"),
            }
        }

        Command::Archive => {
            let mut session = DocumentSession::load(&path)?;
            let before = session.board().archive.len();
            match session.apply(&BoardCommand::ArchiveCompleted)? {
                Applied::NoOp => eprintln!("No completed cards to archive"),
                _ => eprintln!(
                    "Archived {} card(s)",
                    session.board().archive.len() - before
                ),
            }
        }

        Command::Watch { poll_interval } => {
            let mut session = DocumentSession::open(&path);
            tui::run(
                &mut session,
                poll_interval.unwrap_or_else(|| config.poll_interval()),
            )?;
        }

        Command::Wait => {
            let (_watcher, rx) = watch::watch_file(&path, EditGuard::default())?;
            // Block until a change event
            watch::wait_for_change(&rx, Duration::MAX);
        }
    }

    Ok(())
}
