use anyhow::{bail, Context, Result};

use crate::model::{Board, Item};

/// Validate a card title: must be non-empty, fit on one line and carry no
/// surrounding whitespace (the parser trims it away).
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        bail!("card title must not be empty");
    }
    check_line(title, "card title")
}

fn check_line(text: &str, what: &str) -> Result<()> {
    if text.contains(['\n', '\r']) {
        bail!("{what} '{}' contains a line break", text.escape_debug());
    }
    if text.trim() != text {
        bail!(
            "{what} '{}' has leading or trailing whitespace",
            text.escape_debug()
        );
    }
    Ok(())
}

/// Check that every title in `board` will survive a serialize/parse cycle.
/// Lane titles may be empty; card titles may not.
pub fn validate_board(board: &Board) -> Result<()> {
    for lane in &board.children {
        check_line(&lane.title, "lane title")?;
        validate_items(&lane.children)
            .with_context(|| format!("in lane '{}'", lane.title.escape_debug()))?;
    }
    validate_items(&board.archive).context("in archive")?;
    Ok(())
}

fn validate_items(items: &[Item]) -> Result<()> {
    for item in items {
        validate_title(&item.title)?;
        validate_items(&item.children)?;
    }
    Ok(())
}
