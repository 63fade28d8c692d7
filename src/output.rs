use anyhow::{Context, Result};

use crate::model::{Board, Item};

/// Render the board as an outline: one heading line per lane, cards below it
/// with tree connectors.
pub fn format_board(board: &Board, show_ids: bool) -> String {
    let mut out = String::new();
    for (i, lane) in board.children.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let title = if lane.title.is_empty() {
            "(untitled)"
        } else {
            lane.title.as_str()
        };
        out.push_str(title);
        if show_ids {
            out.push_str(&format!(" [{}]", lane.id));
        }
        out.push_str(&format!(" ({})\n", count_label(&lane.children)));
        write_items(&mut out, &lane.children, "", show_ids);
    }
    if !board.archive.is_empty() {
        if !board.children.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("Archive ({})\n", count_label(&board.archive)));
        write_items(&mut out, &board.archive, "", show_ids);
    }
    out
}

fn count_label(items: &[Item]) -> String {
    let total: usize = items.iter().map(Item::subtree_len).sum();
    let done = items.iter().map(count_done).sum::<usize>();
    format!("{done}/{total}")
}

fn count_done(item: &Item) -> usize {
    usize::from(item.is_complete) + item.children.iter().map(count_done).sum::<usize>()
}

/// Write each card line and recurse into children.
/// `prefix` is the base prefix for this level's tree connectors.
fn write_items(out: &mut String, items: &[Item], prefix: &str, show_ids: bool) {
    for (i, item) in items.iter().enumerate() {
        let is_last = i == items.len() - 1;
        let (connector, extension) = if is_last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let id = if show_ids {
            format!("  [{}]", item.id)
        } else {
            String::new()
        };
        out.push_str(&format!(
            "{prefix}{connector}{} {}{id}\n",
            item.icon(),
            item.title
        ));
        write_items(out, &item.children, &format!("{prefix}{extension}"), show_ids);
    }
}

pub fn format_board_json(board: &Board) -> Result<String> {
    serde_json::to_string_pretty(board).context("failed to encode board as JSON")
}
