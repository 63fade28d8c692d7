//! Markdown text to [`Board`].
//!
//! The dialect is line oriented:
//!
//! ```text
//! ---                      frontmatter, only when it starts on line 0
//! kanban-plugin: board
//! ---
//!
//! ## To Do                 lane
//!
//! - [ ] Buy milk           item, level 0
//!   - [x] Skim milk        item, level 1 (two spaces per level)
//!
//! ***                      archive marker, only when the next
//!                          non-blank line is `## Archive`
//! ## Archive
//!
//! - [x] Old card           archived item
//! ```
//!
//! Parsing is total: every input produces a board. Lines that are not
//! frontmatter, lane headings or checkbox items are dropped, including a
//! `***` rule that does not open the archive.

use log::debug;

use crate::ids::{IdGenerator, IdKind, SequentialIds};
use crate::model::{Board, Frontmatter, Item, Lane};
use crate::settings::Settings;

pub const FENCE: &str = "---";
pub const LANE_PREFIX: &str = "## ";
pub const ARCHIVE_MARKER: &str = "***";
pub const ARCHIVE_HEADING: &str = "Archive";

/// Parse with a fresh [`SequentialIds`], so equal text yields equal ids.
pub fn parse(text: &str) -> Board {
    parse_with(text, &mut SequentialIds::default())
}

pub fn parse_with(text: &str, ids: &mut dyn IdGenerator) -> Board {
    let mut board = Board::new(ids.next_id(IdKind::Board));
    let mut frontmatter: Vec<&str> = Vec::new();
    let mut in_frontmatter = false;
    let mut in_archive = false;
    let mut current: Option<Lane> = None;
    let mut dropped = 0usize;
    let lines: Vec<&str> = text.split('\n').collect();

    for (i, &line) in lines.iter().enumerate() {
        let trimmed = line.trim();

        if trimmed == FENCE {
            if i == 0 {
                in_frontmatter = true;
                frontmatter.push(line);
                continue;
            } else if in_frontmatter {
                in_frontmatter = false;
                frontmatter.push(line);
                continue;
            }
        }
        if in_frontmatter {
            frontmatter.push(line);
            continue;
        }

        if !in_archive && trimmed == ARCHIVE_MARKER && opens_archive(&lines[i + 1..]) {
            board.children.extend(current.take());
            in_archive = true;
            continue;
        }

        if let Some(title) = lane_title(trimmed) {
            if !in_archive {
                board.children.extend(current.take());
                current = Some(Lane::new(ids.next_id(IdKind::Lane), title));
            }
            continue;
        }

        if let Some(parsed) = parse_item_line(line) {
            let siblings = if in_archive {
                Some(&mut board.archive)
            } else {
                current.as_mut().map(|lane| &mut lane.children)
            };
            match siblings {
                Some(siblings) if !parsed.title.is_empty() => {
                    let item = Item::new(ids.next_id(IdKind::Item), parsed.title, parsed.complete);
                    attach(siblings, item, 0, parsed.level);
                }
                _ => dropped += 1,
            }
            continue;
        }

        if !trimmed.is_empty() {
            dropped += 1;
        }
    }

    board.children.extend(current.take());

    if !frontmatter.is_empty() {
        let raw = frontmatter.join("\n");
        board.settings = Settings::from_frontmatter(&raw);
        board.frontmatter = Some(Frontmatter { raw });
    }

    if dropped > 0 {
        debug!("dropped {dropped} unrecognized line(s) while parsing board");
    }

    board
}

/// Whether the first non-blank line after a `***` rule is `## Archive`.
fn opens_archive(rest: &[&str]) -> bool {
    rest.iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .and_then(lane_title)
        == Some(ARCHIVE_HEADING)
}

/// Title of a lane heading, or `None` if the trimmed line is not one.
/// A bare `##` is a lane with an empty title.
fn lane_title(trimmed: &str) -> Option<&str> {
    if trimmed == LANE_PREFIX.trim_end() {
        return Some("");
    }
    trimmed.strip_prefix(LANE_PREFIX).map(str::trim)
}

#[derive(Debug, PartialEq, Eq)]
struct ItemLine<'a> {
    level: usize,
    complete: bool,
    title: &'a str,
}

/// Match `<whitespace>- [<space|x|X>]<title>`.
fn parse_item_line(line: &str) -> Option<ItemLine<'_>> {
    let body = line.trim_start();
    let indent = line[..line.len() - body.len()].chars().count();
    let rest = body.strip_prefix("- [")?;
    let mut chars = rest.chars();
    let complete = match chars.next()? {
        'x' | 'X' => true,
        c if c.is_whitespace() => false,
        _ => return None,
    };
    let title = chars.as_str().strip_prefix(']')?.trim();
    Some(ItemLine {
        level: indent / 2,
        complete,
        title,
    })
}

/// Append `item` at `level`, descending through the last child at each depth.
///
/// The chain of last children is exactly the stack of open ancestors, so a
/// level deeper than that chain is clamped to one below its deepest item.
/// The item's `level` is set to the depth it actually lands at.
fn attach(siblings: &mut Vec<Item>, mut item: Item, depth: usize, level: usize) {
    if depth < level {
        if let Some(parent) = siblings.last_mut() {
            return attach(&mut parent.children, item, depth + 1, level);
        }
    }
    item.level = depth;
    siblings.push(item);
}
