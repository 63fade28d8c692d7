//! [`Board`] back to markdown text.

use crate::model::{Board, Item};
use crate::parser::{ARCHIVE_HEADING, ARCHIVE_MARKER, FENCE, LANE_PREFIX};
use crate::settings::Settings;

const INDENT: &str = "  ";

/// Render `board` as markdown.
///
/// A captured frontmatter block is replayed verbatim. Without one, a
/// non-empty `settings` overlay is written as a synthesized block. The result
/// is trimmed, so callers must not depend on trailing newlines.
pub fn serialize(board: &Board, settings: Option<&Settings>) -> String {
    let mut lines: Vec<String> = Vec::new();

    match (&board.frontmatter, settings) {
        (Some(fm), _) if !fm.raw.is_empty() => {
            lines.push(fm.raw.clone());
            lines.push(String::new());
        }
        (_, Some(settings)) if !settings.is_empty() => {
            lines.push(FENCE.to_string());
            for (key, value) in settings.iter() {
                lines.push(format!("{key}: {value}"));
            }
            lines.push(FENCE.to_string());
            lines.push(String::new());
        }
        _ => {}
    }

    for lane in &board.children {
        lines.push(format!("{LANE_PREFIX}{}", lane.title));
        lines.push(String::new());
        render_items(&mut lines, &lane.children, "");
        lines.push(String::new());
    }

    if !board.archive.is_empty() {
        lines.push(ARCHIVE_MARKER.to_string());
        lines.push(String::new());
        lines.push(format!("{LANE_PREFIX}{ARCHIVE_HEADING}"));
        lines.push(String::new());
        render_items(&mut lines, &board.archive, "");
    }

    lines.join("\n").trim().to_string()
}

/// Pre-order rendering; indentation comes from tree position, not `level`.
fn render_items(lines: &mut Vec<String>, items: &[Item], indent: &str) {
    for item in items {
        let mark = if item.is_complete { 'x' } else { ' ' };
        lines.push(format!("{indent}- [{mark}] {}", item.title));
        if !item.children.is_empty() {
            render_items(lines, &item.children, &format!("{indent}{INDENT}"));
        }
    }
}
