//! Structural edits on an in-memory [`Board`].
//!
//! Ids are regenerated on every parse, so lookups can legitimately miss.
//! A miss is reported as `None`/`false` and the caller treats it as a no-op.

use log::debug;

use crate::model::{Board, Item, Lane};

pub fn find_item<'a>(board: &'a Board, id: &str) -> Option<&'a Item> {
    board
        .children
        .iter()
        .find_map(|lane| find_in(&lane.children, id))
}

fn find_in<'a>(items: &'a [Item], id: &str) -> Option<&'a Item> {
    for item in items {
        if item.id == id {
            return Some(item);
        }
        if let Some(found) = find_in(&item.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_item_mut<'a>(board: &'a mut Board, id: &str) -> Option<&'a mut Item> {
    board
        .children
        .iter_mut()
        .find_map(|lane| find_in_mut(&mut lane.children, id))
}

fn find_in_mut<'a>(items: &'a mut [Item], id: &str) -> Option<&'a mut Item> {
    for item in items.iter_mut() {
        if item.id == id {
            return Some(item);
        }
        if let Some(found) = find_in_mut(&mut item.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_lane<'a>(board: &'a Board, id: &str) -> Option<&'a Lane> {
    board.children.iter().find(|lane| lane.id == id)
}

/// Detach the first item with `id` (depth-first) and return its subtree.
pub fn remove_item(board: &mut Board, id: &str) -> Option<Item> {
    board
        .children
        .iter_mut()
        .find_map(|lane| remove_from(&mut lane.children, id))
}

fn remove_from(items: &mut Vec<Item>, id: &str) -> Option<Item> {
    for i in 0..items.len() {
        if items[i].id == id {
            return Some(items.remove(i));
        }
        if let Some(found) = remove_from(&mut items[i].children, id) {
            return Some(found);
        }
    }
    None
}

/// Move an item (with its subtree) to `target_lane_id` at `index`.
///
/// `index` is applied after the item is detached and is clamped to the lane
/// length. Returns `false` without touching the board if either id misses.
pub fn move_item(board: &mut Board, id: &str, target_lane_id: &str, index: usize) -> bool {
    let Some(lane_idx) = board.children.iter().position(|l| l.id == target_lane_id) else {
        debug!("move: lane {target_lane_id} not found");
        return false;
    };
    let Some(mut item) = remove_item(board, id) else {
        debug!("move: item {id} not found");
        return false;
    };
    relevel(&mut item, 0);
    let lane = &mut board.children[lane_idx];
    let index = index.min(lane.children.len());
    lane.children.insert(index, item);
    true
}

pub fn set_complete(board: &mut Board, id: &str, value: bool) -> bool {
    match find_item_mut(board, id) {
        Some(item) => {
            item.is_complete = value;
            true
        }
        None => {
            debug!("set_complete: item {id} not found");
            false
        }
    }
}

/// Move completed top-level items of every lane to the end of the archive.
/// Returns how many were moved.
pub fn archive_completed(board: &mut Board) -> usize {
    let mut moved = 0;
    for lane in &mut board.children {
        let (done, open): (Vec<Item>, Vec<Item>) = std::mem::take(&mut lane.children)
            .into_iter()
            .partition(|item| item.is_complete);
        lane.children = open;
        moved += done.len();
        board.archive.extend(done);
    }
    moved
}

/// Look an item up by id, falling back to the first exact title match.
pub fn resolve_item<'a>(board: &'a Board, selector: &str) -> Option<&'a Item> {
    find_item(board, selector).or_else(|| {
        board
            .children
            .iter()
            .flat_map(|lane| walk_items(&lane.children))
            .map(|(_, item)| item)
            .find(|item| item.title == selector)
    })
}

/// Look a lane up by id, falling back to the first exact title match.
pub fn resolve_lane<'a>(board: &'a Board, selector: &str) -> Option<&'a Lane> {
    find_lane(board, selector).or_else(|| board.children.iter().find(|l| l.title == selector))
}

/// Pre-order traversal yielding `(depth, item)`.
pub fn walk_items(items: &[Item]) -> Vec<(usize, &Item)> {
    let mut out = Vec::new();
    walk_into(items, 0, &mut out);
    out
}

fn walk_into<'a>(items: &'a [Item], depth: usize, out: &mut Vec<(usize, &'a Item)>) {
    for item in items {
        out.push((depth, item));
        walk_into(&item.children, depth + 1, out);
    }
}

fn relevel(item: &mut Item, depth: usize) {
    item.level = depth;
    for child in &mut item.children {
        relevel(child, depth + 1);
    }
}
