use std::collections::HashSet;

use ratatui::widgets::ListState;

use crate::model::{Board, Item};
use crate::session::BoardCommand;

/// A flattened card row for display.
#[derive(Debug, Clone)]
pub struct CardRow {
    pub id: String,
    pub title: String,
    pub is_complete: bool,
    pub depth: usize,
    pub has_children: bool,
    pub is_last_at_depth: Vec<bool>,
    /// Position among the lane's top-level cards, for depth-0 rows.
    pub top_index: Option<usize>,
}

pub struct LaneColumn {
    pub id: String,
    pub title: String,
    pub rows: Vec<CardRow>,
    pub cursor: usize,
    pub list_state: ListState,
    pub done: usize,
    pub total: usize,
    /// Number of top-level cards.
    pub len: usize,
}

impl LaneColumn {
    pub fn selected(&self) -> Option<&CardRow> {
        self.rows.get(self.cursor)
    }

    fn clamp_cursor(&mut self) {
        if self.rows.is_empty() {
            self.cursor = 0;
            self.list_state.select(None);
        } else {
            if self.cursor >= self.rows.len() {
                self.cursor = self.rows.len() - 1;
            }
            self.list_state.select(Some(self.cursor));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Help,
    ConfirmArchive,
}

pub struct App {
    pub lanes: Vec<LaneColumn>,
    pub lane_cursor: usize,
    pub collapsed: HashSet<String>,
    pub mode: Mode,
    pub error: Option<String>,
    pub status: Option<String>,
    pub archived: usize,
    /// Board-level problems, e.g. the file could not be read.
    pub board_errors: Vec<String>,
    /// Card to select on the next refresh, wherever it ends up.
    focus: Option<String>,
}

impl App {
    pub fn new(board: &Board) -> Self {
        let mut app = App {
            lanes: Vec::new(),
            lane_cursor: 0,
            collapsed: HashSet::new(),
            mode: Mode::Normal,
            error: None,
            status: None,
            archived: 0,
            board_errors: Vec::new(),
            focus: None,
        };
        app.refresh(board);
        app
    }

    /// Rebuild columns from `board`, keeping the selection on the same card
    /// where it still exists.
    pub fn refresh(&mut self, board: &Board) {
        let focus = self.focus.take().or_else(|| self.selected_id().map(str::to_string));
        let old_cursors: Vec<(String, usize)> =
            self.lanes.iter().map(|l| (l.id.clone(), l.cursor)).collect();

        self.lanes = board
            .children
            .iter()
            .map(|lane| {
                let mut rows = Vec::new();
                flatten_items(&mut rows, &lane.children, &self.collapsed, 0, &mut Vec::new());
                let cursor = old_cursors
                    .iter()
                    .find(|(id, _)| *id == lane.id)
                    .map(|(_, c)| *c)
                    .unwrap_or(0);
                let mut column = LaneColumn {
                    id: lane.id.clone(),
                    title: lane.title.clone(),
                    rows,
                    cursor,
                    list_state: ListState::default(),
                    done: lane.children.iter().map(count_done).sum(),
                    total: lane.children.iter().map(Item::subtree_len).sum(),
                    len: lane.children.len(),
                };
                column.clamp_cursor();
                column
            })
            .collect();
        self.archived = board.archive.len();
        self.board_errors = board.errors.clone();

        if self.lane_cursor >= self.lanes.len() {
            self.lane_cursor = self.lanes.len().saturating_sub(1);
        }
        if let Some(id) = focus {
            self.select(&id);
        }
    }

    /// Select the card with `id` if it is visible.
    pub fn select(&mut self, id: &str) -> bool {
        for (lane_idx, lane) in self.lanes.iter_mut().enumerate() {
            if let Some(pos) = lane.rows.iter().position(|r| r.id == id) {
                lane.cursor = pos;
                lane.list_state.select(Some(pos));
                self.lane_cursor = lane_idx;
                return true;
            }
        }
        false
    }

    pub fn focus_after_refresh(&mut self, id: impl Into<String>) {
        self.focus = Some(id.into());
    }

    pub fn current_lane(&self) -> Option<&LaneColumn> {
        self.lanes.get(self.lane_cursor)
    }

    pub fn selected(&self) -> Option<&CardRow> {
        self.current_lane().and_then(LaneColumn::selected)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected().map(|r| r.id.as_str())
    }

    pub fn move_up(&mut self) {
        if let Some(lane) = self.lanes.get_mut(self.lane_cursor) {
            if lane.cursor > 0 {
                lane.cursor -= 1;
                lane.list_state.select(Some(lane.cursor));
            }
        }
    }

    pub fn move_down(&mut self) {
        if let Some(lane) = self.lanes.get_mut(self.lane_cursor) {
            if !lane.rows.is_empty() && lane.cursor < lane.rows.len() - 1 {
                lane.cursor += 1;
                lane.list_state.select(Some(lane.cursor));
            }
        }
    }

    pub fn move_left(&mut self) {
        if self.lane_cursor > 0 {
            self.lane_cursor -= 1;
        }
    }

    pub fn move_right(&mut self) {
        if self.lane_cursor + 1 < self.lanes.len() {
            self.lane_cursor += 1;
        }
    }

    /// Returns true if the row set changed and columns need rebuilding.
    pub fn toggle_collapse(&mut self) -> bool {
        let Some(row) = self.selected() else {
            return false;
        };
        if !row.has_children {
            return false;
        }
        let id = row.id.clone();
        if !self.collapsed.remove(&id) {
            self.collapsed.insert(id);
        }
        true
    }

    pub fn toggle_help(&mut self) {
        self.mode = match self.mode {
            Mode::Help => Mode::Normal,
            _ => Mode::Help,
        };
    }

    pub fn toggle_complete(&self) -> Option<BoardCommand> {
        let row = self.selected()?;
        Some(BoardCommand::SetComplete {
            card_id: row.id.clone(),
            value: !row.is_complete,
        })
    }

    /// Move the selected card to the end of the lane `offset` columns away.
    pub fn move_to_lane(&self, offset: isize) -> Option<BoardCommand> {
        let row = self.selected()?;
        let target = self.lane_cursor.checked_add_signed(offset)?;
        let lane = self.lanes.get(target)?;
        if target == self.lane_cursor {
            return None;
        }
        Some(BoardCommand::Move {
            card_id: row.id.clone(),
            target_lane_id: lane.id.clone(),
            target_index: lane.len,
        })
    }

    /// Swap the selected top-level card with its neighbour.
    pub fn reorder(&self, offset: isize) -> Option<BoardCommand> {
        let lane = self.current_lane()?;
        let row = lane.selected()?;
        let index = row.top_index?.checked_add_signed(offset)?;
        if index >= lane.len {
            return None;
        }
        Some(BoardCommand::Move {
            card_id: row.id.clone(),
            target_lane_id: lane.id.clone(),
            target_index: index,
        })
    }
}

fn count_done(item: &Item) -> usize {
    usize::from(item.is_complete) + item.children.iter().map(count_done).sum::<usize>()
}

fn flatten_items(
    rows: &mut Vec<CardRow>,
    items: &[Item],
    collapsed: &HashSet<String>,
    depth: usize,
    is_last_at_depth: &mut Vec<bool>,
) {
    for (i, item) in items.iter().enumerate() {
        is_last_at_depth.push(i == items.len() - 1);
        let has_children = !item.children.is_empty();
        rows.push(CardRow {
            id: item.id.clone(),
            title: item.title.clone(),
            is_complete: item.is_complete,
            depth,
            has_children,
            is_last_at_depth: is_last_at_depth.clone(),
            top_index: (depth == 0).then_some(i),
        });
        if has_children && !collapsed.contains(&item.id) {
            flatten_items(rows, &item.children, collapsed, depth + 1, is_last_at_depth);
        }
        is_last_at_depth.pop();
    }
}
