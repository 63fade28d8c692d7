use serde::Serialize;

use crate::ids::{IdGenerator, IdKind};
use crate::settings::Settings;

/// A checkable card. Children are owned exclusively by their parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub is_complete: bool,
    /// Nesting depth. Informational only: the serializer derives indentation
    /// from tree position.
    pub level: usize,
    pub children: Vec<Item>,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>, is_complete: bool) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_complete,
            level: 0,
            children: Vec::new(),
        }
    }

    /// Returns display icon: x=complete, .=open
    pub fn icon(&self) -> &'static str {
        if self.is_complete {
            "x"
        } else {
            "."
        }
    }

    /// Number of items in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Item::subtree_len).sum::<usize>()
    }
}

/// A titled column of cards, from a `## ` heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lane {
    pub id: String,
    pub title: String,
    pub children: Vec<Item>,
}

impl Lane {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            children: Vec::new(),
        }
    }
}

/// The frontmatter block exactly as it appeared in the document, both `---`
/// fences included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frontmatter {
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub id: String,
    pub children: Vec<Lane>,
    pub settings: Settings,
    pub frontmatter: Option<Frontmatter>,
    pub archive: Vec<Item>,
    #[serde(skip)]
    pub is_searching: bool,
    #[serde(skip)]
    pub errors: Vec<String>,
}

impl Board {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
            settings: Settings::default(),
            frontmatter: None,
            archive: Vec::new(),
            is_searching: false,
            errors: Vec::new(),
        }
    }

    /// A board with no lanes, used when a document cannot be loaded.
    pub fn empty(ids: &mut dyn IdGenerator) -> Self {
        Self::new(ids.next_id(IdKind::Board))
    }

    /// Appends a new empty lane and returns its id.
    pub fn add_lane(&mut self, ids: &mut dyn IdGenerator, title: &str) -> String {
        let id = ids.next_id(IdKind::Lane);
        self.children.push(Lane::new(id.clone(), title.trim()));
        id
    }

    pub fn item_count(&self) -> usize {
        self.children
            .iter()
            .flat_map(|lane| lane.children.iter())
            .map(Item::subtree_len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    #[test]
    fn subtree_len_counts_descendants() {
        let mut parent = Item::new("i1", "parent", false);
        let mut child = Item::new("i2", "child", false);
        child.children.push(Item::new("i3", "grandchild", true));
        parent.children.push(child);
        parent.children.push(Item::new("i4", "sibling", false));
        assert_eq!(parent.subtree_len(), 4);
    }

    #[test]
    fn empty_board_has_no_lanes() {
        let board = Board::empty(&mut SequentialIds::default());
        assert_eq!(board.id, "b0");
        assert!(board.children.is_empty());
        assert!(board.frontmatter.is_none());
        assert_eq!(board.item_count(), 0);
    }

    #[test]
    fn add_lane_trims_title() {
        let mut ids = SequentialIds::default();
        let mut board = Board::empty(&mut ids);
        let id = board.add_lane(&mut ids, "  Doing ");
        assert_eq!(id, "l1");
        assert_eq!(board.children[0].title, "Doing");
    }

    #[test]
    fn transient_state_is_not_serialized() {
        let mut board = Board::new("b0");
        board.errors.push("oops".into());
        board.is_searching = true;
        let json = serde_json::to_value(&board).unwrap();
        assert!(json.get("errors").is_none());
        assert!(json.get("is_searching").is_none());
        assert!(json.get("archive").is_some());
    }
}
