//! Identifier generation for board entities.
//!
//! Ids are opaque and only need to be unique within one in-memory board.
//! They are regenerated on every parse, so nothing may hold on to an id
//! across a reparse. `SequentialIds` makes that regeneration deterministic:
//! the same text always yields the same ids, which is what lets the CLI
//! address cards by id across invocations.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Board,
    Lane,
    Item,
}

impl IdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Board => "b",
            Self::Lane => "l",
            Self::Item => "i",
        }
    }
}

pub trait IdGenerator {
    fn next_id(&mut self, kind: IdKind) -> String;
}

/// Monotonic counter shared by all entity kinds: `b0`, `l1`, `i2`, ...
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, kind: IdKind) -> String {
        let n = self.next;
        self.next += 1;
        format!("{}{n}", kind.prefix())
    }
}

/// UUID v4 ids, for hosts holding several boards that must not share ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self, kind: IdKind) -> String {
        format!("{}-{}", kind.prefix(), Uuid::new_v4().simple())
    }
}
