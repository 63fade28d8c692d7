//! Kanban boards stored as markdown.
//!
//! A board file is a list of `## ` lane headings, each followed by a nested
//! checkbox list. [`parse`] turns the text into a [`Board`] and [`serialize`]
//! turns it back; [`session::DocumentSession`] ties the two to a file on disk.

pub mod config;
pub mod ids;
pub mod model;
pub mod ops;
pub mod output;
pub mod parser;
pub mod serializer;
pub mod session;
pub mod settings;
pub mod tui;
pub mod validate;
pub mod watch;

pub use model::{Board, Frontmatter, Item, Lane};
pub use parser::{parse, parse_with};
pub use serializer::serialize;
