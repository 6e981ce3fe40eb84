//! SQLite-backed accessors: person attributes and relationship edges.
//!
//! The match-search engine treats these as its two collaborators. Both are
//! plain reads over an already-bidirectional edge store; `relations` keeps
//! the store bidirectional by writing the inverse row on every insert.

pub mod persons;
pub mod relations;
