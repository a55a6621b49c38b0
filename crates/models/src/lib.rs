//! Chatter domain records and the entity descriptors the store adapter needs.
//!
//! Every record serializes to a flat attribute map (camelCase names); absent
//! optional attributes are omitted rather than written as `null`.

pub mod errors;
pub mod entity;
pub mod forum;
pub mod comment;
pub mod flag;
pub mod file;

pub use comment::{Comment, FileLink};
pub use entity::{Entity, IndexSchema, Item, TableSchema};
pub use file::FileMetadata;
pub use flag::Flag;
pub use forum::Forum;
