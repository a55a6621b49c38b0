//! One service per Chatter entity, each a closed set of operations.

pub mod comment_service;
pub mod file_service;
pub mod flag_service;
pub mod forum_service;

pub use comment_service::{CommentOperation, CommentService};
pub use file_service::{FileOperation, FileService};
pub use flag_service::{FlagOperation, FlagService};
pub use forum_service::{ForumOperation, ForumService};
