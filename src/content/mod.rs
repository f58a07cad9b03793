//! Content module - posts, pagination, rich text and reading time

pub mod loader;
pub mod pagination;
mod post;
pub mod reading_time;
pub mod richtext;

pub use loader::ContentLoader;
pub use pagination::{CursorState, PostPagination};
pub use post::{ContentBlock, PostDetail, PostSummary};
pub use richtext::{RichText, RichTextError};
