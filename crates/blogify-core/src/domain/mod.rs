//! Domain entities - the core business objects.

mod identity;

mod post;

pub use identity::{Identity, ProfileUpdate, mask_email};
pub use post::{
    ANONYMOUS_AUTHOR, CONTENT_MAX_CHARS, NewPost, Post, PostPatch, TITLE_MAX_CHARS,
    sort_newest_first, validate_content, validate_title,
};
