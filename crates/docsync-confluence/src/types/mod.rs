//! Confluence REST API payload types.
//!
//! Only fields that are actually used are declared; serde ignores the rest.

mod attachment;
mod page;

pub use attachment::{Attachment, AttachmentList};
pub use page::{Ancestor, Content, ContentList, Version};
