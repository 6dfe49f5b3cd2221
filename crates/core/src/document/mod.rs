//! The guide document: identity, metadata, theme and publishing.

pub mod id;
pub mod model;
pub mod publish;
pub mod validate;

pub use id::{BlockId, GuideId, IdError};
pub use model::{BorderRadius, Guide, Theme};
pub use publish::{is_reserved_slug, PublishError, SlugRegistry, RESERVED_SLUGS};
