//! Block content taxonomy: the seven block variants, their defaults and
//! their validation rules.

pub mod content;
pub mod model;
pub mod validate;

pub use content::{BlockContent, BlockType};
pub use model::Block;
pub use validate::{validate, Validate, ValidationError};

