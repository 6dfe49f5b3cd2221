pub mod autosave;
pub mod block;
pub mod collection;
pub mod document;
pub mod events;
pub mod session;
pub mod slug;

pub use autosave::{AutoSave, AutoSaveConfig, AutoSaveError, AutoSaveState, Persist, SaveStatus};
pub use block::{Block, BlockContent, BlockType, ValidationError};
pub use collection::{BlockStore, Change, Reorder};
pub use document::{BlockId, Guide, GuideId, PublishError, SlugRegistry, Theme};
pub use events::{EditorEvent, EventBus};
pub use session::{EditorSession, GuideSnapshot};
pub use slug::{generate_slug, is_valid_slug, normalize_slug, Slug, SlugError};
