use serde::{Deserialize, Serialize};

use crate::block::BlockType;
use crate::document::{BlockId, GuideId};

/// Events emitted after each successful editing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditorEvent {
    BlockAdded {
        guide_id: GuideId,
        block_id: BlockId,
        block_type: BlockType,
        order: u32,
    },
    BlockUpdated {
        guide_id: GuideId,
        block_id: BlockId,
    },
    BlockRemoved {
        guide_id: GuideId,
        block_id: BlockId,
    },
    BlocksReordered {
        guide_id: GuideId,
        block_id: BlockId,
        from: usize,
        to: usize,
        /// Blocks whose `order` was rewritten, in display order.
        changed: Vec<BlockId>,
    },
    /// Orders renumbered to `0..n`; only blocks whose order changed.
    BlocksCompacted {
        guide_id: GuideId,
        changed: Vec<BlockId>,
    },
    /// Title, description or theme changed.
    GuideUpdated { guide_id: GuideId },
    Published { guide_id: GuideId, slug: String },
    Unpublished { guide_id: GuideId },
}

impl EditorEvent {
    pub fn guide_id(&self) -> GuideId {
        match self {
            Self::BlockAdded { guide_id, .. }
            | Self::BlockUpdated { guide_id, .. }
            | Self::BlockRemoved { guide_id, .. }
            | Self::BlocksReordered { guide_id, .. }
            | Self::BlocksCompacted { guide_id, .. }
            | Self::GuideUpdated { guide_id }
            | Self::Published { guide_id, .. }
            | Self::Unpublished { guide_id } => *guide_id,
        }
    }
}
