use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::{BlockContent, BlockType};
use super::validate::ValidationError;
use crate::document::id::{BlockId, GuideId};

/// One typed content unit inside a guide.
///
/// `id`, `parent_id` and `block_type` never change after creation; `order`
/// only moves through reorder/compact, and `updated_at` is refreshed on every
/// content or order change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawBlock")]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) parent_id: GuideId,
    #[serde(rename = "type")]
    pub(crate) block_type: BlockType,
    pub(crate) order: u32,
    pub(crate) content: BlockContent,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Block {
    pub(crate) fn new(parent_id: GuideId, content: BlockContent, order: u32) -> Self {
        let now = Utc::now();
        Self {
            id: BlockId::new(),
            parent_id,
            block_type: content.block_type(),
            order,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn parent_id(&self) -> GuideId {
        self.parent_id
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn content(&self) -> &BlockContent {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn set_order(&mut self, order: u32) -> bool {
        if self.order == order {
            return false;
        }
        self.order = order;
        self.updated_at = Utc::now();
        true
    }

    pub(crate) fn set_content(&mut self, content: BlockContent) {
        self.content = content;
        self.updated_at = Utc::now();
    }
}

/// Wire form of a block: content stays raw until the type is known.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlock {
    id: BlockId,
    parent_id: GuideId,
    #[serde(rename = "type")]
    block_type: BlockType,
    order: u32,
    #[serde(default)]
    content: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RawBlock> for Block {
    type Error = ValidationError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            parent_id: raw.parent_id,
            block_type: raw.block_type,
            order: raw.order,
            content: BlockContent::from_json(raw.block_type, raw.content)?,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}
