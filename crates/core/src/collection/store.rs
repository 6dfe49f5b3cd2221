use serde::Serialize;
use serde_json::{Map, Value};

use crate::block::{validate, Block, BlockContent, BlockType, ValidationError};
use crate::document::id::{BlockId, GuideId};

/// Result of a mutation addressed at a single block.
///
/// A missing block is not an error: another edit may already have removed it,
/// so callers treat [`Change::NotFound`] as already-reconciled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Change {
    Applied,
    NotFound,
}

impl Change {
    pub fn is_applied(self) -> bool {
        matches!(self, Change::Applied)
    }
}

/// Value-comparable capture of one block, without timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSnapshot {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub order: u32,
    pub content: BlockContent,
}

/// In-memory block set for one editing session.
///
/// Blocks are kept in insertion order; readers never rely on that order except
/// as the tie-breaker when two blocks of the same guide share an `order`.
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: Vec<Block>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from previously persisted blocks.
    pub fn load(blocks: impl IntoIterator<Item = Block>) -> Self {
        Self {
            blocks: blocks.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Append a block to `parent_id`, after every existing block of that guide.
    ///
    /// Content defaults to [`BlockContent::default_for`] when omitted; supplied
    /// content must belong to `block_type` and pass validation.
    pub fn add(
        &mut self,
        parent_id: GuideId,
        block_type: BlockType,
        content: Option<BlockContent>,
    ) -> Result<&Block, ValidationError> {
        let content = match content {
            Some(content) => validate(block_type, content)?,
            None => BlockContent::default_for(block_type),
        };
        let order = self
            .blocks
            .iter()
            .filter(|b| b.parent_id == parent_id)
            .map(|b| b.order)
            .max()
            .map_or(0, |max| max.saturating_add(1));

        let block = Block::new(parent_id, content, order);
        tracing::debug!(block_id = %block.id, %parent_id, %block_type, order, "block added");
        self.blocks.push(block);
        Ok(&self.blocks[self.blocks.len() - 1])
    }

    /// Like [`BlockStore::add`], for host input where the type tag and the
    /// content are still raw.
    pub fn add_raw(
        &mut self,
        parent_id: GuideId,
        type_tag: &str,
        content: Option<Value>,
    ) -> Result<&Block, ValidationError> {
        let block_type: BlockType = type_tag.parse()?;
        let content = content
            .map(|raw| BlockContent::from_json(block_type, raw))
            .transpose()?;
        self.add(parent_id, block_type, content)
    }

    /// Shallow-merge `partial` into the block's content.
    ///
    /// The merged content is re-parsed as the block's own variant and
    /// validated; on failure the block is left untouched.
    pub fn update(
        &mut self,
        id: BlockId,
        partial: &Map<String, Value>,
    ) -> Result<Change, ValidationError> {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            tracing::debug!(block_id = %id, "update skipped: block not found");
            return Ok(Change::NotFound);
        };
        let merged = block.content.merge(partial)?;
        block.set_content(merged);
        Ok(Change::Applied)
    }

    /// Delete a block. Siblings keep their `order` values; gaps are allowed.
    pub fn remove(&mut self, id: BlockId) -> Change {
        match self.blocks.iter().position(|b| b.id == id) {
            Some(index) => {
                let block = self.blocks.remove(index);
                tracing::debug!(block_id = %id, parent_id = %block.parent_id, "block removed");
                Change::Applied
            }
            None => {
                tracing::debug!(block_id = %id, "remove skipped: block not found");
                Change::NotFound
            }
        }
    }

    /// Blocks of `parent_id` in display order.
    ///
    /// Sorted by `order` ascending; equal orders keep insertion order.
    pub fn list_for(&self, parent_id: GuideId) -> Vec<&Block> {
        self.scoped_positions(parent_id)
            .into_iter()
            .map(|pos| &self.blocks[pos])
            .collect()
    }

    /// Renumber one guide's blocks to `0..n` in display order.
    ///
    /// Returns the ids whose `order` changed; only those get a fresh
    /// `updated_at`.
    pub fn compact(&mut self, parent_id: GuideId) -> Vec<BlockId> {
        let mut changed = Vec::new();
        for (index, pos) in self.scoped_positions(parent_id).into_iter().enumerate() {
            let block = &mut self.blocks[pos];
            if block.set_order(index as u32) {
                changed.push(block.id);
            }
        }
        changed
    }

    /// Value-comparable view of one guide's blocks in display order.
    pub fn snapshot(&self, parent_id: GuideId) -> Vec<BlockSnapshot> {
        self.list_for(parent_id)
            .into_iter()
            .map(|b| BlockSnapshot {
                id: b.id,
                block_type: b.block_type,
                order: b.order,
                content: b.content.clone(),
            })
            .collect()
    }

    /// Positions into `self.blocks` for `parent_id`, sorted for display.
    pub(crate) fn scoped_positions(&self, parent_id: GuideId) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent_id == parent_id)
            .map(|(pos, _)| pos)
            .collect();
        // sort_by_key is stable, so insertion order breaks ties.
        positions.sort_by_key(|&pos| self.blocks[pos].order);
        positions
    }

    pub(crate) fn block_id_at(&self, pos: usize) -> BlockId {
        self.blocks[pos].id
    }

    pub(crate) fn block_order_at(&self, pos: usize) -> u32 {
        self.blocks[pos].order
    }

    pub(crate) fn block_mut(&mut self, pos: usize) -> &mut Block {
        &mut self.blocks[pos]
    }
}
