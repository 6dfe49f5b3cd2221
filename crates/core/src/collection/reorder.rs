//! Drag-and-drop reorder reconciliation.
//!
//! A move is expressed as `(active, over)` within one guide's display list.
//! Only blocks whose display index lies between the source and destination
//! are renumbered; everything else, including every block of other guides,
//! is left exactly as it was.
//!
//! The affected blocks take over the `order` values their slots held before
//! the move. On a contiguous `0..n` list that is the same as numbering them by
//! index, and it keeps the display order right when removals left gaps.

use super::store::BlockStore;
use crate::document::id::{BlockId, GuideId};

/// Outcome of [`BlockStore::reorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Reorder {
    /// The block moved from display index `from` to `to`. `changed` lists the
    /// blocks whose `order` was rewritten, in their new display order.
    Moved {
        from: usize,
        to: usize,
        changed: Vec<BlockId>,
    },
    /// Dropped onto its own position.
    Unchanged,
    /// One of the ids is gone or belongs to another guide.
    NotFound,
}

impl BlockStore {
    /// Move `active` to the display slot currently held by `over`.
    pub fn reorder(&mut self, parent_id: GuideId, active: BlockId, over: BlockId) -> Reorder {
        let mut scoped = self.scoped_positions(parent_id);
        let index_of = |id: BlockId| scoped.iter().position(|&pos| self.block_id_at(pos) == id);
        let (Some(from), Some(to)) = (index_of(active), index_of(over)) else {
            tracing::debug!(%parent_id, %active, %over, "reorder skipped: block not in guide");
            return Reorder::NotFound;
        };
        if from == to {
            return Reorder::Unchanged;
        }

        let (lo, hi) = (from.min(to), from.max(to));
        let slots: Vec<u32> = scoped[lo..=hi]
            .iter()
            .map(|&pos| self.block_order_at(pos))
            .collect();

        let moved = scoped.remove(from);
        scoped.insert(to, moved);

        let mut changed = Vec::new();
        for (&pos, order) in scoped[lo..=hi].iter().zip(slots) {
            let block = self.block_mut(pos);
            if block.set_order(order) {
                changed.push(block.id());
            }
        }
        tracing::debug!(%parent_id, %active, from, to, changed = changed.len(), "blocks reordered");
        Reorder::Moved { from, to, changed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockType};

    struct Fixture {
        store: BlockStore,
        guide: GuideId,
        ids: Vec<BlockId>,
    }

    fn guide_with(n: usize) -> Fixture {
        let mut store = BlockStore::new();
        let guide = GuideId::new();
        let ids = (0..n)
            .map(|_| store.add(guide, BlockType::Notice, None).unwrap().id())
            .collect();
        Fixture { store, guide, ids }
    }

    fn display(store: &BlockStore, guide: GuideId) -> Vec<BlockId> {
        store.list_for(guide).iter().map(|b| b.id()).collect()
    }

    fn orders(store: &BlockStore, guide: GuideId) -> Vec<u32> {
        store.list_for(guide).iter().map(|b| b.order()).collect()
    }

    #[test]
    fn moving_down_shifts_the_range_up() {
        let Fixture { mut store, guide, ids } = guide_with(5);

        let outcome = store.reorder(guide, ids[1], ids[3]);
        assert_eq!(
            outcome,
            Reorder::Moved {
                from: 1,
                to: 3,
                changed: vec![ids[2], ids[3], ids[1]],
            }
        );
        assert_eq!(display(&store, guide), vec![ids[0], ids[2], ids[3], ids[1], ids[4]]);
        assert_eq!(orders(&store, guide), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn moving_up_shifts_the_range_down() {
        let Fixture { mut store, guide, ids } = guide_with(4);

        assert!(matches!(store.reorder(guide, ids[3], ids[0]), Reorder::Moved { .. }));
        assert_eq!(display(&store, guide), vec![ids[3], ids[0], ids[1], ids[2]]);
        assert_eq!(orders(&store, guide), vec![0, 1, 2, 3]);
    }

    #[test]
    fn dropping_on_itself_changes_nothing() {
        let Fixture { mut store, guide, ids } = guide_with(3);
        let before: Vec<Block> = store.list_for(guide).into_iter().cloned().collect();

        assert_eq!(store.reorder(guide, ids[1], ids[1]), Reorder::Unchanged);

        let after: Vec<Block> = store.list_for(guide).into_iter().cloned().collect();
        assert_eq!(after, before);
    }

    #[test]
    fn blocks_outside_the_range_are_untouched() {
        let Fixture { mut store, guide, ids } = guide_with(6);
        let before: Vec<Block> = ids.iter().map(|&id| store.get(id).unwrap().clone()).collect();

        let _ = store.reorder(guide, ids[4], ids[2]);

        for i in [0, 1, 5] {
            assert_eq!(store.get(ids[i]).unwrap(), &before[i], "block {i} was modified");
        }
        for i in [2, 3, 4] {
            assert_ne!(store.get(ids[i]).unwrap().order(), before[i].order());
        }
    }

    #[test]
    fn other_guides_are_isolated() {
        let Fixture { mut store, guide, ids } = guide_with(3);
        let other = GuideId::new();
        let foreign: Vec<BlockId> = (0..3)
            .map(|_| store.add(other, BlockType::Hero, None).unwrap().id())
            .collect();
        let foreign_before: Vec<Block> = store.list_for(other).into_iter().cloned().collect();

        let _ = store.reorder(guide, ids[0], ids[2]);
        assert_eq!(store.reorder(guide, ids[0], foreign[1]), Reorder::NotFound);
        assert_eq!(store.reorder(other, ids[0], foreign[1]), Reorder::NotFound);

        let foreign_after: Vec<Block> = store.list_for(other).into_iter().cloned().collect();
        assert_eq!(foreign_after, foreign_before);
    }

    #[test]
    fn removed_block_is_a_no_op() {
        let Fixture { mut store, guide, ids } = guide_with(3);
        assert!(store.remove(ids[1]).is_applied());
        assert_eq!(store.reorder(guide, ids[1], ids[0]), Reorder::NotFound);
        assert_eq!(store.reorder(guide, ids[0], ids[1]), Reorder::NotFound);
    }

    #[test]
    fn gaps_before_the_range_keep_display_order() {
        let Fixture { mut store, guide, ids } = guide_with(5);
        assert!(store.remove(ids[0]).is_applied());
        assert!(store.remove(ids[1]).is_applied());
        let leading = store.get(ids[2]).unwrap().clone();

        // Display list is [ids[2] (2), ids[3] (3), ids[4] (4)].
        let outcome = store.reorder(guide, ids[4], ids[3]);
        assert_eq!(
            outcome,
            Reorder::Moved {
                from: 2,
                to: 1,
                changed: vec![ids[4], ids[3]],
            }
        );
        assert_eq!(display(&store, guide), vec![ids[2], ids[4], ids[3]]);
        assert_eq!(orders(&store, guide), vec![2, 3, 4]);
        assert_eq!(store.get(ids[2]).unwrap(), &leading);
    }

    #[test]
    fn gaps_inside_the_range_are_preserved() {
        let Fixture { mut store, guide, ids } = guide_with(5);
        assert!(store.remove(ids[2]).is_applied());

        // Display list is [ids[0] (0), ids[1] (1), ids[3] (3), ids[4] (4)].
        let _ = store.reorder(guide, ids[0], ids[3]);

        assert_eq!(display(&store, guide), vec![ids[1], ids[3], ids[0], ids[4]]);
        assert_eq!(orders(&store, guide), vec![0, 1, 3, 4]);
    }
}
