//! One guide's editing session.
//!
//! [`EditorSession`] owns the guide, its blocks and the auto-save engine.
//! Every successful mutation publishes an [`EditorEvent`] and hands a fresh
//! [`GuideSnapshot`] to auto-save; no-op outcomes do neither.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::autosave::{AutoSave, AutoSaveConfig, AutoSaveError, AutoSaveState, Persist};
use crate::block::{Block, BlockContent, BlockType, ValidationError};
use crate::collection::{BlockSnapshot, BlockStore, Change, Reorder};
use crate::document::{BlockId, Guide, GuideId, PublishError, SlugRegistry, Theme};
use crate::events::{EditorEvent, EventBus};
use crate::slug::Slug;

/// Value-comparable capture of everything auto-save persists for a guide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideSnapshot {
    pub id: GuideId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub is_published: bool,
    pub theme: Theme,
    pub blocks: Vec<BlockSnapshot>,
}

impl GuideSnapshot {
    pub fn capture(guide: &Guide, store: &BlockStore) -> Self {
        Self {
            id: guide.id(),
            title: guide.title().to_string(),
            description: guide.description().map(str::to_string),
            slug: guide.slug().map(|s| s.as_str().to_string()),
            is_published: guide.is_published(),
            theme: guide.theme().clone(),
            blocks: store.snapshot(guide.id()),
        }
    }
}

/// Editing session for a single guide.
///
/// Mutations schedule auto-save timers, so they must run inside a tokio
/// runtime.
pub struct EditorSession<R> {
    guide: Guide,
    store: BlockStore,
    autosave: AutoSave<GuideSnapshot>,
    events: EventBus,
    registry: R,
}

impl<R: SlugRegistry> EditorSession<R> {
    /// Open a session; the guide and blocks as given count as already saved.
    pub fn open(
        guide: Guide,
        store: BlockStore,
        registry: R,
        persist: impl Persist<GuideSnapshot>,
        config: AutoSaveConfig,
        events: EventBus,
    ) -> Self {
        let autosave = AutoSave::new(GuideSnapshot::capture(&guide, &store), persist, config);
        tracing::info!(guide_id = %guide.id(), blocks = store.list_for(guide.id()).len(), "editing session opened");
        Self {
            guide,
            store,
            autosave,
            events,
            registry,
        }
    }

    pub fn guide(&self) -> &Guide {
        &self.guide
    }

    pub fn guide_id(&self) -> GuideId {
        self.guide.id()
    }

    /// Blocks in display order.
    pub fn blocks(&self) -> Vec<&Block> {
        self.store.list_for(self.guide.id())
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.store
            .get(id)
            .filter(|b| b.parent_id() == self.guide.id())
    }

    pub fn snapshot(&self) -> GuideSnapshot {
        GuideSnapshot::capture(&self.guide, &self.store)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn autosave(&self) -> &AutoSave<GuideSnapshot> {
        &self.autosave
    }

    pub fn save_state(&self) -> AutoSaveState {
        self.autosave.state()
    }

    pub fn add_block(
        &mut self,
        block_type: BlockType,
        content: Option<BlockContent>,
    ) -> Result<BlockId, ValidationError> {
        let (id, event) = block_added(self.store.add(self.guide.id(), block_type, content)?);
        self.commit(event);
        Ok(id)
    }

    /// [`EditorSession::add_block`] for untyped input such as a console line.
    pub fn add_block_raw(
        &mut self,
        type_tag: &str,
        content: Option<Value>,
    ) -> Result<BlockId, ValidationError> {
        let (id, event) = block_added(self.store.add_raw(self.guide.id(), type_tag, content)?);
        self.commit(event);
        Ok(id)
    }

    pub fn update_block(
        &mut self,
        id: BlockId,
        partial: &Map<String, Value>,
    ) -> Result<Change, ValidationError> {
        if self.block(id).is_none() {
            tracing::debug!(block_id = %id, "update skipped: block not in this guide");
            return Ok(Change::NotFound);
        }
        let change = self.store.update(id, partial)?;
        if change.is_applied() {
            self.commit(EditorEvent::BlockUpdated {
                guide_id: self.guide.id(),
                block_id: id,
            });
        }
        Ok(change)
    }

    pub fn remove_block(&mut self, id: BlockId) -> Change {
        if self.block(id).is_none() {
            tracing::debug!(block_id = %id, "remove skipped: block not in this guide");
            return Change::NotFound;
        }
        let change = self.store.remove(id);
        if change.is_applied() {
            self.commit(EditorEvent::BlockRemoved {
                guide_id: self.guide.id(),
                block_id: id,
            });
        }
        change
    }

    /// Drag-and-drop move of `active` onto the slot held by `over`.
    pub fn move_block(&mut self, active: BlockId, over: BlockId) -> Reorder {
        let guide_id = self.guide.id();
        let outcome = self.store.reorder(guide_id, active, over);
        if let Reorder::Moved { from, to, changed } = &outcome {
            self.commit(EditorEvent::BlocksReordered {
                guide_id,
                block_id: active,
                from: *from,
                to: *to,
                changed: changed.clone(),
            });
        }
        outcome
    }

    /// Close gaps left by removals.
    pub fn compact(&mut self) -> Vec<BlockId> {
        let guide_id = self.guide.id();
        let changed = self.store.compact(guide_id);
        if !changed.is_empty() {
            self.commit(EditorEvent::BlocksCompacted {
                guide_id,
                changed: changed.clone(),
            });
        }
        changed
    }

    pub fn rename(&mut self, title: impl Into<String>) -> Result<(), ValidationError> {
        self.guide.rename(title)?;
        self.guide_updated();
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) -> Result<(), ValidationError> {
        self.guide.set_description(description)?;
        self.guide_updated();
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), ValidationError> {
        self.guide.set_theme(theme)?;
        self.guide_updated();
        Ok(())
    }

    pub async fn publish(&mut self, candidate: Option<&str>) -> Result<Slug, PublishError> {
        let slug = self.guide.publish(candidate, &self.registry).await?;
        self.commit(EditorEvent::Published {
            guide_id: self.guide.id(),
            slug: slug.to_string(),
        });
        Ok(slug)
    }

    pub fn unpublish(&mut self) -> bool {
        let changed = self.guide.unpublish();
        if changed {
            self.commit(EditorEvent::Unpublished {
                guide_id: self.guide.id(),
            });
        }
        changed
    }

    pub async fn save_now(&self) -> Result<(), AutoSaveError> {
        self.autosave.save_now().await
    }

    pub async fn retry_save(&self) -> Result<(), AutoSaveError> {
        self.autosave.retry().await
    }

    /// Stop auto-save. Pending timers are cancelled; unsaved changes are not
    /// flushed, call [`EditorSession::save_now`] first for that.
    pub fn close(&self) {
        self.autosave.shutdown();
        tracing::info!(guide_id = %self.guide.id(), "editing session closed");
    }

    fn guide_updated(&mut self) {
        self.commit(EditorEvent::GuideUpdated {
            guide_id: self.guide.id(),
        });
    }

    fn commit(&mut self, event: EditorEvent) {
        self.events.publish(event);
        self.autosave.update(self.snapshot());
    }
}

fn block_added(block: &Block) -> (BlockId, EditorEvent) {
    let event = EditorEvent::BlockAdded {
        guide_id: block.parent_id(),
        block_id: block.id(),
        block_type: block.block_type(),
        order: block.order(),
    };
    (block.id(), event)
}
