//! File-backed drafts: one JSON document per guide.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use guidebook_core::autosave::{Persist, SaveFuture};
use guidebook_core::document::SlugRegistry;
use guidebook_core::{GuideId, GuideSnapshot};
use serde::Deserialize;
use tokio::fs;

/// Drafts directory. Each save replaces `<guide-id>.json` atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating drafts directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn draft_path(&self, id: GuideId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Write to a temporary sibling, then rename over the draft, so readers
    /// never see a half-written file.
    pub async fn write(&self, snapshot: &GuideSnapshot) -> anyhow::Result<()> {
        let path = self.draft_path(snapshot.id);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(snapshot).context("serializing draft")?;
        fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        tracing::debug!(path = %path.display(), blocks = snapshot.blocks.len(), "draft written");
        Ok(())
    }

    /// Slug registry answering for every draft except `own`.
    pub fn registry_for(&self, own: GuideId) -> DraftSlugs {
        DraftSlugs {
            dir: self.dir.clone(),
            own,
        }
    }
}

impl Persist<GuideSnapshot> for FileStore {
    fn save(&self, snapshot: GuideSnapshot) -> SaveFuture {
        let store = self.clone();
        Box::pin(async move { store.write(&snapshot).await })
    }
}

/// Slugs assigned to the other drafts in a directory.
///
/// A guide keeps its slug after unpublishing, so unpublished drafts still
/// hold theirs.
#[derive(Debug, Clone)]
pub struct DraftSlugs {
    dir: PathBuf,
    own: GuideId,
}

#[derive(Deserialize)]
struct DraftHeader {
    #[serde(default)]
    slug: Option<String>,
}

impl SlugRegistry for DraftSlugs {
    async fn is_slug_taken(&self, candidate: &str) -> anyhow::Result<bool> {
        let own = self.own.to_string();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("listing {}", self.dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension() != Some(OsStr::new("json"))
                || path.file_stem() == Some(OsStr::new(&own))
            {
                continue;
            }
            let parsed = fs::read(&path)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|bytes| Ok(serde_json::from_slice::<DraftHeader>(&bytes)?));
            let header = match parsed {
                Ok(header) => header,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable draft");
                    continue;
                }
            };
            if header.slug.as_deref() == Some(candidate) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
