//! Publish workflow: slug assignment and uniqueness checks.

use std::collections::HashSet;
use std::future::Future;

use thiserror::Error;

use super::model::Guide;
use crate::slug::{generate_slug, suggest_slug, Slug, SlugError};

/// Paths the host application routes itself; never assignable to a guide.
pub const RESERVED_SLUGS: [&str; 6] = ["api", "admin", "guest", "dashboard", "settings", "g"];

pub fn is_reserved_slug(candidate: &str) -> bool {
    RESERVED_SLUGS.contains(&candidate)
}

/// Answers whether a slug already belongs to another guide.
pub trait SlugRegistry {
    fn is_slug_taken(&self, candidate: &str) -> impl Future<Output = anyhow::Result<bool>> + Send;
}

impl SlugRegistry for HashSet<String> {
    async fn is_slug_taken(&self, candidate: &str) -> anyhow::Result<bool> {
        Ok(self.contains(candidate))
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("invalid slug '{slug}': {source}")]
    InvalidSlug {
        slug: String,
        #[source]
        source: SlugError,
    },
    #[error("slug '{slug}' is already taken, try '{suggestion}'")]
    SlugTaken { slug: String, suggestion: String },
    #[error("slug availability check failed: {0:#}")]
    Registry(anyhow::Error),
}

impl Guide {
    /// Publish the guide, assigning a slug if it has none yet.
    ///
    /// An already-assigned slug is kept and `candidate` is ignored. Otherwise
    /// `candidate` (or, when absent, a slug derived from the title) must be
    /// valid, not reserved and not taken according to `registry`.
    pub async fn publish<R: SlugRegistry>(
        &mut self,
        candidate: Option<&str>,
        registry: &R,
    ) -> Result<Slug, PublishError> {
        if let Some(existing) = self.slug.clone() {
            self.is_published = true;
            self.touch();
            tracing::info!(guide_id = %self.id, slug = %existing, "guide republished");
            return Ok(existing);
        }

        let raw = match candidate.map(str::trim).filter(|c| !c.is_empty()) {
            Some(candidate) => candidate.to_string(),
            None => generate_slug(&self.title),
        };
        let slug = Slug::parse(&raw).map_err(|source| PublishError::InvalidSlug {
            slug: raw.clone(),
            source,
        })?;

        let taken = is_reserved_slug(slug.as_str())
            || registry
                .is_slug_taken(slug.as_str())
                .await
                .map_err(PublishError::Registry)?;
        if taken {
            let suggestion = suggest_slug(slug.as_str());
            tracing::debug!(guide_id = %self.id, %slug, %suggestion, "slug unavailable");
            return Err(PublishError::SlugTaken {
                slug: slug.into(),
                suggestion,
            });
        }

        self.slug = Some(slug.clone());
        self.is_published = true;
        self.touch();
        tracing::info!(guide_id = %self.id, %slug, "guide published");
        Ok(slug)
    }

    /// Take the guide offline. The slug stays reserved for this guide.
    pub fn unpublish(&mut self) -> bool {
        if !self.is_published {
            return false;
        }
        self.is_published = false;
        self.touch();
        tracing::info!(guide_id = %self.id, "guide unpublished");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::is_valid_slug;
    use tokio_test::{assert_err, assert_ok};

    struct Unreachable;

    impl SlugRegistry for Unreachable {
        async fn is_slug_taken(&self, _candidate: &str) -> anyhow::Result<bool> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    fn taken(slugs: &[&str]) -> HashSet<String> {
        slugs.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn publishes_with_a_slug_derived_from_the_title() {
        let mut guide = Guide::new("Hello World").unwrap();
        let slug = assert_ok!(guide.publish(None, &taken(&[])).await);
        assert_eq!(slug.as_str(), "hello-world");
        assert!(guide.is_published());
        assert_eq!(guide.slug(), Some(&slug));
    }

    #[tokio::test]
    async fn explicit_candidate_is_trimmed_and_validated() {
        let mut guide = Guide::new("Cabin").unwrap();
        let err = assert_err!(guide.publish(Some("Bad Slug"), &taken(&[])).await);
        assert!(matches!(
            err,
            PublishError::InvalidSlug {
                source: SlugError::InvalidChar('B'),
                ..
            }
        ));
        assert!(!guide.is_published());

        let slug = assert_ok!(guide.publish(Some("  my-cabin "), &taken(&[])).await);
        assert_eq!(slug.as_str(), "my-cabin");
    }

    #[tokio::test]
    async fn taken_and_reserved_slugs_come_with_a_suggestion() {
        let mut guide = Guide::new("Cabin").unwrap();
        let registry = taken(&["beach-house"]);

        for candidate in ["beach-house", "admin"] {
            match guide.publish(Some(candidate), &registry).await {
                Err(PublishError::SlugTaken { slug, suggestion }) => {
                    assert_eq!(slug, candidate);
                    assert!(is_valid_slug(&suggestion));
                    assert!(suggestion.starts_with(candidate));
                }
                other => panic!("expected SlugTaken, got {other:?}"),
            }
        }
        assert!(guide.slug().is_none());
    }

    #[tokio::test]
    async fn slug_is_assigned_once() {
        let mut guide = Guide::new("Cabin").unwrap();
        let first = guide.publish(Some("first-slug"), &taken(&[])).await.unwrap();

        assert!(guide.unpublish());
        assert!(!guide.is_published());
        assert_eq!(guide.slug(), Some(&first));
        assert!(!guide.unpublish());

        let again = guide.publish(Some("other-slug"), &taken(&[])).await.unwrap();
        assert_eq!(again, first);
        assert!(guide.is_published());
    }

    #[tokio::test]
    async fn registry_failures_are_surfaced() {
        let mut guide = Guide::new("Cabin").unwrap();
        let err = assert_err!(guide.publish(None, &Unreachable).await);
        assert!(err.to_string().contains("connection refused"));
        assert!(!guide.is_published());
    }
}
