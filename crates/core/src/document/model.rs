use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::GuideId;
use super::validate::{validate_description, validate_title};
use crate::block::{Validate, ValidationError};
use crate::slug::Slug;

pub const DEFAULT_PRIMARY_COLOR: &str = "#3B82F6";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";
pub const DEFAULT_FONT_FAMILY: &str = "Pretendard";

/// A guest guide: the container that owns an ordered list of blocks.
///
/// Created unpublished and without a slug. The slug is assigned by the first
/// successful publish and survives later unpublish/publish cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guide {
    pub(crate) id: GuideId,
    pub(crate) title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) slug: Option<Slug>,
    #[serde(default)]
    pub(crate) is_published: bool,
    #[serde(default)]
    pub(crate) theme: Theme,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Guide {
    pub fn new(title: impl Into<String>) -> Result<Self, ValidationError> {
        let title = title.into();
        validate_title(&title)?;
        let now = Utc::now();
        Ok(Self {
            id: GuideId::new(),
            title,
            description: None,
            slug: None,
            is_published: false,
            theme: Theme::default(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> GuideId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn slug(&self) -> Option<&Slug> {
        self.slug.as_ref()
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn rename(&mut self, title: impl Into<String>) -> Result<(), ValidationError> {
        let title = title.into();
        validate_title(&title)?;
        self.title = title;
        self.touch();
        Ok(())
    }

    /// Blank descriptions are stored as `None`.
    pub fn set_description(&mut self, description: Option<String>) -> Result<(), ValidationError> {
        let description = description.filter(|d| !d.trim().is_empty());
        validate_description(description.as_deref())?;
        self.description = description;
        self.touch();
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), ValidationError> {
        theme.validate()?;
        self.theme = theme;
        self.touch();
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Visual settings applied to the published guide page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub primary_color: String,
    pub background_color: String,
    pub font_family: String,
    pub border_radius: BorderRadius,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            border_radius: BorderRadius::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderRadius {
    None,
    Sm,
    #[default]
    Md,
    Lg,
    Full,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_guides_start_unpublished_with_default_theme() {
        let guide = Guide::new("Seaside Cabin").unwrap();
        assert_eq!(guide.title(), "Seaside Cabin");
        assert!(!guide.is_published());
        assert!(guide.slug().is_none());
        assert_eq!(guide.theme().primary_color, "#3B82F6");
        assert_eq!(guide.theme().border_radius, BorderRadius::Md);
    }

    #[test]
    fn title_must_be_present_and_bounded() {
        assert!(matches!(
            Guide::new("   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            Guide::new("t".repeat(101)),
            Err(ValidationError::TooLong { max: 100, .. })
        ));

        let mut guide = Guide::new("ok").unwrap();
        assert!(guide.rename("").is_err());
        assert_eq!(guide.title(), "ok");
    }

    #[test]
    fn blank_description_clears_it() {
        let mut guide = Guide::new("Cabin").unwrap();
        guide.set_description(Some("Near the beach".into())).unwrap();
        assert_eq!(guide.description(), Some("Near the beach"));
        guide.set_description(Some("  ".into())).unwrap();
        assert_eq!(guide.description(), None);
        assert!(guide.set_description(Some("d".repeat(501))).is_err());
    }

    #[test]
    fn invalid_theme_is_rejected_without_side_effects() {
        let mut guide = Guide::new("Cabin").unwrap();
        let theme = Theme {
            primary_color: "blue".into(),
            ..Theme::default()
        };
        assert!(matches!(
            guide.set_theme(theme),
            Err(ValidationError::InvalidColor { .. })
        ));
        assert_eq!(guide.theme(), &Theme::default());
    }

    #[test]
    fn theme_fills_missing_fields_from_defaults() {
        let theme: Theme = serde_json::from_value(json!({ "borderRadius": "full" })).unwrap();
        assert_eq!(theme.border_radius, BorderRadius::Full);
        assert_eq!(theme.font_family, "Pretendard");
        assert_eq!(theme.background_color, "#FFFFFF");
    }

    #[test]
    fn serializes_in_camel_case() {
        let guide = Guide::new("Cabin").unwrap();
        let value = serde_json::to_value(&guide).unwrap();
        assert_eq!(value["isPublished"], json!(false));
        assert_eq!(value["theme"]["primaryColor"], json!("#3B82F6"));
        assert!(value.get("slug").is_none());
    }
}
