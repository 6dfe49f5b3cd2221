//! Per-variant block content shapes and their defaults.
//!
//! Content is a closed sum type: each [`BlockType`] owns exactly one struct,
//! and raw JSON is only ever parsed against the struct its type names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::validate::{Validate, ValidationError};

/// The closed set of block kinds a guide can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Hero,
    QuickInfo,
    Amenities,
    Map,
    Gallery,
    HostPick,
    Notice,
}

impl BlockType {
    pub const ALL: [BlockType; 7] = [
        BlockType::Hero,
        BlockType::QuickInfo,
        BlockType::Amenities,
        BlockType::Map,
        BlockType::Gallery,
        BlockType::HostPick,
        BlockType::Notice,
    ];

    /// Wire tag, e.g. `QUICK_INFO`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Hero => "HERO",
            BlockType::QuickInfo => "QUICK_INFO",
            BlockType::Amenities => "AMENITIES",
            BlockType::Map => "MAP",
            BlockType::Gallery => "GALLERY",
            BlockType::HostPick => "HOST_PICK",
            BlockType::Notice => "NOTICE",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownType(s.to_string()))
    }
}

/// HERO: cover image with a welcome line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeroContent {
    pub image_url: Option<String>,
    pub title: String,
    pub subtitle: String,
}

/// QUICK_INFO: short facts such as check-in time or the wifi password.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuickInfoContent {
    pub items: Vec<QuickInfoItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickInfoItem {
    pub icon: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AmenitiesContent {
    pub title: String,
    pub items: Vec<AmenityItem>,
}

impl Default for AmenitiesContent {
    fn default() -> Self {
        Self {
            title: "Amenities".to_string(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmenityItem {
    pub icon: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// MAP: an address with optional coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapContent {
    pub title: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub zoom_level: i64,
    pub description: String,
}

impl Default for MapContent {
    fn default() -> Self {
        Self {
            title: "Location".to_string(),
            address: String::new(),
            latitude: None,
            longitude: None,
            zoom_level: 15,
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryLayout {
    #[default]
    Grid,
    Carousel,
    Masonry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryContent {
    pub title: String,
    pub images: Vec<GalleryImage>,
    pub layout: GalleryLayout,
}

impl Default for GalleryContent {
    fn default() -> Self {
        Self {
            title: "Gallery".to_string(),
            images: Vec::new(),
            layout: GalleryLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub order: u32,
}

/// HOST_PICK: the host's recommendations nearby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostPickContent {
    pub title: String,
    pub items: Vec<HostPickItem>,
}

impl Default for HostPickContent {
    fn default() -> Self {
        Self {
            title: "Host Picks".to_string(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPickItem {
    pub id: String,
    pub category: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    #[default]
    Info,
    Warning,
    Danger,
}

/// NOTICE: house rules and warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoticeContent {
    pub title: String,
    pub variant: NoticeVariant,
    pub items: Vec<NoticeItem>,
}

impl Default for NoticeContent {
    fn default() -> Self {
        Self {
            title: "Notice".to_string(),
            variant: NoticeVariant::default(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub text: String,
}

/// Content of one block. The variant always agrees with the owning block's
/// [`BlockType`]; it serializes as the bare variant object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockContent {
    Hero(HeroContent),
    QuickInfo(QuickInfoContent),
    Amenities(AmenitiesContent),
    Map(MapContent),
    Gallery(GalleryContent),
    HostPick(HostPickContent),
    Notice(NoticeContent),
}

impl BlockContent {
    /// Fully populated default content for `block_type`.
    pub fn default_for(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Hero => BlockContent::Hero(HeroContent::default()),
            BlockType::QuickInfo => BlockContent::QuickInfo(QuickInfoContent::default()),
            BlockType::Amenities => BlockContent::Amenities(AmenitiesContent::default()),
            BlockType::Map => BlockContent::Map(MapContent::default()),
            BlockType::Gallery => BlockContent::Gallery(GalleryContent::default()),
            BlockType::HostPick => BlockContent::HostPick(HostPickContent::default()),
            BlockType::Notice => BlockContent::Notice(NoticeContent::default()),
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            BlockContent::Hero(_) => BlockType::Hero,
            BlockContent::QuickInfo(_) => BlockType::QuickInfo,
            BlockContent::Amenities(_) => BlockType::Amenities,
            BlockContent::Map(_) => BlockType::Map,
            BlockContent::Gallery(_) => BlockType::Gallery,
            BlockContent::HostPick(_) => BlockType::HostPick,
            BlockContent::Notice(_) => BlockType::Notice,
        }
    }

    /// Parse raw JSON as the content of `block_type` and validate it.
    ///
    /// Missing fields take their defaults, unknown keys are dropped, and a
    /// `null` payload yields the default content.
    pub fn from_json(block_type: BlockType, value: Value) -> Result<Self, ValidationError> {
        match &value {
            Value::Null => return Ok(Self::default_for(block_type)),
            Value::Object(_) => {}
            other => {
                return Err(ValidationError::Malformed(format!(
                    "{block_type} content must be an object, got {other}"
                )))
            }
        }
        let malformed =
            |e: serde_json::Error| ValidationError::Malformed(format!("{block_type} content: {e}"));

        let content = match block_type {
            BlockType::Hero => BlockContent::Hero(serde_json::from_value(value).map_err(malformed)?),
            BlockType::QuickInfo => {
                BlockContent::QuickInfo(serde_json::from_value(value).map_err(malformed)?)
            }
            BlockType::Amenities => {
                BlockContent::Amenities(serde_json::from_value(value).map_err(malformed)?)
            }
            BlockType::Map => BlockContent::Map(serde_json::from_value(value).map_err(malformed)?),
            BlockType::Gallery => {
                BlockContent::Gallery(serde_json::from_value(value).map_err(malformed)?)
            }
            BlockType::HostPick => {
                BlockContent::HostPick(serde_json::from_value(value).map_err(malformed)?)
            }
            BlockType::Notice => {
                BlockContent::Notice(serde_json::from_value(value).map_err(malformed)?)
            }
        };
        content.validate()?;
        Ok(content)
    }

    /// Shallow-merge `partial` over this content's top-level fields and
    /// re-parse the result as the same variant.
    pub fn merge(&self, partial: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(e) => return Err(ValidationError::Malformed(e.to_string())),
        };
        for (key, value) in partial {
            fields.insert(key.clone(), value.clone());
        }
        Self::from_json(self.block_type(), Value::Object(fields))
    }
}

impl Validate for BlockContent {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            BlockContent::Hero(c) => c.validate(),
            BlockContent::QuickInfo(c) => c.validate(),
            BlockContent::Amenities(c) => c.validate(),
            BlockContent::Map(c) => c.validate(),
            BlockContent::Gallery(c) => c.validate(),
            BlockContent::HostPick(c) => c.validate(),
            BlockContent::Notice(c) => c.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn block_type_parses_wire_tags() {
        assert_eq!("QUICK_INFO".parse::<BlockType>().unwrap(), BlockType::QuickInfo);
        assert_eq!("HOST_PICK".parse::<BlockType>().unwrap(), BlockType::HostPick);
        assert_eq!(
            "TEXT".parse::<BlockType>(),
            Err(ValidationError::UnknownType("TEXT".into()))
        );
        assert!("hero".parse::<BlockType>().is_err());
    }

    #[test]
    fn block_type_serializes_screaming_snake() {
        assert_eq!(serde_json::to_value(BlockType::QuickInfo).unwrap(), json!("QUICK_INFO"));
        for t in BlockType::ALL {
            assert_eq!(serde_json::to_value(t).unwrap(), json!(t.as_str()));
        }
    }

    #[test]
    fn default_content_matches_its_type() {
        for t in BlockType::ALL {
            assert_eq!(BlockContent::default_for(t).block_type(), t);
        }
    }

    #[test]
    fn map_defaults_serialize_every_field() {
        let value = serde_json::to_value(BlockContent::default_for(BlockType::Map)).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Location",
                "address": "",
                "latitude": null,
                "longitude": null,
                "zoomLevel": 15,
                "description": "",
            })
        );
    }

    #[test]
    fn from_json_fills_missing_fields_with_defaults() {
        let content =
            BlockContent::from_json(BlockType::Gallery, json!({ "layout": "masonry" })).unwrap();
        let BlockContent::Gallery(gallery) = content else {
            panic!("expected gallery content");
        };
        assert_eq!(gallery.title, "Gallery");
        assert_eq!(gallery.layout, GalleryLayout::Masonry);
        assert!(gallery.images.is_empty());
    }

    #[test]
    fn from_json_null_is_default() {
        let content = BlockContent::from_json(BlockType::Notice, Value::Null).unwrap();
        assert_eq!(content, BlockContent::default_for(BlockType::Notice));
    }

    #[test]
    fn from_json_dispatches_on_type_only() {
        // Map-shaped fields handed to a HERO block are dropped, never coerced.
        let content = BlockContent::from_json(
            BlockType::Hero,
            json!({ "title": "Welcome", "zoomLevel": 3, "address": "Main St" }),
        )
        .unwrap();
        assert_eq!(
            content,
            BlockContent::Hero(HeroContent {
                image_url: None,
                title: "Welcome".into(),
                subtitle: String::new(),
            })
        );
    }

    #[test]
    fn from_json_rejects_bad_enum_and_shape() {
        assert!(matches!(
            BlockContent::from_json(BlockType::Notice, json!({ "variant": "critical" })),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            BlockContent::from_json(BlockType::Hero, json!(["not", "an", "object"])),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            BlockContent::from_json(BlockType::Map, json!({ "zoomLevel": 2.5 })),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn merge_replaces_top_level_fields_only() {
        let base = BlockContent::from_json(
            BlockType::Notice,
            json!({ "title": "Rules", "items": [{ "id": "n1", "text": "No smoking" }] }),
        )
        .unwrap();
        let mut partial = Map::new();
        partial.insert("variant".into(), json!("danger"));

        let merged = base.merge(&partial).unwrap();
        let BlockContent::Notice(notice) = merged else {
            panic!("expected notice content");
        };
        assert_eq!(notice.title, "Rules");
        assert_eq!(notice.variant, NoticeVariant::Danger);
        assert_eq!(notice.items.len(), 1);
    }

    #[test]
    fn merge_validates_the_result() {
        let base = BlockContent::default_for(BlockType::Map);
        let mut partial = Map::new();
        partial.insert("latitude".into(), json!(123.0));
        assert!(matches!(
            base.merge(&partial),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
