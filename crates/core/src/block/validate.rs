/// Field-level constraints for block content.
use thiserror::Error;

use super::content::{
    AmenitiesContent, BlockContent, BlockType, GalleryContent, HeroContent, HostPickContent,
    MapContent, NoticeContent, QuickInfoContent,
};

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;
pub const QUICK_INFO_ITEMS_MAX: usize = 10;
pub const AMENITY_ITEMS_MAX: usize = 30;
pub const GALLERY_IMAGES_MAX: usize = 20;
pub const HOST_PICK_ITEMS_MAX: usize = 20;
pub const NOTICE_ITEMS_MAX: usize = 20;
pub const ZOOM_MIN: i64 = 1;
pub const ZOOM_MAX: i64 = 20;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("unknown block type '{0}'")]
    UnknownType(String),
    #[error("{found} content cannot be stored in a {expected} block")]
    TypeMismatch { expected: BlockType, found: BlockType },
    #[error("{field} is required")]
    Required { field: String },
    #[error("{field} exceeds {max} characters (got {len})")]
    TooLong { field: String, max: usize, len: usize },
    #[error("{field} holds more than {max} entries (got {len})")]
    TooMany { field: String, max: usize, len: usize },
    #[error("{field} must be within [{min}, {max}] (got {value})")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} is not an absolute URL")]
    InvalidUrl { field: String },
    #[error("{field} must be a #RRGGBB colour (got '{value}')")]
    InvalidColor { field: String, value: String },
    #[error("malformed content: {0}")]
    Malformed(String),
}

/// Implemented by every content shape that carries constraints.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Check `content` against `block_type` and its field constraints.
pub fn validate(block_type: BlockType, content: BlockContent) -> Result<BlockContent, ValidationError> {
    if content.block_type() != block_type {
        return Err(ValidationError::TypeMismatch {
            expected: block_type,
            found: content.block_type(),
        });
    }
    content.validate()?;
    Ok(content)
}

pub(crate) fn check_len(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            len,
        });
    }
    Ok(())
}

fn check_opt_len(field: &str, value: Option<&str>, max: usize) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| check_len(field, v, max))
}

fn check_count(field: &str, len: usize, max: usize) -> Result<(), ValidationError> {
    if len > max {
        return Err(ValidationError::TooMany {
            field: field.to_string(),
            max,
            len,
        });
    }
    Ok(())
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    // NaN fails both comparisons, so test the accepted interval explicitly.
    if !(value >= min && value <= max) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            value,
        });
    }
    Ok(())
}

/// Loose absolute-URL check: `scheme:rest` with an alphabetic scheme and no
/// whitespace anywhere.
pub(crate) fn is_absolute_url(value: &str) -> bool {
    let Some((scheme, rest)) = value.split_once(':') else {
        return false;
    };
    let mut scheme_chars = scheme.chars();
    let scheme_ok = scheme_chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme_chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    scheme_ok && !rest.is_empty() && !value.chars().any(char::is_whitespace)
}

fn check_url(field: &str, value: &str) -> Result<(), ValidationError> {
    if !is_absolute_url(value) {
        return Err(ValidationError::InvalidUrl {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn check_opt_url(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| check_url(field, v))
}

impl Validate for HeroContent {
    fn validate(&self) -> Result<(), ValidationError> {
        check_opt_url("imageUrl", self.image_url.as_deref())?;
        check_len("title", &self.title, TITLE_MAX)?;
        check_len("subtitle", &self.subtitle, 200)
    }
}

impl Validate for QuickInfoContent {
    fn validate(&self) -> Result<(), ValidationError> {
        check_count("items", self.items.len(), QUICK_INFO_ITEMS_MAX)?;
        for (i, item) in self.items.iter().enumerate() {
            check_len(&format!("items[{i}].icon"), &item.icon, 50)?;
            check_len(&format!("items[{i}].label"), &item.label, 50)?;
            check_len(&format!("items[{i}].value"), &item.value, 200)?;
        }
        Ok(())
    }
}

impl Validate for AmenitiesContent {
    fn validate(&self) -> Result<(), ValidationError> {
        check_len("title", &self.title, TITLE_MAX)?;
        check_count("items", self.items.len(), AMENITY_ITEMS_MAX)?;
        for (i, item) in self.items.iter().enumerate() {
            check_len(&format!("items[{i}].icon"), &item.icon, 50)?;
            check_len(&format!("items[{i}].name"), &item.name, 100)?;
            check_opt_len(
                &format!("items[{i}].description"),
                item.description.as_deref(),
                300,
            )?;
        }
        Ok(())
    }
}

impl Validate for MapContent {
    fn validate(&self) -> Result<(), ValidationError> {
        check_len("title", &self.title, TITLE_MAX)?;
        check_len("address", &self.address, 300)?;
        if let Some(lat) = self.latitude {
            check_range("latitude", lat, -90.0, 90.0)?;
        }
        if let Some(lng) = self.longitude {
            check_range("longitude", lng, -180.0, 180.0)?;
        }
        check_range(
            "zoomLevel",
            self.zoom_level as f64,
            ZOOM_MIN as f64,
            ZOOM_MAX as f64,
        )?;
        check_len("description", &self.description, DESCRIPTION_MAX)
    }
}

impl Validate for GalleryContent {
    fn validate(&self) -> Result<(), ValidationError> {
        check_len("title", &self.title, TITLE_MAX)?;
        check_count("images", self.images.len(), GALLERY_IMAGES_MAX)?;
        for (i, image) in self.images.iter().enumerate() {
            check_url(&format!("images[{i}].url"), &image.url)?;
            check_opt_len(&format!("images[{i}].caption"), image.caption.as_deref(), 200)?;
        }
        Ok(())
    }
}

impl Validate for HostPickContent {
    fn validate(&self) -> Result<(), ValidationError> {
        check_len("title", &self.title, TITLE_MAX)?;
        check_count("items", self.items.len(), HOST_PICK_ITEMS_MAX)?;
        for (i, item) in self.items.iter().enumerate() {
            check_len(&format!("items[{i}].category"), &item.category, 50)?;
            check_len(&format!("items[{i}].name"), &item.name, 100)?;
            check_len(&format!("items[{i}].description"), &item.description, DESCRIPTION_MAX)?;
            check_opt_url(&format!("items[{i}].imageUrl"), item.image_url.as_deref())?;
            check_opt_len(&format!("items[{i}].address"), item.address.as_deref(), 300)?;
            check_opt_url(&format!("items[{i}].link"), item.link.as_deref())?;
        }
        Ok(())
    }
}

impl Validate for NoticeContent {
    fn validate(&self) -> Result<(), ValidationError> {
        check_len("title", &self.title, TITLE_MAX)?;
        check_count("items", self.items.len(), NOTICE_ITEMS_MAX)?;
        for (i, item) in self.items.iter().enumerate() {
            check_opt_len(&format!("items[{i}].icon"), item.icon.as_deref(), 50)?;
            check_len(&format!("items[{i}].text"), &item.text, DESCRIPTION_MAX)?;
        }
        Ok(())
    }
}
