//! Field validation for guide metadata.
use super::model::Theme;
use crate::block::validate::{check_len, DESCRIPTION_MAX, TITLE_MAX};
use crate::block::{Validate, ValidationError};

pub const FONT_FAMILY_MAX: usize = 50;

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }
    check_len("title", title, TITLE_MAX)
}

pub fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    match description {
        Some(description) => check_len("description", description, DESCRIPTION_MAX),
        None => Ok(()),
    }
}

/// `#RRGGBB`, either case.
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn check_color(field: &str, value: &str) -> Result<(), ValidationError> {
    if is_hex_color(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

impl Validate for Theme {
    fn validate(&self) -> Result<(), ValidationError> {
        check_color("primaryColor", &self.primary_color)?;
        check_color("backgroundColor", &self.background_color)?;
        if self.font_family.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "fontFamily".to_string(),
            });
        }
        check_len("fontFamily", &self.font_family, FONT_FAMILY_MAX)
    }
}
