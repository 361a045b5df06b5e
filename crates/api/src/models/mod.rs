//! Domain models and request inputs.
//!
//! These types represent validated domain objects separate from database row
//! types. Request inputs are explicit structs that reject unknown fields;
//! each has a `validated` step that runs before any database access.

pub mod itinerary;
pub mod product;
pub mod promo_code;
pub mod purchase;
pub mod tour_guide;

use thiserror::Error;

/// A request field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending field as it appears on the wire.
    pub field: &'static str,
    /// What was wrong with it.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Postgres `TEXT` cannot store U+0000.
pub(crate) fn reject_nul(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        return Err(ValidationError::new(field, "must not contain NUL characters"));
    }
    Ok(())
}

/// Trim `value` and require `1..=max` characters.
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let value = value.trim();
    reject_nul(field, value)?;
    if value.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(value.to_owned())
}

/// Trim `value` and cap it at `max` characters. An empty string is kept so an
/// update can use it to clear the field.
pub(crate) fn trimmed_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim();
    reject_nul(field, value)?;
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(Some(value.to_owned()))
}

/// `None` for an empty string.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Trim each entry, drop blanks, and bound the list.
pub(crate) fn text_list(
    field: &'static str,
    values: Vec<String>,
    max_items: usize,
    max_len: usize,
) -> Result<Vec<String>, ValidationError> {
    let values: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect();

    for value in &values {
        reject_nul(field, value)?;
    }
    if values.len() > max_items {
        return Err(ValidationError::new(
            field,
            format!("must have at most {max_items} entries"),
        ));
    }
    if values.iter().any(|v| v.chars().count() > max_len) {
        return Err(ValidationError::new(
            field,
            format!("entries must be at most {max_len} characters"),
        ));
    }
    Ok(values)
}
