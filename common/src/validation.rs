// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use thiserror::Error;

use crate::{CreateCategoryPayload, CreateTaskPayload, UpdateCategoryPayload, UpdateTaskPayload};

/// Longest category name accepted, matching the `categories.name` column.
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// Client-caused problems with a payload. Never retried; answered with a 400.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Task text cannot be empty.")]
    EmptyText,

    #[error("Invalid date '{0}': expected YYYY-MM-DD.")]
    MalformedDate(String),

    #[error("Category name cannot be empty.")]
    EmptyName,

    #[error("Category name cannot exceed {} characters.", MAX_CATEGORY_NAME_LEN)]
    NameTooLong,

    #[error("Invalid color '{0}': expected a hex color such as #6366f1.")]
    MalformedColor(String),
}

/// Checks the `YYYY-MM-DD` shape only. `2024-02-31` passes: dates are
/// bucket keys and are not checked against the calendar.
pub fn is_valid_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Checks for `#` followed by exactly six hex digits.
pub fn is_valid_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn check_date(date: &str) -> Result<(), ValidationError> {
    if is_valid_date(date) {
        Ok(())
    } else {
        Err(ValidationError::MalformedDate(date.to_string()))
    }
}

fn check_color(color: &str) -> Result<(), ValidationError> {
    if is_valid_hex_color(color) {
        Ok(())
    } else {
        Err(ValidationError::MalformedColor(color.to_string()))
    }
}

fn normalize_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(trimmed.to_string())
}

fn normalize_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if trimmed.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    Ok(trimmed.to_string())
}

impl CreateTaskPayload {
    /// Validates the payload and returns it with its text trimmed.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.text = normalize_text(&self.text)?;
        check_date(&self.date)?;
        Ok(self)
    }
}

impl UpdateTaskPayload {
    /// Validates the supplied fields only; absent fields are not checked.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(text) = &self.text {
            self.text = Some(normalize_text(text)?);
        }
        if let Some(date) = &self.date {
            check_date(date)?;
        }
        Ok(self)
    }
}

impl CreateCategoryPayload {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = normalize_name(&self.name)?;
        check_color(&self.color)?;
        Ok(self)
    }
}

impl UpdateCategoryPayload {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if let Some(name) = &self.name {
            self.name = Some(normalize_name(name)?);
        }
        if let Some(color) = &self.color {
            check_color(color)?;
        }
        Ok(self)
    }
}
