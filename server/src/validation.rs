//! Name validation for lists and todos.
//!
//! Names are validated after the caller has trimmed surrounding whitespace.
//! Lengths are measured in characters, not bytes.

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::types::TodoList;

/// Allowed name length, in characters, for both lists and todos.
pub const NAME_LENGTH: RangeInclusive<usize> = 1..=100;

/// A user-facing validation failure.
///
/// The display strings are shown verbatim as the error flash.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("List name must be between 1 and 100 characters.")]
    ListNameLength,

    #[error("List name must be unique.")]
    ListNameTaken,

    #[error("Todo must be between 1 and 100 characters.")]
    TodoNameLength,
}

/// Validates a list name against the length bounds and the existing lists.
///
/// Every existing list counts, including one being renamed, so renaming a
/// list to its current name is rejected as a duplicate.
///
/// # Errors
///
/// Returns [`ValidationError::ListNameLength`] if the name is empty or longer
/// than 100 characters, otherwise [`ValidationError::ListNameTaken`] if any
/// list already uses the name.
pub fn validate_list_name(name: &str, lists: &[TodoList]) -> Result<(), ValidationError> {
    if !NAME_LENGTH.contains(&name.chars().count()) {
        return Err(ValidationError::ListNameLength);
    }

    if lists.iter().any(|list| list.name == name) {
        return Err(ValidationError::ListNameTaken);
    }

    Ok(())
}

/// Validates a todo name against the length bounds.
///
/// # Errors
///
/// Returns [`ValidationError::TodoNameLength`] if the name is empty or longer
/// than 100 characters.
pub fn validate_todo_name(name: &str) -> Result<(), ValidationError> {
    if NAME_LENGTH.contains(&name.chars().count()) {
        Ok(())
    } else {
        Err(ValidationError::TodoNameLength)
    }
}
