//! Request validation rules.
//!
//! Rules are declared on the DTOs with `validator` attributes (see
//! `models.rs`). This module turns a failed `Validate::validate` into the
//! ordered, human-readable messages returned in the envelope. An empty list
//! means the DTO is valid.

use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{CouponCreateDto, CouponUpdateDto};

pub const MIN_PERCENT: i32 = 1;
pub const MAX_PERCENT: i32 = 100;

/// Implemented by request bodies that must be checked before any mutation.
pub trait Violations: Validate {
    fn violations(&self) -> Vec<String>;
}

impl Violations for CouponCreateDto {
    fn violations(&self) -> Vec<String> {
        describe(self.validate(), &["name", "percent"], |field| {
            message(field, 0, self.percent)
        })
    }
}

impl Violations for CouponUpdateDto {
    fn violations(&self) -> Vec<String> {
        describe(self.validate(), &["id", "name", "percent"], |field| {
            message(field, self.id, self.percent)
        })
    }
}

/// Rejects names made only of whitespace. Empty names are caught by the
/// `length` rule with the same code.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.trim().is_empty() {
        return Err(ValidationError::new("not_empty"));
    }
    Ok(())
}

fn describe<F>(result: Result<(), ValidationErrors>, order: &[&str], render: F) -> Vec<String>
where
    F: Fn(&str) -> String,
{
    let Err(errors) = result else {
        return Vec::new();
    };
    let by_field = errors.field_errors();

    let mut messages: Vec<String> = order
        .iter()
        .filter_map(|field| by_field.get(*field).map(|errs| (*field, errs)))
        .flat_map(|(field, errs)| errs.iter().map(|_| render(field)).collect::<Vec<_>>())
        .collect();
    messages.dedup();
    messages
}

/// One message per failed field; the derived rules decide *whether* a field
/// failed, the field's value picks the wording.
fn message(field: &str, id: i32, percent: i32) -> String {
    match field {
        "id" if id == 0 => "'Id' must not be empty.".to_string(),
        "id" => "'Id' must be greater than '0'.".to_string(),
        "percent" => format!(
            "'Percent' must be between {MIN_PERCENT} and {MAX_PERCENT}. You entered {percent}."
        ),
        _ => format!("'{}' must not be empty.", label(field)),
    }
}

fn label(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
