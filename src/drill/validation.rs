//! Field validation: requiredness and format rules for a single value.
//!
//! The same check backs live per-field feedback and the bulk check at
//! submit time, so it is a pure function of the field and the value.

use super::types::{FieldDefinition, FieldKind, ValidationRule};
use derive_more::Error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{instrument, trace};

/// `non-space @ non-space . non-space`, matched anywhere in the value.
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

/// Why a field value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationErrorKind {
    /// A required field was left empty or unchecked.
    Required,
    /// The value does not match the field's format rule.
    Format,
}

/// A field-level rejection surfaced to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed.
    pub field_id: String,
    /// Field label, for the message.
    pub label: String,
    /// Failure kind.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// User-facing message for this failure.
    pub fn message(&self) -> String {
        match self.kind {
            ValidationErrorKind::Required => format!("{} is required", self.label),
            ValidationErrorKind::Format => {
                format!("Please enter a valid {}", self.label.to_lowercase())
            }
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Whether `value` counts as "nothing entered" for `field`.
fn is_blank(field: &FieldDefinition, value: &str) -> bool {
    value.trim().is_empty() || (*field.kind() == FieldKind::Checkbox && value == "false")
}

fn satisfies_rule(rule: ValidationRule, value: &str) -> bool {
    match rule {
        ValidationRule::Email => EMAIL_SHAPE.is_match(value),
    }
}

/// Checks `value` against `field`, returning the reason on failure.
#[instrument(level = "trace", skip(field), fields(field_id = %field.id()))]
pub fn check_field(field: &FieldDefinition, value: &str) -> Result<(), ValidationError> {
    let reject = |kind| ValidationError {
        field_id: field.id().clone(),
        label: field.label().clone(),
        kind,
    };

    if *field.required() && is_blank(field, value) {
        trace!("required field is blank");
        return Err(reject(ValidationErrorKind::Required));
    }

    if value.is_empty() {
        return Ok(());
    }

    match field.validation_rule() {
        Some(rule) if !satisfies_rule(*rule, value) => {
            trace!(%rule, "format rule failed");
            Err(reject(ValidationErrorKind::Format))
        }
        _ => Ok(()),
    }
}

/// Whether `value` is acceptable for `field`.
pub fn validate(field: &FieldDefinition, value: &str) -> bool {
    check_field(field, value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_field(required: bool) -> FieldDefinition {
        FieldDefinition::new("email", "Email Address", FieldKind::Email, required)
            .with_rule(ValidationRule::Email)
    }

    #[test]
    fn test_required_rejects_blank_and_whitespace() {
        let field = FieldDefinition::new("firstName", "First Name", FieldKind::Text, true);
        assert!(!validate(&field, ""));
        assert!(!validate(&field, " "));
        assert!(!validate(&field, "\t\n"));
        assert!(validate(&field, "Michael"));
    }

    #[test]
    fn test_optional_empty_is_valid_even_with_rule() {
        assert!(validate(&email_field(false), ""));
    }

    #[test]
    fn test_email_shape() {
        let field = email_field(true);
        assert!(validate(&field, "a@b.com"));
        assert!(validate(&field, "mjohnson@company.com"));
        assert!(!validate(&field, "not-an-email"));
        assert!(!validate(&field, "wrong@x"));
    }

    #[test]
    fn test_optional_whitespace_still_checks_rule() {
        // Only the empty string is vacuously valid.
        assert!(!validate(&email_field(false), " "));
    }

    #[test]
    fn test_required_checkbox_must_be_checked() {
        let field = FieldDefinition::new("reproducible", "Reproducible", FieldKind::Checkbox, true);
        assert!(!validate(&field, "false"));
        assert!(validate(&field, "true"));
    }

    #[test]
    fn test_messages() {
        let err = check_field(&email_field(true), "").unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Required);
        assert_eq!(err.to_string(), "Email Address is required");

        let err = check_field(&email_field(true), "nope").unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Format);
        assert_eq!(err.to_string(), "Please enter a valid email address");
    }
}
