//! The popup enquiry form.

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, ValidationError};

/// Accepted values for [`FormDraft::gender`].
pub const GENDERS: [&str; 3] = ["Male", "Female", "Other"];

/// Accepted values for [`FormDraft::consultation_mode`].
pub const CONSULTATION_MODES: [&str; 2] = ["Online", "Offline (In-Clinic)"];

/// In-progress field values of the popup form.
///
/// Every field is required. Missing fields deserialize as empty strings so
/// that validation, not the JSON extractor, reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: String,
    pub gender: String,
    pub city: String,
    pub consultation_mode: String,
    pub message: String,
}

impl FormDraft {
    /// Whether every field is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Check every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming each field that is empty or
    /// malformed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();

        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("age", &self.age),
            ("gender", &self.gender),
            ("city", &self.city),
            ("consultationMode", &self.consultation_mode),
            ("message", &self.message),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                fields.push(FieldError::new(field, "This field is required"));
                continue;
            }
            if let Some(message) = check_format(field, value.trim()) {
                fields.push(FieldError::new(field, message));
            }
        }

        ValidationError::from_fields(fields)
    }
}

fn check_format(field: &str, value: &str) -> Option<&'static str> {
    match field {
        "email" if !looks_like_email(value) => Some("Please enter a valid email address"),
        "phone" if !is_phone_number(value) => {
            Some("Please enter a valid 10-15 digit phone number")
        }
        "age" if !matches!(value.parse::<u8>(), Ok(1..=120)) => {
            Some("Please enter an age between 1 and 120")
        }
        "gender" if !GENDERS.contains(&value) => Some("Please choose Male, Female or Other"),
        "consultationMode" if !CONSULTATION_MODES.contains(&value) => {
            Some("Please choose Online or Offline (In-Clinic)")
        }
        _ => None,
    }
}

/// Email shape check: the trimmed value must be a single `local@domain.tld`
/// token with no whitespace anywhere.
#[must_use]
pub fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// 10 to 15 ASCII digits, nothing else.
fn is_phone_number(value: &str) -> bool {
    (10..=15).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}
