//! Payload validation driven by per-entity field tables.
//!
//! Each entity declares an explicit table of its client-facing fields
//! (name, required, client-writable) that validation walks instead of
//! reflecting over request types. Non-writable fields (the owner,
//! server timestamps) are silently ignored when present in a payload;
//! required fields collect per-field error messages into a single 400
//! response.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// One client-facing field of an entity.
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    /// Whether clients may supply this field; non-writable fields are
    /// ignored in payloads and only appear in responses.
    pub writable: bool,
}

pub const ALBUM_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "title", required: true, writable: true },
    FieldSpec { name: "description", required: true, writable: true },
    FieldSpec { name: "link_url", required: true, writable: true },
    FieldSpec { name: "thumbnail_url", required: true, writable: true },
    FieldSpec { name: "date", required: false, writable: true },
    FieldSpec { name: "owner", required: false, writable: false },
    FieldSpec { name: "created_at", required: false, writable: false },
    FieldSpec { name: "updated_at", required: false, writable: false },
];

pub const QUOTE_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "text", required: true, writable: true },
    FieldSpec { name: "date", required: false, writable: true },
    FieldSpec { name: "owner", required: false, writable: false },
];

// Auth request bodies go through the same tables so a malformed
// registration gets the per-field 400 treatment, not a framework
// rejection. Password is optional at registration: accounts without
// one exist but cannot log in with credentials.
pub const REGISTER_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "email", required: true, writable: true },
    FieldSpec { name: "nickname", required: false, writable: true },
    FieldSpec { name: "date_of_birth", required: true, writable: true },
    FieldSpec { name: "password", required: false, writable: true },
];

pub const LOGIN_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "email", required: true, writable: true },
    FieldSpec { name: "password", required: true, writable: true },
];

pub const BOOTSTRAP_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "token", required: true, writable: true },
    FieldSpec { name: "email", required: true, writable: true },
    FieldSpec { name: "nickname", required: false, writable: true },
    FieldSpec { name: "date_of_birth", required: true, writable: true },
    FieldSpec { name: "password", required: true, writable: true },
];

/// Accumulates per-field validation messages.
#[derive(Default)]
pub struct FieldErrors {
    errors: Map<String, Value>,
}

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: &str) {
        let entry = self
            .errors
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(messages) = entry {
            messages.push(Value::String(message.to_string()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish validation: Err with a 400 field-validation error if
    /// any message was collected.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::FieldValidation(self.errors))
        }
    }
}

/// Require the request body to be a JSON object.
pub fn require_object(payload: &Value) -> Result<&Map<String, Value>> {
    payload
        .as_object()
        .ok_or_else(|| Error::Validation("Expected a JSON object".to_string()))
}

/// Check that every required writable field is present and non-null.
pub fn check_required(payload: &Map<String, Value>, table: &[FieldSpec], errors: &mut FieldErrors) {
    for spec in table {
        if !spec.required || !spec.writable {
            continue;
        }
        match payload.get(spec.name) {
            None | Some(Value::Null) => errors.push(spec.name, "This field is required."),
            _ => {}
        }
    }
}

/// Extract a string field, collecting type and blank errors.
///
/// Returns None when the field is absent or invalid; missing-field
/// errors are `check_required`'s job so partial updates can reuse
/// this.
pub fn string_field(
    payload: &Map<String, Value>,
    name: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match payload.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            if s.trim().is_empty() {
                errors.push(name, "This field may not be blank.");
                None
            } else {
                Some(s.clone())
            }
        }
        Some(_) => {
            errors.push(name, "Not a valid string.");
            None
        }
    }
}

/// Extract a URL field: a string that parses as an absolute URL.
pub fn url_field(
    payload: &Map<String, Value>,
    name: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    let value = string_field(payload, name, errors)?;
    match url::Url::parse(&value) {
        Ok(_) => Some(value),
        Err(_) => {
            errors.push(name, "Enter a valid URL.");
            None
        }
    }
}

/// Extract an ISO `YYYY-MM-DD` date field.
pub fn date_field(
    payload: &Map<String, Value>,
    name: &str,
    errors: &mut FieldErrors,
) -> Option<NaiveDate> {
    let value = string_field(payload, name, errors)?;
    match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(name, "Date has wrong format. Use YYYY-MM-DD.");
            None
        }
    }
}
