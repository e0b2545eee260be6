//! Request validation
//!
//! Bodies and path parameters are checked here before any handler runs.
//! Every offending field is collected so that a single 422 response can
//! report all of them at once.

use serde_json::{Map, Value};
use std::num::IntErrorKind;

use crate::error::{ApiError, FieldError};
use crate::models::ItemCreate;

const MSG_MISSING: &str = "Field required";
const MSG_STRING_TYPE: &str = "Input should be a valid string";
const MSG_STRING_TOO_SHORT: &str = "String should have at least 1 character";
const MSG_FLOAT_TYPE: &str = "Input should be a valid number";
const MSG_FLOAT_PARSING: &str = "Input should be a valid number, unable to parse string as a number";
const MSG_INT_PARSING: &str =
    "Input should be a valid integer, unable to parse string as an integer";
const MSG_OBJECT_TYPE: &str = "Input should be a valid dictionary or object to extract fields from";
const MSG_JSON_INVALID: &str = "JSON decode error";

/// Parse a raw request body as JSON
pub fn parse_json_body(bytes: &[u8]) -> Result<Value, ApiError> {
    // An empty body counts as a missing body
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::Validation(vec![FieldError::new(
            "missing",
            &["body"],
            MSG_MISSING,
            Value::Null,
        )]));
    }
    serde_json::from_slice(bytes).map_err(|e| {
        ApiError::Validation(vec![FieldError::new(
            "json_invalid",
            &["body"],
            format!("{MSG_JSON_INVALID}: {e}"),
            Value::Object(Map::new()),
        )])
    })
}

/// Parse an item identifier taken from the request path
///
/// An integer too large to be an identifier cannot name a stored item, so
/// it is reported as not found rather than as malformed.
pub fn parse_item_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim().parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ApiError::NotFound,
        _ => ApiError::Validation(vec![FieldError::new(
            "int_parsing",
            &["path", "item_id"],
            MSG_INT_PARSING,
            Value::String(raw.to_string()),
        )]),
    })
}

/// Check a JSON body against the item creation schema
pub fn validate_item_create(body: &Value) -> Result<ItemCreate, ApiError> {
    // The body must be an object
    let Some(fields) = body.as_object() else {
        return Err(ApiError::Validation(vec![FieldError::new(
            "model_attributes_type",
            &["body"],
            MSG_OBJECT_TYPE,
            body.clone(),
        )]));
    };
    // Collect every field error before failing
    let mut errors = Vec::new();
    let name = required_name(fields, body, &mut errors);
    let description = optional_string(fields, "description", &mut errors);
    let price = required_float(fields, body, "price", &mut errors);
    let tax = optional_float(fields, "tax", &mut errors);
    // Return all errors together
    match (name, price) {
        (Some(name), Some(price)) if errors.is_empty() => Ok(ItemCreate {
            name,
            description,
            price,
            tax,
        }),
        _ => Err(ApiError::Validation(errors)),
    }
}

fn required_name(
    fields: &Map<String, Value>,
    body: &Value,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match fields.get("name") {
        None => {
            errors.push(FieldError::new(
                "missing",
                &["body", "name"],
                MSG_MISSING,
                body.clone(),
            ));
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.push(FieldError::new(
                "string_too_short",
                &["body", "name"],
                MSG_STRING_TOO_SHORT,
                Value::String(s.clone()),
            ));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(FieldError::new(
                "string_type",
                &["body", "name"],
                MSG_STRING_TYPE,
                other.clone(),
            ));
            None
        }
    }
}

fn optional_string(
    fields: &Map<String, Value>,
    key: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match fields.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(FieldError::new(
                "string_type",
                &["body", key],
                MSG_STRING_TYPE,
                other.clone(),
            ));
            None
        }
    }
}

fn required_float(
    fields: &Map<String, Value>,
    body: &Value,
    key: &str,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    match fields.get(key) {
        None => {
            errors.push(FieldError::new(
                "missing",
                &["body", key],
                MSG_MISSING,
                body.clone(),
            ));
            None
        }
        Some(value) => coerce_float(value, key, errors),
    }
}

fn optional_float(
    fields: &Map<String, Value>,
    key: &str,
    errors: &mut Vec<FieldError>,
) -> Option<f64> {
    match fields.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => coerce_float(value, key, errors),
    }
}

/// Accept JSON numbers and numeric strings, reject everything else
fn coerce_float(value: &Value, key: &str, errors: &mut Vec<FieldError>) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Some(parsed),
            _ => {
                errors.push(FieldError::new(
                    "float_parsing",
                    &["body", key],
                    MSG_FLOAT_PARSING,
                    value.clone(),
                ));
                None
            }
        },
        _ => {
            errors.push(FieldError::new(
                "float_type",
                &["body", key],
                MSG_FLOAT_TYPE,
                value.clone(),
            ));
            None
        }
    }
}
