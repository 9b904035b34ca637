//! Shape checks for inbound create and update payloads.

use serde_json::Value;

use super::error::{TodoError, TodoResult};
use crate::domain::todo::{CreateTodo, UpdateTodo, MAX_ORDER};

pub const VALUE_MIN_LEN: usize = 1;
pub const VALUE_MAX_LEN: usize = 50;

/// Checks that `payload` is `{ "value": <string of 1..=50 chars> }` and nothing else.
///
/// Messages quote the offending key, e.g. `"value" is required`.
pub fn validate_create(payload: &Value) -> TodoResult<CreateTodo> {
    let Value::Object(fields) = payload else {
        return Err(TodoError::validation(r#""value" must be of type object"#));
    };

    if let Some(unknown) = fields.keys().find(|k| k.as_str() != "value") {
        return Err(TodoError::validation(format!(r#""{unknown}" is not allowed"#)));
    }

    let value = match fields.get("value") {
        None => return Err(TodoError::validation(r#""value" is required"#)),
        Some(Value::String(s)) => s,
        Some(_) => return Err(TodoError::validation(r#""value" must be a string"#)),
    };

    let len = value.chars().count();
    if len < VALUE_MIN_LEN {
        return Err(TodoError::validation(r#""value" is not allowed to be empty"#));
    }
    if len > VALUE_MAX_LEN {
        return Err(TodoError::validation(format!(
            r#""value" length must be less than or equal to {VALUE_MAX_LEN} characters long"#
        )));
    }

    Ok(CreateTodo { value: value.clone() })
}

/// Rejects orders outside `-MAX_ORDER..=MAX_ORDER`.
pub fn validate_update(input: &UpdateTodo) -> TodoResult<()> {
    match input.order {
        Some(order) if !(-MAX_ORDER..=MAX_ORDER).contains(&order) => {
            Err(TodoError::validation(r#""order" must be a safe number"#))
        }
        _ => Ok(()),
    }
}
