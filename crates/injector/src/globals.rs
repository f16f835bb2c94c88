//! Window-global helpers
//!
//! The `window.x = window.x || []` idioms vendor snippets rely on, expressed
//! over the host's global namespace.

use contracts::HostEnvironment;
use serde_json::Value;

/// Append `value` to the array global `name`, creating the array if needed
///
/// A non-array value already stored under `name` is replaced by a fresh array.
pub fn push_queue(host: &dyn HostEnvironment, name: &str, value: Value) {
    let mut value = Some(value);
    host.update_global(name, &mut |slot| {
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let (Some(queue), Some(value)) = (slot.as_array_mut(), value.take()) {
            queue.push(value);
        }
    });
}

/// Define `name` only when it is not already present
///
/// Returns true when the global was defined by this call.
pub fn define_if_absent(host: &dyn HostEnvironment, name: &str, value: Value) -> bool {
    let mut value = Some(value);
    let mut defined = false;
    host.update_global(name, &mut |slot| {
        if slot.is_null() {
            if let Some(value) = value.take() {
                *slot = value;
                defined = true;
            }
        }
    });
    defined
}

/// Ensure `name` is an object and set one key on it
pub fn set_field(host: &dyn HostEnvironment, name: &str, key: &str, value: Value) {
    let mut value = Some(value);
    host.update_global(name, &mut |slot| {
        if !slot.is_object() {
            *slot = Value::Object(serde_json::Map::new());
        }
        if let (Some(object), Some(value)) = (slot.as_object_mut(), value.take()) {
            object.insert(key.to_string(), value);
        }
    });
}

/// Append `value` to the array stored at `path` inside the object global `name`
///
/// Missing intermediate objects and the final array are created on demand.
pub fn push_nested(host: &dyn HostEnvironment, name: &str, path: &[&str], value: Value) {
    let mut value = Some(value);
    host.update_global(name, &mut |slot| {
        let mut cursor = slot;
        for key in path {
            if !cursor.is_object() {
                *cursor = Value::Object(serde_json::Map::new());
            }
            cursor = match cursor.as_object_mut() {
                Some(object) => object.entry(key.to_string()).or_insert(Value::Null),
                None => return,
            };
        }
        if !cursor.is_array() {
            *cursor = Value::Array(Vec::new());
        }
        if let (Some(queue), Some(value)) = (cursor.as_array_mut(), value.take()) {
            queue.push(value);
        }
    });
}
