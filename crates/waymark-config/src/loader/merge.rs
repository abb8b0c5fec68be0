//! JSON merge helpers for layered configuration.

use serde_json::Value;

/// Merge an overlay layer into the accumulated config.
///
/// Objects merge key by key; any other overlay value replaces the base. An
/// explicit `null` removes the key so a later layer can fall back to the default.
pub(super) fn merge_layer(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if value.is_null() {
                    base_map.remove(key);
                    continue;
                }
                match base_map.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_layer(existing, value);
                    }
                    _ => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value.clone(),
    }
}
