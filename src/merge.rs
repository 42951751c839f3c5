use crate::value::{ConfigValue, Origin, ValueKind};

/// Deep-merge `overlay` on top of `base`.
/// If both sides have an object for the same key, recurse.
/// Otherwise, `overlay`'s value wins.
pub fn deep_merge(base: ConfigValue, overlay: ConfigValue) -> ConfigValue {
    let origin = overlay.origin().cloned();
    match (base.into_kind(), overlay.into_kind()) {
        (ValueKind::Object(mut base_map), ValueKind::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            with_origin(ConfigValue::from(base_map), origin)
        }
        (_, overlay_kind) => with_origin(ConfigValue::new(overlay_kind), origin),
    }
}

fn with_origin(value: ConfigValue, origin: Option<Origin>) -> ConfigValue {
    match origin {
        Some(origin) => value.with_origin(origin),
        None => value,
    }
}

impl ConfigValue {
    /// `self` with missing keys filled in from `fallback`, recursively.
    pub fn with_fallback(self, fallback: ConfigValue) -> ConfigValue {
        deep_merge(fallback, self)
    }
}
