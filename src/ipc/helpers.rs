use crate::collections::CollectionError;
use crate::ipc::error::err;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| format!("missing {}", key))
}

pub fn get_opt_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// The optional `view` param names the originating view so publish skips
/// its queue.
pub fn get_origin(params: &serde_json::Value) -> Option<String> {
    get_opt_str(params, "view")
}

pub fn get_opt_score(params: &serde_json::Value, key: &str) -> Result<Option<f64>, String> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("{} must be a number", key)),
    }
}

pub fn get_required_index(params: &serde_json::Value, key: &str) -> Result<usize, String> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .ok_or_else(|| format!("missing {}", key))
}

pub fn collection_err(id: &str, e: CollectionError) -> serde_json::Value {
    err(id, e.code(), e.to_string(), None)
}
