use rusqlite::Connection;
use serde::Serialize;

use super::types::AppState;
use crate::error::ApiError;

pub fn db(state: &AppState) -> Result<&Connection, ApiError> {
    state.db.as_ref().ok_or(ApiError::NoWorkspace)
}

pub fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

pub fn require_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, ApiError> {
    match params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_params(format!("missing {key}"))),
    }
}

pub fn opt_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|v| !v.trim().is_empty())
}

pub fn require_i64(params: &serde_json::Value, key: &str) -> Result<i64, ApiError> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ApiError::bad_params(format!("missing {key}")))
}
