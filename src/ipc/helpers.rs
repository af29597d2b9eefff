use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::HandlerErr;

pub fn require_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

pub fn opt_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

pub fn require_date(params: &Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    let raw = require_str(params, key)?;
    raw.parse()
        .map_err(|_| HandlerErr::bad_params(format!("{key} must be YYYY-MM-DD")))
}

pub fn opt_date(params: &Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    match opt_str(params, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| HandlerErr::bad_params(format!("{key} must be YYYY-MM-DD"))),
    }
}

/// Parse a typed value (enum, number) out of params.
pub fn require_parsed<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, HandlerErr> {
    let v = params
        .get(key)
        .cloned()
        .filter(|v| !v.is_null())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))?;
    serde_json::from_value(v).map_err(|_| HandlerErr::bad_params(format!("invalid {key}")))
}

pub fn opt_parsed<T: DeserializeOwned>(params: &Value, key: &str) -> Result<Option<T>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|_| HandlerErr::bad_params(format!("invalid {key}"))),
    }
}

/// Copy the named keys out of params into a mutation payload, skipping
/// null/absent values the way the query builder strips empty filters.
pub fn payload_from(params: &Value, keys: &[&str]) -> Value {
    let mut obj = serde_json::Map::new();
    for key in keys {
        if let Some(v) = params.get(*key) {
            if !v.is_null() {
                obj.insert((*key).to_string(), v.clone());
            }
        }
    }
    Value::Object(obj)
}
