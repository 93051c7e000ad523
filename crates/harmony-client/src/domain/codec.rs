//! Message codec.
//!
//! Reply payloads arrive either as JSON documents or in the hub's
//! colon-separated `key=value` format:
//!
//! ```text
//! activityId=7596992:errorCode=200:errorString=OK
//! ```
//!
//! A doubled colon inside a field stands for a literal `:`. The hub uses this
//! to embed JSON-ish values, e.g. the `holdAction` descriptor
//! `action={"type"::"IRCommand"}:status=press`.

use crate::domain::error::{HubError, HubResult};
use serde::{Deserialize, Serialize};
use shared_types::EncodedMap;
use std::fmt;

/// Expected encoding of a reply payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// A JSON document.
    Json,
    /// Colon-separated `key=value` pairs.
    #[default]
    Encoded,
    /// Resolve without decoding.
    None,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Encoded => "encoded",
            Self::None => "none",
        })
    }
}

/// A decoded reply payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Encoded(EncodedMap),
    Empty,
}

impl Payload {
    /// String field lookup that works for both JSON objects and encoded maps.
    pub fn field(&self, key: &str) -> Option<&str> {
        match self {
            Self::Json(value) => value.get(key).and_then(serde_json::Value::as_str),
            Self::Encoded(map) => map.get(key),
            Self::Empty => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_encoded(self) -> Option<EncodedMap> {
        match self {
            Self::Encoded(map) => Some(map),
            _ => None,
        }
    }
}

/// Decode a raw payload with the given encoding.
pub fn decode(payload: &str, encoding: Encoding) -> HubResult<Payload> {
    match encoding {
        Encoding::Json => serde_json::from_str(payload)
            .map(Payload::Json)
            .map_err(|e| HubError::decode(Encoding::Json, e.to_string())),
        Encoding::Encoded => decode_encoded(payload).map(Payload::Encoded),
        Encoding::None => Ok(Payload::Empty),
    }
}

/// Decode the colon-separated `key=value` format.
///
/// An empty payload is an empty map. Every other field must contain `=`.
pub fn decode_encoded(payload: &str) -> HubResult<EncodedMap> {
    let mut map = EncodedMap::new();
    if payload.is_empty() {
        return Ok(map);
    }

    for field in split_fields(payload) {
        let (key, value) = field.split_once('=').ok_or_else(|| {
            HubError::decode(Encoding::Encoded, format!("field `{field}` has no `=`"))
        })?;
        map.insert(key, value);
    }
    Ok(map)
}

fn split_fields(payload: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = payload.chars().peekable();

    while let Some(c) = chars.next() {
        if c != ':' {
            current.push(c);
        } else if chars.next_if_eq(&':').is_some() {
            current.push(':');
        } else {
            fields.push(std::mem::take(&mut current));
        }
    }
    fields.push(current);
    fields
}

fn escape(raw: &str) -> String {
    raw.replace(':', "::")
}

/// Render a map in the colon-separated `key=value` format.
pub fn encode(map: &EncodedMap) -> String {
    map.iter()
        .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
        .collect::<Vec<_>>()
        .join(":")
}
