//! Adapts loosely shaped engine payloads (event name + JSON data, as the
//! browser engine reports them) into typed [`PlaybackEvent`]s.

use serde_json::Value;
use thiserror::Error;

use super::events::{EngineError, ErrorCategory, Fragment, PlaybackEvent};

pub const MANIFEST_PARSED: &str = "hlsManifestParsed";
pub const FRAG_CHANGED: &str = "hlsFragChanged";
pub const ERROR: &str = "hlsError";
pub const LOADED_METADATA: &str = "loadedmetadata";

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("unknown error type: {0}")]
    UnknownErrorType(String),
}

pub fn adapt_event(name: &str, data: &Value) -> Result<PlaybackEvent, PayloadError> {
    match name {
        MANIFEST_PARSED => Ok(PlaybackEvent::ManifestParsed),
        LOADED_METADATA => Ok(PlaybackEvent::MetadataLoaded),
        FRAG_CHANGED => {
            let frag = data.get("frag").ok_or(PayloadError::MissingField("frag"))?;
            adapt_fragment(frag).map(PlaybackEvent::FragmentChanged)
        }
        ERROR => adapt_error(data).map(PlaybackEvent::Error),
        other => Err(PayloadError::UnknownEvent(other.to_string())),
    }
}

pub fn adapt_fragment(frag: &Value) -> Result<Fragment, PayloadError> {
    let sn = match frag.get("sn") {
        None | Some(Value::Null) => return Err(PayloadError::MissingField("sn")),
        Some(value) => value.as_u64().ok_or_else(|| PayloadError::InvalidField {
            field: "sn",
            reason: format!("expected a media sequence number, got {value}"),
        })?,
    };

    let duration = match frag.get("duration") {
        None | Some(Value::Null) => return Err(PayloadError::MissingField("duration")),
        Some(value) => value.as_f64().ok_or_else(|| PayloadError::InvalidField {
            field: "duration",
            reason: format!("expected seconds, got {value}"),
        })?,
    };
    if !duration.is_finite() || duration < 0.0 {
        return Err(PayloadError::InvalidField {
            field: "duration",
            reason: format!("{duration} is not a valid duration"),
        });
    }

    let url = match frag.get("url") {
        None | Some(Value::Null) => None,
        Some(Value::String(url)) => Some(url.clone()),
        Some(other) => {
            return Err(PayloadError::InvalidField {
                field: "url",
                reason: format!("expected a string, got {other}"),
            })
        }
    };

    Ok(Fragment { sn, duration, url })
}

pub fn adapt_error(data: &Value) -> Result<EngineError, PayloadError> {
    let raw_type = data
        .get("type")
        .and_then(Value::as_str)
        .ok_or(PayloadError::MissingField("type"))?;
    let category = ErrorCategory::parse(raw_type)
        .ok_or_else(|| PayloadError::UnknownErrorType(raw_type.to_string()))?;
    let fatal = match data.get("fatal") {
        None | Some(Value::Null) => false,
        Some(value) => value.as_bool().ok_or_else(|| PayloadError::InvalidField {
            field: "fatal",
            reason: format!("expected a boolean, got {value}"),
        })?,
    };
    let details = data
        .get("details")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(EngineError {
        category,
        fatal,
        details,
    })
}
