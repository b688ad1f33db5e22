//! Write-time validation.
//!
//! `EventInput` is whatever an ingester or HTTP client sent us. Nothing in it is
//! trusted: `validate` either produces a typed `NewEvent` or rejects the input
//! with one message per offending field. Inputs are never coerced.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::constants::MIN_TEXT_LEN;
use crate::event::{EventDate, EventTime, NewEvent, timestamp};

const TITLE_MESSAGE: &str = "Title must be at least 3 characters long";
const LOCATION_MESSAGE: &str = "Location must be at least 3 characters long";
const URL_MESSAGE: &str = "Invalid URL format";
const DATE_MESSAGE: &str = "Invalid date format. Use ISO 8601 (e.g., '2023-01-01T12:00:00Z')";
const DATE_SHAPE_MESSAGE: &str =
    "Date must be a timestamp, an array of timestamps, or an object with start and end";
const TIME_MESSAGE: &str = "Invalid time format. Use ISO 8601 (e.g., '12:00:00')";
const TIME_SHAPE_MESSAGE: &str =
    "Time must be either a string or an object with start and end properties";

/// Raw event fields as received from an ingester
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<Value>,
    pub time: Option<Value>,
    pub location: Option<String>,
    pub source_url: Option<String>,
}

/// One rejected field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed validation, in field order
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", summarize(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Message for a given field, if it failed.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl EventInput {
    /// Check every field and build a `NewEvent`, or report all failures at once.
    pub fn validate(self) -> Result<NewEvent, ValidationErrors> {
        let mut errors = Vec::new();
        let mut reject = |field: &'static str, message: &str| {
            errors.push(FieldError {
                field,
                message: message.to_string(),
            })
        };

        let title = self.title.filter(|t| long_enough(t));
        if title.is_none() {
            reject("title", TITLE_MESSAGE);
        }

        let date = match self.date.as_ref().map(parse_date) {
            Some(Ok(date)) => Some(date),
            Some(Err(message)) => {
                reject("date", message);
                None
            }
            None => {
                reject("date", DATE_SHAPE_MESSAGE);
                None
            }
        };

        let time = match self
            .time
            .as_ref()
            .filter(|v| !v.is_null())
            .map(parse_time)
            .transpose()
        {
            Ok(time) => time,
            Err(message) => {
                reject("time", message);
                None
            }
        };

        let location = self.location.filter(|l| long_enough(l));
        if location.is_none() {
            reject("location", LOCATION_MESSAGE);
        }

        let source_url = self
            .source_url
            .as_deref()
            .and_then(|raw| Url::parse(raw.trim()).ok());
        if source_url.is_none() {
            reject("sourceUrl", URL_MESSAGE);
        }

        match (title, date, location, source_url) {
            (Some(title), Some(date), Some(location), Some(source_url)) if errors.is_empty() => {
                Ok(NewEvent {
                    title,
                    description: self.description,
                    date,
                    time,
                    location,
                    source_url,
                })
            }
            _ => Err(ValidationErrors(errors)),
        }
    }
}

fn long_enough(s: &str) -> bool {
    s.chars().count() >= MIN_TEXT_LEN
}

fn parse_date(value: &Value) -> Result<EventDate, &'static str> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err("Date must contain at least one timestamp");
            }
            items
                .iter()
                .map(|item| item.as_str().and_then(parse_utc).ok_or(DATE_MESSAGE))
                .collect::<Result<Vec<_>, _>>()
                .map(EventDate::Many)
        }
        Value::String(raw) => parse_utc(raw).map(EventDate::One).ok_or(DATE_MESSAGE),
        Value::Object(map) => {
            let (Some(start), Some(end)) = (map.get("start"), map.get("end")) else {
                return Err(DATE_SHAPE_MESSAGE);
            };
            let start = start.as_str().and_then(parse_utc).ok_or(DATE_MESSAGE)?;
            let end = end.as_str().and_then(parse_utc).ok_or(DATE_MESSAGE)?;
            if end < start {
                return Err("Date range must not end before it starts");
            }
            Ok(EventDate::Range { start, end })
        }
        _ => Err(DATE_SHAPE_MESSAGE),
    }
}

/// UTC date-time with a `Z` designator; numeric offsets are rejected.
fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if !raw.ends_with('Z') {
        return None;
    }
    timestamp::parse(raw)
}

fn parse_time(value: &Value) -> Result<EventTime, &'static str> {
    match value {
        Value::String(raw) => {
            if is_iso_time(raw) {
                Ok(EventTime::At(raw.clone()))
            } else {
                Err(TIME_MESSAGE)
            }
        }
        Value::Object(map) => match (map.get("start"), map.get("end")) {
            (Some(Value::String(start)), Some(Value::String(end))) => {
                if is_iso_time(start) && is_iso_time(end) {
                    Ok(EventTime::Span {
                        start: start.clone(),
                        end: end.clone(),
                    })
                } else {
                    Err(TIME_MESSAGE)
                }
            }
            _ => Err(TIME_SHAPE_MESSAGE),
        },
        _ => Err(TIME_SHAPE_MESSAGE),
    }
}

/// `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`, two-digit fields only.
fn is_iso_time(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    if bytes.len() < 5 || bytes[2] != b':' || (bytes.len() > 5 && bytes[5] != b':') {
        return false;
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f").is_ok()
        || NaiveTime::parse_from_str(raw, "%H:%M").is_ok()
}
