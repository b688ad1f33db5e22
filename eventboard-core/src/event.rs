//! Event record types.
//!
//! An `Event` is what the store hands back; a `NewEvent` is what validation
//! produces and the store accepts. The `date` field keeps whichever shape it
//! was written in (array, single timestamp or range) so reads round-trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A stored event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: EventDate,
    pub time: Option<EventTime>,
    pub location: String,
    pub source_url: Url,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Host part of the source URL (e.g. "www.example.com")
    pub fn source_host(&self) -> Option<&str> {
        self.source_url.host_str()
    }
}

/// A validated event that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: EventDate,
    pub time: Option<EventTime>,
    pub location: String,
    pub source_url: Url,
}

/// When an event happens.
///
/// `Many` is the canonical shape. `One` and `Range` come from older
/// ingesters and are kept as written until `into_canonical` is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventDate {
    Many(#[serde(with = "timestamp::many")] Vec<DateTime<Utc>>),
    One(#[serde(with = "timestamp")] DateTime<Utc>),
    Range {
        #[serde(with = "timestamp")]
        start: DateTime<Utc>,
        #[serde(with = "timestamp")]
        end: DateTime<Utc>,
    },
}

impl EventDate {
    /// Every timestamp this date carries, in stored order.
    /// A range contributes its two endpoints.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        match self {
            EventDate::Many(dates) => dates.clone(),
            EventDate::One(date) => vec![*date],
            EventDate::Range { start, end } => vec![*start, *end],
        }
    }

    /// Earliest timestamp; a range normalizes to its start.
    pub fn earliest(&self) -> Option<DateTime<Utc>> {
        match self {
            EventDate::Many(dates) => dates.iter().min().copied(),
            EventDate::One(date) => Some(*date),
            EventDate::Range { start, .. } => Some(*start),
        }
    }

    /// Latest timestamp; a range normalizes to its end.
    pub fn latest(&self) -> Option<DateTime<Utc>> {
        match self {
            EventDate::Many(dates) => dates.iter().max().copied(),
            EventDate::One(date) => Some(*date),
            EventDate::Range { end, .. } => Some(*end),
        }
    }

    /// Key used to order events. Dates without any timestamp sort first.
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.earliest().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// True if any carried timestamp lies in `[from, to]`.
    pub fn occurs_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.timestamps().iter().any(|ts| *ts >= from && *ts <= to)
    }

    /// The day as `format`, or "first - last" when the timestamps span
    /// several days. None when there is no timestamp.
    pub fn span_label(&self, format: &str) -> Option<String> {
        let first = self.earliest()?;
        let last = self.latest().unwrap_or(first);
        if first.date_naive() == last.date_naive() {
            Some(first.format(format).to_string())
        } else {
            Some(format!("{} - {}", first.format(format), last.format(format)))
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, EventDate::Many(_))
    }

    /// Convert to the array shape.
    pub fn into_canonical(self) -> EventDate {
        match self {
            EventDate::Many(dates) => EventDate::Many(dates),
            EventDate::One(date) => EventDate::Many(vec![date]),
            EventDate::Range { start, end } => EventDate::Many(vec![start, end]),
        }
    }
}

/// Time of day, kept as the validated ISO-8601 strings it was written with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    At(String),
    Span { start: String, end: String },
}

impl std::fmt::Display for EventTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventTime::At(time) => write!(f, "{time}"),
            EventTime::Span { start, end } => write!(f, "{start} - {end}"),
        }
    }
}

/// Millisecond-precision UTC timestamps in a fixed-width text form.
///
/// `YYYY-MM-DDTHH:MM:SS.mmmZ` sorts lexicographically in time order, which the
/// store relies on when comparing stored dates against a day window.
pub mod timestamp {
    use chrono::{DateTime, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.format(FORMAT).to_string()
    }

    /// Parse any RFC 3339 timestamp, normalized to UTC milliseconds.
    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| truncate(dt.with_timezone(&Utc)))
    }

    pub fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
        ts.trunc_subsecs(3)
    }

    pub fn now() -> DateTime<Utc> {
        truncate(Utc::now())
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub mod many {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de};

        pub fn serialize<S: Serializer>(
            dates: &[DateTime<Utc>],
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(dates.iter().map(super::format))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<DateTime<Utc>>, D::Error> {
            Vec::<String>::deserialize(deserializer)?
                .iter()
                .map(|raw| {
                    super::parse(raw)
                        .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
                })
                .collect()
        }
    }
}
