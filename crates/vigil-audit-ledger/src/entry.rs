//! Ledger entry and its hash.

use crate::canonical::{self, EncodingError};
use crate::Event;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One committed record in the ledger.
///
/// The sequence number is the entry's line position and is not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerEntry {
    /// When the entry was appended (microsecond precision).
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,
    /// The recorded event.
    pub event: Event,
    /// `entry_hash` of the previous entry, or zeros for the first.
    pub prev_hash: String,
    /// Hash over `{event, prev_hash, timestamp}`.
    pub entry_hash: String,
}

/// The fields covered by `entry_hash`.
#[derive(Serialize)]
struct HashedFields<'a> {
    timestamp: String,
    event: &'a Event,
    prev_hash: &'a str,
}

impl LedgerEntry {
    /// Build an entry, computing its hash.
    pub fn new(
        timestamp: DateTime<Utc>,
        event: Event,
        prev_hash: impl Into<String>,
    ) -> Result<Self, EncodingError> {
        let prev_hash = prev_hash.into();
        let entry_hash = compute_hash(&timestamp, &event, &prev_hash)?;
        Ok(Self {
            timestamp,
            event,
            prev_hash,
            entry_hash,
        })
    }

    /// Recompute the hash from the stored fields.
    pub fn recompute_hash(&self) -> Result<String, EncodingError> {
        compute_hash(&self.timestamp, &self.event, &self.prev_hash)
    }

    /// Whether the stored hash matches the stored fields.
    pub fn is_self_consistent(&self) -> bool {
        self.recompute_hash()
            .map(|h| h == self.entry_hash)
            .unwrap_or(false)
    }

    /// Encode as one ledger line, newline included.
    pub fn to_line(&self) -> Result<Vec<u8>, EncodingError> {
        let mut line = canonical::encode(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

pub(crate) fn compute_hash(
    timestamp: &DateTime<Utc>,
    event: &Event,
    prev_hash: &str,
) -> Result<String, EncodingError> {
    canonical::digest(&HashedFields {
        timestamp: timestamp_format::render(timestamp),
        event,
        prev_hash,
    })
}

/// RFC 3339, six fractional digits, `Z` suffix. Anything else is rejected
/// on read so the hashed rendering is unique.
pub(crate) mod timestamp_format {
    use super::*;
    use serde::{de, Deserializer, Serializer};

    pub fn render(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&render(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let ts = DateTime::parse_from_rfc3339(&raw)
            .map_err(de::Error::custom)?
            .with_timezone(&Utc);
        if render(&ts) != raw {
            return Err(de::Error::custom(format!("non-canonical timestamp: {raw}")));
        }
        Ok(ts)
    }
}
