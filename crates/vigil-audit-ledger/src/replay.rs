//! Chain replay shared by `open` and `verify`.

use crate::canonical;
use crate::entry::LedgerEntry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use vigil_common_core::ZERO_DIGEST;

/// What kind of inconsistency an entry exhibits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InconsistencyKind {
    /// The line is not a well-formed entry.
    Malformed,
    /// The stored `entry_hash` does not match the stored fields.
    HashMismatch,
    /// `prev_hash` does not match the previous entry's recomputed hash.
    ChainBreak,
    /// The stored bytes differ from the canonical encoding of the entry.
    NonCanonical,
    /// The final line was never completely written.
    TornTail,
}

impl fmt::Display for InconsistencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Malformed => "malformed entry",
            Self::HashMismatch => "hash mismatch",
            Self::ChainBreak => "chain break",
            Self::NonCanonical => "non-canonical encoding",
            Self::TornTail => "torn final entry",
        };
        f.write_str(s)
    }
}

/// A single detected problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inconsistency {
    /// Zero-based entry position.
    pub index: usize,
    /// Problem classification.
    pub kind: InconsistencyKind,
    /// Human-readable detail.
    pub detail: String,
}

/// Result of replaying a ledger stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Number of entries (lines) inspected.
    pub entries: usize,
    /// Every directly detected inconsistency, in stream order.
    pub inconsistencies: Vec<Inconsistency>,
}

impl VerifyReport {
    /// Whether the chain is intact through the last entry.
    pub fn is_intact(&self) -> bool {
        self.inconsistencies.is_empty()
    }

    /// The first inconsistency, if any.
    pub fn first_inconsistency(&self) -> Option<&Inconsistency> {
        self.inconsistencies.first()
    }

    /// Number of leading entries that can be trusted. Everything from the
    /// first inconsistency on is untrusted, since later hashes depend on it.
    pub fn trusted_prefix(&self) -> usize {
        self.first_inconsistency()
            .map(|i| i.index)
            .unwrap_or(self.entries)
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_inconsistency() {
            None => write!(f, "intact, {} entries", self.entries),
            Some(first) => write!(
                f,
                "inconsistent at index {} ({}: {})",
                first.index, first.kind, first.detail
            ),
        }
    }
}

/// Replay state needed to resume appending.
#[derive(Debug)]
pub(crate) struct Replay {
    pub report: VerifyReport,
    /// Stored hash of the last well-formed entry.
    pub head: String,
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Byte length of the stream up to the last newline.
    pub complete_len: u64,
}

impl Replay {
    /// The report contains exactly one problem and it is a torn tail.
    pub fn only_torn_tail(&self) -> bool {
        matches!(
            self.report.inconsistencies.as_slice(),
            [only] if only.kind == InconsistencyKind::TornTail
        )
    }
}

pub(crate) fn replay(bytes: &[u8]) -> Replay {
    let mut report = VerifyReport::default();
    let mut head = ZERO_DIGEST.to_string();
    let mut last_timestamp = None;
    // Recomputed hash of the previous entry; None if it was unreadable.
    let mut expected_prev: Option<String> = Some(ZERO_DIGEST.to_string());
    let mut complete_len = 0u64;
    let mut offset = 0usize;
    let mut index = 0usize;

    while offset < bytes.len() {
        let rest = &bytes[offset..];
        let (line, terminated) = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&rest[..end], true),
            None => (rest, false),
        };
        offset += line.len() + usize::from(terminated);

        if !terminated {
            report.inconsistencies.push(Inconsistency {
                index,
                kind: InconsistencyKind::TornTail,
                detail: format!("{} trailing bytes without a newline", line.len()),
            });
            report.entries = index + 1;
            break;
        }
        complete_len = offset as u64;

        match serde_json::from_slice::<LedgerEntry>(line) {
            Err(e) => {
                report.inconsistencies.push(Inconsistency {
                    index,
                    kind: InconsistencyKind::Malformed,
                    detail: e.to_string(),
                });
                expected_prev = None;
            }
            Ok(entry) => {
                let recomputed = entry.recompute_hash().ok();
                if recomputed.as_deref() != Some(entry.entry_hash.as_str()) {
                    report.inconsistencies.push(Inconsistency {
                        index,
                        kind: InconsistencyKind::HashMismatch,
                        detail: format!("stored entry_hash {} does not match contents", entry.entry_hash),
                    });
                }
                // Hashes cover the parsed value, so the bytes must be pinned too.
                if !matches!(canonical::encode(&entry), Ok(encoded) if encoded == line) {
                    report.inconsistencies.push(Inconsistency {
                        index,
                        kind: InconsistencyKind::NonCanonical,
                        detail: "stored bytes are not the canonical encoding".to_string(),
                    });
                }
                match &expected_prev {
                    Some(expected) if *expected == entry.prev_hash => {}
                    Some(expected) => report.inconsistencies.push(Inconsistency {
                        index,
                        kind: InconsistencyKind::ChainBreak,
                        detail: format!("prev_hash {} expected {}", entry.prev_hash, expected),
                    }),
                    None => report.inconsistencies.push(Inconsistency {
                        index,
                        kind: InconsistencyKind::ChainBreak,
                        detail: "previous entry is unreadable".to_string(),
                    }),
                }
                expected_prev = recomputed;
                head = entry.entry_hash;
                last_timestamp = Some(entry.timestamp);
            }
        }

        index += 1;
        report.entries = index;
    }

    Replay {
        report,
        head,
        last_timestamp,
        complete_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Event;
    use chrono::TimeZone;
    use serde_json::json;

    fn chain(n: usize) -> Vec<u8> {
        let mut prev = ZERO_DIGEST.to_string();
        let mut out = Vec::new();
        for i in 0..n {
            let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, i as u32).unwrap();
            let event: Event = json!({"n": i}).as_object().cloned().unwrap();
            let entry = LedgerEntry::new(ts, event, prev.clone()).unwrap();
            prev = entry.entry_hash.clone();
            out.extend(entry.to_line().unwrap());
        }
        out
    }

    #[test]
    fn test_empty_stream() {
        let r = replay(b"");
        assert!(r.report.is_intact());
        assert_eq!(r.report.entries, 0);
        assert_eq!(r.head, ZERO_DIGEST);
        assert_eq!(r.complete_len, 0);
    }

    #[test]
    fn test_intact_chain() {
        let bytes = chain(4);
        let r = replay(&bytes);
        assert!(r.report.is_intact());
        assert_eq!(r.report.entries, 4);
        assert_eq!(r.complete_len, bytes.len() as u64);
        assert_eq!(r.report.to_string(), "intact, 4 entries");
    }

    #[test]
    fn test_dropped_entry_is_chain_break() {
        let bytes = chain(3);
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        let spliced = format!("{}\n{}\n", lines[0], lines[2]);

        let r = replay(spliced.as_bytes());
        let first = r.report.first_inconsistency().unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(first.kind, InconsistencyKind::ChainBreak);
    }

    #[test]
    fn test_torn_tail_detected() {
        let mut bytes = chain(2);
        let good = bytes.len() as u64;
        bytes.extend_from_slice(b"{\"entry_hash\":\"ab");

        let r = replay(&bytes);
        assert!(r.only_torn_tail());
        assert_eq!(r.report.entries, 3);
        assert_eq!(r.report.first_inconsistency().unwrap().index, 2);
        assert_eq!(r.complete_len, good);
    }

    #[test]
    fn test_reformatted_line_is_non_canonical() {
        let bytes = chain(2);
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        let spaced = lines[0].replacen(",", ", ", 1);
        let reformatted = format!("{}\n{}\n", spaced, lines[1]);

        let r = replay(reformatted.as_bytes());
        let kinds: Vec<_> = r.report.inconsistencies.iter().map(|i| (i.index, i.kind)).collect();
        assert_eq!(kinds, vec![(0, InconsistencyKind::NonCanonical)]);
        assert_eq!(r.report.trusted_prefix(), 0);
    }

    #[test]
    fn test_garbage_line_marks_following_entry() {
        let bytes = chain(3);
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        let damaged = format!("{}\nnot json\n{}\n", lines[0], lines[2]);

        let r = replay(damaged.as_bytes());
        let kinds: Vec<_> = r.report.inconsistencies.iter().map(|i| (i.index, i.kind)).collect();
        assert_eq!(
            kinds,
            vec![(1, InconsistencyKind::Malformed), (2, InconsistencyKind::ChainBreak)]
        );
        assert_eq!(r.report.trusted_prefix(), 1);
    }
}
