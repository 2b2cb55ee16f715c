//! File-backed ledger with a single-writer cursor.

use crate::entry::LedgerEntry;
use crate::error::LedgerError;
use crate::replay::{replay, Replay, VerifyReport};
use crate::{EncodingError, Event};
use chrono::{DateTime, SubsecRound, Utc};
use fs2::FileExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What `open` does when the final line was never completely written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Fail with [`LedgerError::Corruption`].
    #[default]
    Refuse,
    /// Truncate the stream to the last well-formed entry and continue.
    ///
    /// Only a torn tail is repaired; any other inconsistency still refuses.
    TruncateTornTail,
}

struct WriterState {
    /// Append handle; holds the exclusive advisory lock.
    file: File,
    head: String,
    len: usize,
    bytes: u64,
    last_timestamp: Option<DateTime<Utc>>,
    /// Set when a failed write could not be rolled back.
    poisoned: bool,
    /// Write this many bytes of the next line, then fail.
    #[cfg(test)]
    fail_after: Option<usize>,
}

impl WriterState {
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        }
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        #[cfg(test)]
        if let Some(n) = self.fail_after.take() {
            self.file.write_all(&line[..n.min(line.len())])?;
            return Err(io::Error::other("injected write failure"));
        }
        self.file.write_all(line)?;
        self.file.sync_data()
    }
}

/// Append-only, hash-chained audit ledger.
///
/// One `Ledger` per stream: it holds an exclusive advisory lock on the file
/// for its whole lifetime, and the in-process cursor sits behind a mutex so
/// concurrent [`append`](Self::append) calls form a single chain.
pub struct Ledger {
    path: PathBuf,
    state: Mutex<WriterState>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("path", &self.path)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

fn require_path(path: &Path) -> Result<(), LedgerError> {
    if path.as_os_str().is_empty() {
        return Err(LedgerError::Configuration(
            "ledger path must be provided and not empty".to_string(),
        ));
    }
    Ok(())
}

impl Ledger {
    /// Open or create the ledger at `path`, refusing a torn tail.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        Self::open_with(path, RecoveryPolicy::Refuse)
    }

    /// Open or create the ledger at `path` with an explicit recovery policy.
    ///
    /// The whole chain is verified before the cursor is trusted; any
    /// inconsistency other than a torn tail (under
    /// [`RecoveryPolicy::TruncateTornTail`]) is a
    /// [`LedgerError::Corruption`].
    pub fn open_with(path: impl AsRef<Path>, policy: RecoveryPolicy) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        require_path(&path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        FileExt::try_lock_exclusive(&file).map_err(|_| LedgerError::Locked { path: path.clone() })?;

        let mut bytes = Vec::new();
        {
            let mut reader = file.try_clone()?;
            reader.seek(SeekFrom::Start(0))?;
            reader.read_to_end(&mut bytes)?;
        }

        let Replay {
            report,
            head,
            last_timestamp,
            complete_len,
        } = {
            let replayed = replay(&bytes);
            if replayed.report.is_intact() {
                replayed
            } else if replayed.only_torn_tail() && policy == RecoveryPolicy::TruncateTornTail {
                warn!(
                    path = %path.display(),
                    dropped_bytes = bytes.len() as u64 - replayed.complete_len,
                    "truncating torn tail entry from ledger"
                );
                file.set_len(replayed.complete_len)?;
                file.sync_all()?;
                replay(&bytes[..replayed.complete_len as usize])
            } else {
                let first = replayed
                    .report
                    .first_inconsistency()
                    .cloned()
                    .map(|i| (i.index, format!("{}: {}", i.kind, i.detail)))
                    .unwrap_or((0, "unknown".to_string()));
                return Err(LedgerError::Corruption {
                    index: first.0,
                    reason: first.1,
                });
            }
        };

        info!(path = %path.display(), entries = report.entries, "ledger opened");

        Ok(Self {
            path,
            state: Mutex::new(WriterState {
                file,
                head,
                len: report.entries,
                bytes: complete_len,
                last_timestamp,
                poisoned: false,
                #[cfg(test)]
                fail_after: None,
            }),
        })
    }

    /// Append `event` and return its `entry_hash`.
    ///
    /// The entry is flushed and synced before the cursor advances. On an
    /// encoding error nothing is written; on a write error the stream is
    /// truncated back to its previous length.
    pub fn append(&self, event: &Event) -> Result<String, LedgerError> {
        let mut state = self.state.lock();

        if state.poisoned {
            return Err(LedgerError::Corruption {
                index: state.len,
                reason: "an earlier failed write could not be rolled back".to_string(),
            });
        }

        let entry = LedgerEntry::new(state.next_timestamp(), event.clone(), state.head.clone())?;
        let line = entry.to_line()?;

        if let Err(e) = state.write_line(&line) {
            let previous = state.bytes;
            if let Err(rollback) = state.file.set_len(previous).and_then(|_| state.file.sync_all()) {
                warn!(path = %self.path.display(), error = %rollback, "ledger rollback failed");
                state.poisoned = true;
            }
            return Err(LedgerError::Io(e));
        }

        state.bytes += line.len() as u64;
        state.len += 1;
        state.last_timestamp = Some(entry.timestamp);
        state.head = entry.entry_hash.clone();

        debug!(
            path = %self.path.display(),
            index = state.len - 1,
            entry_hash = %entry.entry_hash,
            "ledger entry appended"
        );
        Ok(entry.entry_hash)
    }

    /// Append any serializable value that encodes to a JSON object.
    pub fn append_value<T: Serialize + ?Sized>(&self, event: &T) -> Result<String, LedgerError> {
        let value = serde_json::to_value(event).map_err(EncodingError::from)?;
        match value {
            serde_json::Value::Object(map) => self.append(&map),
            other => Err(EncodingError::NotAnObject(crate::canonical::kind_name(&other)).into()),
        }
    }

    /// Verify the stream while holding the writer lock.
    pub fn verify(&self) -> Result<VerifyReport, LedgerError> {
        let _state = self.state.lock();
        let mut bytes = Vec::new();
        File::open(&self.path)?.read_to_end(&mut bytes)?;
        Ok(replay(&bytes).report)
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.state.lock().len
    }

    /// Whether no entry has been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `entry_hash` of the last entry, or zeros when empty.
    pub fn head_hash(&self) -> String {
        self.state.lock().head.clone()
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let _ = FileExt::unlock(&state.file);
    }
}

pub(crate) fn verify_path(path: &Path) -> Result<VerifyReport, LedgerError> {
    require_path(path)?;

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(VerifyReport::default()),
        Err(e) => return Err(e.into()),
    };
    FileExt::try_lock_shared(&file).map_err(|_| LedgerError::Locked {
        path: path.to_path_buf(),
    })?;

    let mut bytes = Vec::new();
    let read = (&file).read_to_end(&mut bytes);
    let _ = FileExt::unlock(&file);
    read?;

    Ok(replay(&bytes).report)
}
