//! Append-only journal file backing the ledger store
//!
//! Each committed unit is written as a single JSON array on its own line. A unit
//! is therefore durable exactly when its line is complete: on replay a torn
//! trailing line (a crash mid-write) is dropped and the file truncated back to
//! the last complete unit.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::types::{LedgerError, TransactionRecord};

/// Open journal file
#[derive(Debug)]
pub struct Journal {
    file: File,
    path: PathBuf,
    /// Length of the file up to the end of the last complete unit
    committed_len: u64,
}

impl Journal {
    /// Open or create a journal and replay its committed units
    ///
    /// # Returns
    ///
    /// * `Ok((Journal, Vec<TransactionRecord>))` - The journal positioned for
    ///   appending, and every replayed record in commit order
    /// * `Err(LedgerError::StorageError)` - If the file cannot be opened or a
    ///   unit other than the last one is corrupt
    pub fn open(path: &Path) -> Result<(Self, Vec<TransactionRecord>), LedgerError> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| {
                LedgerError::storage(format!("cannot open journal '{}': {}", path.display(), e))
            })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let mut records = Vec::new();
        let mut committed_len = 0u64;
        let mut units = 0usize;

        for line in contents.split_inclusive('\n') {
            if !line.ends_with('\n') {
                warn!(
                    path = %path.display(),
                    bytes = line.len(),
                    "dropping torn trailing journal entry"
                );
                break;
            }

            let unit: Vec<TransactionRecord> =
                serde_json::from_str(line.trim_end()).map_err(|e| {
                    LedgerError::storage(format!(
                        "corrupt journal '{}' after {} units: {}",
                        path.display(),
                        units,
                        e
                    ))
                })?;
            records.extend(unit);
            committed_len += line.len() as u64;
            units += 1;
        }

        if committed_len < contents.len() as u64 {
            file.set_len(committed_len)?;
        }

        info!(
            path = %path.display(),
            units,
            records = records.len(),
            "journal replayed"
        );

        Ok((
            Journal {
                file,
                path: path.to_path_buf(),
                committed_len,
            },
            records,
        ))
    }

    /// Durably write one unit
    ///
    /// On failure the file is truncated back to the previous unit, so a failed
    /// write never leaves a partial line behind for later units to follow.
    pub fn write_unit(&mut self, records: &[TransactionRecord]) -> Result<(), LedgerError> {
        let mut line = serde_json::to_vec(records)?;
        line.push(b'\n');

        let written = self
            .file
            .write_all(&line)
            .and_then(|_| self.file.sync_data());

        match written {
            Ok(()) => {
                self.committed_len += line.len() as u64;
                Ok(())
            }
            Err(e) => {
                if let Err(truncate) = self.file.set_len(self.committed_len) {
                    warn!(
                        path = %self.path.display(),
                        error = %truncate,
                        "failed to truncate journal after write error"
                    );
                }
                Err(LedgerError::storage(format!(
                    "journal write to '{}' failed: {}",
                    self.path.display(),
                    e
                )))
            }
        }
    }

    /// Flush everything to disk
    pub fn sync(&mut self) -> Result<(), LedgerError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountId;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_empty_journal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.journal");

        let (_journal, records) = Journal::open(&path).unwrap();

        assert!(records.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn test_units_replay_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        let account = AccountId::new();
        let first = TransactionRecord::deposit(account, Decimal::new(10000, 2));
        let second = TransactionRecord::withdrawal(account, Decimal::new(2500, 2), None);

        {
            let (mut journal, _) = Journal::open(&path).unwrap();
            journal.write_unit(&[first.clone()]).unwrap();
            journal.write_unit(&[second.clone()]).unwrap();
            journal.sync().unwrap();
        }

        let (_journal, records) = Journal::open(&path).unwrap();
        assert_eq!(records, vec![first, second]);
    }

    #[test]
    fn test_torn_tail_is_dropped_and_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        let record = TransactionRecord::deposit(AccountId::new(), Decimal::new(500, 2));

        {
            let (mut journal, _) = Journal::open(&path).unwrap();
            journal.write_unit(&[record.clone()]).unwrap();
        }
        let intact_len = std::fs::metadata(&path).unwrap().len();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"[{\"id\":\"torn").unwrap();
        }

        let (mut journal, records) = Journal::open(&path).unwrap();
        assert_eq!(records, vec![record.clone()]);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), intact_len);

        // Appending after recovery yields a clean file
        journal.write_unit(&[record.clone()]).unwrap();
        drop(journal);
        let (_journal, records) = Journal::open(&path).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_corrupt_middle_unit_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        std::fs::write(&path, "not json\n[]\n").unwrap();

        let result = Journal::open(&path);
        assert!(matches!(result, Err(LedgerError::StorageError { .. })));
    }
}
