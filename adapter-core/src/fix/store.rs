//! Sequence-number and outbound-message persistence (spec.md §4.6).
//!
//! Every outbound sequence number is written to the store *before* the
//! message leaves the process — reversing that order is how sessions lose
//! sync with the counterparty after a crash. The trait is the seam a test
//! double swaps in; [`FileSequenceStore`] is the production implementation.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write as IoWrite};
use std::path::{Path, PathBuf};

/// Persists the session's next-expected sequence numbers and a journal of
/// outbound message bytes for resend requests.
pub trait SequenceStore: Send + Sync {
    fn next_out_seq(&self) -> io::Result<u64>;
    fn set_next_out_seq(&self, seq: u64) -> io::Result<()>;
    fn next_in_seq(&self) -> io::Result<u64>;
    fn set_next_in_seq(&self, seq: u64) -> io::Result<()>;

    /// Append an outbound message's raw bytes, keyed by its MsgSeqNum, so a
    /// ResendRequest can be answered without re-deriving the message.
    fn store_outbound(&self, seq: u64, raw: &[u8]) -> io::Result<()>;
    fn load_outbound(&self, seq: u64) -> io::Result<Option<Vec<u8>>>;
}

/// File-backed [`SequenceStore`]: two small counter files plus an
/// append-only journal of `seq\x01<bytes>\n`-framed outbound messages.
///
/// Mirrors the counter-file-plus-journal layout the source adapter used for
/// its FIX session persistence (spec.md §4.6), adapted to plain `std::fs`
/// since no database dependency is otherwise needed by this core.
pub struct FileSequenceStore {
    out_seq_path: PathBuf,
    in_seq_path: PathBuf,
    journal_path: PathBuf,
}

impl FileSequenceStore {
    pub fn new(base_dir: impl AsRef<Path>) -> io::Result<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir)?;
        let store = Self {
            out_seq_path: base_dir.join("out_seq"),
            in_seq_path: base_dir.join("in_seq"),
            journal_path: base_dir.join("outbound.journal"),
        };
        if !store.out_seq_path.exists() {
            store.set_next_out_seq(1)?;
        }
        if !store.in_seq_path.exists() {
            store.set_next_in_seq(1)?;
        }
        Ok(store)
    }

    fn read_counter(path: &Path) -> io::Result<u64> {
        let raw = fs::read_to_string(path)?;
        raw.trim()
            .parse()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "corrupt sequence counter"))
    }

    fn write_counter(path: &Path, seq: u64) -> io::Result<()> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, seq.to_string())?;
        fs::rename(tmp, path)
    }
}

impl SequenceStore for FileSequenceStore {
    fn next_out_seq(&self) -> io::Result<u64> {
        Self::read_counter(&self.out_seq_path)
    }

    fn set_next_out_seq(&self, seq: u64) -> io::Result<()> {
        Self::write_counter(&self.out_seq_path, seq)
    }

    fn next_in_seq(&self) -> io::Result<u64> {
        Self::read_counter(&self.in_seq_path)
    }

    fn set_next_in_seq(&self, seq: u64) -> io::Result<()> {
        Self::write_counter(&self.in_seq_path, seq)
    }

    fn store_outbound(&self, seq: u64, raw: &[u8]) -> io::Result<()> {
        let mut file = fs::OpenOptions::new().create(true).append(true).open(&self.journal_path)?;
        write!(file, "{seq}\u{1}")?;
        file.write_all(raw)?;
        writeln!(file)
    }

    fn load_outbound(&self, seq: u64) -> io::Result<Option<Vec<u8>>> {
        let mut file = match fs::File::open(&self.journal_path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let mut contents = String::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_string(&mut contents)?;

        let prefix = format!("{seq}\u{1}");
        for line in contents.lines() {
            if let Some(rest) = line.strip_prefix(&prefix) {
                return Ok(Some(rest.as_bytes().to_vec()));
            }
        }
        Ok(None)
    }
}

/// In-memory [`SequenceStore`] for tests.
#[derive(Default)]
pub struct MemorySequenceStore {
    inner: parking_lot::Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_out_seq: u64,
    next_in_seq: u64,
    outbound: std::collections::HashMap<u64, Vec<u8>>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self {
            inner: parking_lot::Mutex::new(MemoryState {
                next_out_seq: 1,
                next_in_seq: 1,
                outbound: std::collections::HashMap::new(),
            }),
        }
    }
}

impl SequenceStore for MemorySequenceStore {
    fn next_out_seq(&self) -> io::Result<u64> {
        Ok(self.inner.lock().next_out_seq)
    }

    fn set_next_out_seq(&self, seq: u64) -> io::Result<()> {
        self.inner.lock().next_out_seq = seq;
        Ok(())
    }

    fn next_in_seq(&self) -> io::Result<u64> {
        Ok(self.inner.lock().next_in_seq)
    }

    fn set_next_in_seq(&self, seq: u64) -> io::Result<()> {
        self.inner.lock().next_in_seq = seq;
        Ok(())
    }

    fn store_outbound(&self, seq: u64, raw: &[u8]) -> io::Result<()> {
        self.inner.lock().outbound.insert(seq, raw.to_vec());
        Ok(())
    }

    fn load_outbound(&self, seq: u64) -> io::Result<Option<Vec<u8>>> {
        Ok(self.inner.lock().outbound.get(&seq).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_persists_sequence_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileSequenceStore::new(dir.path()).unwrap();
            assert_eq!(store.next_out_seq().unwrap(), 1);
            store.set_next_out_seq(42).unwrap();
        }
        let reopened = FileSequenceStore::new(dir.path()).unwrap();
        assert_eq!(reopened.next_out_seq().unwrap(), 42);
    }

    #[test]
    fn file_store_round_trips_outbound_journal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSequenceStore::new(dir.path()).unwrap();
        store.store_outbound(3, b"8=FIX.4.4\x019=5\x0110=000\x01").unwrap();
        let loaded = store.load_outbound(3).unwrap().unwrap();
        assert_eq!(loaded, b"8=FIX.4.4\x019=5\x0110=000\x01");
        assert!(store.load_outbound(4).unwrap().is_none());
    }

    #[test]
    fn memory_store_defaults_to_sequence_one() {
        let store = MemorySequenceStore::new();
        assert_eq!(store.next_out_seq().unwrap(), 1);
        assert_eq!(store.next_in_seq().unwrap(), 1);
    }
}
