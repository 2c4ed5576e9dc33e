//! Append-only CSV ledger of observed tokens.
//!
//! File layout:
//! - One header row: `Timestamp,Token Address,Token Name,Token Symbol`
//! - One row per token, appended on first sighting of its address
//!
//! Each row is serialized in memory and written with a single append, so a
//! crash leaves either the whole row or nothing. A torn tail from an older
//! writer is terminated before the next row, closing any open quoted field
//! first so later rows stay visible to the reader.
//!
//! Membership is answered from an in-memory set of addresses, loaded from
//! the file on first use and extended after each successful append.

use crate::error::PersistenceResult;
use mintscan_core::TokenRecord;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Ledger header row.
pub const LEDGER_HEADER: [&str; 4] = ["Timestamp", "Token Address", "Token Name", "Token Symbol"];

/// Column holding the natural key.
const ADDRESS_COLUMN: &str = "Token Address";
const ADDRESS_COLUMN_FALLBACK: usize = 1;

/// Result of an append request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A new row was written.
    Appended,
    /// The address was already present; nothing was written.
    Duplicate,
}

/// One data row as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub timestamp: String,
    pub address: String,
    pub name: String,
    pub symbol: String,
}

/// Address index mirrored from the file.
struct LedgerIndex {
    addresses: HashSet<String>,
    /// File exists and already carries a header.
    has_header: bool,
    /// How the last record on disk ends.
    tail: Tail,
}

/// State of the file's last record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    /// Empty, or ends with a record terminator.
    Clean,
    /// Torn outside a quoted field.
    Unterminated,
    /// Torn inside a quoted field.
    OpenQuote,
}

impl Tail {
    fn of(bytes: &[u8]) -> Self {
        // A doubled quote toggles twice, so parity is the quoting state
        let open_quote = bytes.iter().filter(|&&b| b == b'"').count() % 2 == 1;
        match bytes.last() {
            _ if open_quote => Self::OpenQuote,
            Some(&last) if last != b'\n' => Self::Unterminated,
            _ => Self::Clean,
        }
    }

    /// Bytes that terminate the torn record before the next row.
    fn repair(self) -> &'static [u8] {
        match self {
            Self::Clean => b"",
            Self::Unterminated => b"\n",
            Self::OpenQuote => b"\"\n",
        }
    }
}

/// CSV ledger with address deduplication.
pub struct CsvLedger {
    path: PathBuf,
    index: Option<LedgerIndex>,
}

impl CsvLedger {
    /// Create a ledger at `path`.
    ///
    /// Nothing is read or written until the first `exists`/`append` call, so
    /// an unreadable file only affects individual events.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        // Create directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(error = %e, dir = %parent.display(), "Failed to create ledger directory");
            }
        }

        Self { path, index: None }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether `address` already has a row.
    pub fn exists(&mut self, address: &str) -> PersistenceResult<bool> {
        Ok(self.index()?.addresses.contains(address))
    }

    /// Number of distinct addresses recorded.
    pub fn len(&mut self) -> PersistenceResult<usize> {
        Ok(self.index()?.addresses.len())
    }

    /// Whether the ledger holds no rows.
    pub fn is_empty(&mut self) -> PersistenceResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Append a row for `record` unless its address is already present.
    ///
    /// Creates the file with the header on first write. On error the index
    /// is left untouched so a later delivery retries the write.
    pub fn append(&mut self, record: &TokenRecord) -> PersistenceResult<AppendOutcome> {
        let path = self.path.clone();
        let index = self.index()?;

        if index.addresses.contains(&record.address) {
            debug!(address = %record.address, "Token already in ledger");
            return Ok(AppendOutcome::Duplicate);
        }

        let mut buf = index.tail.repair().to_vec();
        if index.tail != Tail::Clean {
            warn!(path = %path.display(), tail = ?index.tail, "Repairing torn ledger tail");
        }
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut buf);
            if !index.has_header {
                writer.write_record(LEDGER_HEADER)?;
            }
            writer.write_record([
                record.timestamp_string().as_str(),
                record.address.as_str(),
                record.name.as_str(),
                record.symbol.as_str(),
            ])?;
            writer.flush()?;
        }

        // Open in append mode - never truncates existing rows
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(&buf)?;
        file.flush()?;

        if !index.has_header {
            info!(path = %path.display(), "Created token ledger");
        }
        index.addresses.insert(record.address.clone());
        index.has_header = true;
        index.tail = Tail::Clean;

        debug!(address = %record.address, "Token appended to ledger");
        Ok(AppendOutcome::Appended)
    }

    /// Read every data row from a ledger file.
    ///
    /// A missing file reads as empty. Short rows are skipped.
    pub fn read_rows(path: impl AsRef<Path>) -> PersistenceResult<Vec<LedgerRow>> {
        let file = match File::open(path.as_ref()) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            if record.len() < LEDGER_HEADER.len() {
                continue;
            }
            rows.push(LedgerRow {
                timestamp: record[0].to_string(),
                address: record[1].to_string(),
                name: record[2].to_string(),
                symbol: record[3].to_string(),
            });
        }
        Ok(rows)
    }

    fn index(&mut self) -> PersistenceResult<&mut LedgerIndex> {
        let index = match self.index.take() {
            Some(index) => index,
            None => {
                let loaded = load_index(&self.path)?;
                info!(
                    path = %self.path.display(),
                    tokens = loaded.addresses.len(),
                    "Loaded token ledger"
                );
                loaded
            }
        };
        Ok(self.index.insert(index))
    }
}

fn load_index(path: &Path) -> PersistenceResult<LedgerIndex> {
    let mut bytes = Vec::new();
    match File::open(path) {
        Ok(mut file) => {
            file.read_to_end(&mut bytes)?;
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    if bytes.is_empty() {
        return Ok(LedgerIndex {
            addresses: HashSet::new(),
            has_header: false,
            tail: Tail::Clean,
        });
    }

    let tail = Tail::of(&bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == ADDRESS_COLUMN)
        .unwrap_or(ADDRESS_COLUMN_FALLBACK);

    let mut addresses = HashSet::new();
    for result in reader.records() {
        let record = result?;
        if let Some(address) = record.get(column).filter(|a| !a.is_empty()) {
            addresses.insert(address.to_string());
        }
    }

    Ok(LedgerIndex {
        addresses,
        has_header: true,
        tail,
    })
}
