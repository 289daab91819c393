//! Audit storage backends
//!
//! The file sink chains every line to its predecessor with SHA-256 so edits,
//! removals and reordering are detected on read.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::audit::record::{AuditQuery, AuditRecord};
use crate::error::Error;
use crate::types::Result;

/// Append-only audit storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record
    async fn append(&self, record: &AuditRecord) -> Result<()>;

    /// Records matching `query`, in append order
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>>;
}

/// Audit sink kept in process memory
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no record has been written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>> {
        Ok(query.apply(self.records()))
    }
}

/// Hash seeding the chain of an empty log
const GENESIS_HASH: &str = "0";

/// One line of the JSONL log: the record plus its link in the hash chain
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChainedEntry {
    payload: Value,
    prev_hash: String,
    hash: String,
}

/// SHA-256 over the previous hash followed by the serialized payload
fn chain_hash(prev_hash: &str, payload: &Value) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(serde_json::to_vec(payload)?);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Parse every line and check each link; returns the payloads and the last hash
fn verify_chain(content: &str) -> Result<(Vec<Value>, String)> {
    let mut last_hash = GENESIS_HASH.to_string();
    let mut payloads = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let entry: ChainedEntry = serde_json::from_str(line)
            .map_err(|e| Error::AuditIntegrity(format!("line {} is not a chain entry: {}", line_no, e)))?;

        if entry.prev_hash != last_hash {
            return Err(Error::AuditIntegrity(format!("line {} does not follow its predecessor", line_no)));
        }
        if chain_hash(&entry.prev_hash, &entry.payload)? != entry.hash {
            return Err(Error::AuditIntegrity(format!("line {} hash mismatch", line_no)));
        }

        last_hash = entry.hash;
        payloads.push(entry.payload);
    }

    Ok((payloads, last_hash))
}

/// Tamper-evident audit sink appending one hash-chained JSON document per line
pub struct JsonlAuditSink {
    path: PathBuf,
    /// Hash of the last appended entry; the lock also serializes appends
    last_hash: tokio::sync::Mutex<String>,
}

impl JsonlAuditSink {
    /// Open or create the log at `path` and resume its hash chain
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let last_hash = match tokio::fs::read_to_string(&path).await {
            Ok(content) => verify_chain(&content)?.1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => GENESIS_HASH.to_string(),
            Err(e) => return Err(Error::Io(e)),
        };

        Ok(Self {
            path,
            last_hash: tokio::sync::Mutex::new(last_hash),
        })
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the whole chain, returning the number of entries
    pub async fn verify(&self) -> Result<usize> {
        Ok(self.read_verified().await?.len())
    }

    async fn read_verified(&self) -> Result<Vec<Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };
        Ok(verify_chain(&content)?.0)
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        let payload = serde_json::to_value(record)?;

        let mut last_hash = self.last_hash.lock().await;
        let hash = chain_hash(&last_hash, &payload)?;
        let entry = ChainedEntry {
            payload,
            prev_hash: last_hash.clone(),
            hash: hash.clone(),
        };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        *last_hash = hash;
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>> {
        let records = self
            .read_verified()
            .await?
            .into_iter()
            .map(serde_json::from_value::<AuditRecord>)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(query.apply(records))
    }
}
