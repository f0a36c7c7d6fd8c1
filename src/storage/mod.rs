// src/storage/mod.rs
//! Per-user append-only tables behind one interface, with a CSV directory
//! backend and a Google Sheets backend.

pub mod csv_store;
pub mod sheets_store;

pub use csv_store::CsvStore;
pub use sheets_store::SheetsStore;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::StorageConfig;
use crate::types::{TableKind, TableRecord};

const CONTACTS_PREFIX: &str = "contacts_";

/// Which table to open: a kind of record plus the owning user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub kind: TableKind,
    pub user_id: String,
}

/// An opened table. `name` is backend-specific (file path or worksheet title).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub name: String,
    pub headers: Vec<String>,
}

impl TableHandle {
    pub fn new(name: String, headers: &[&str]) -> Self {
        Self {
            name,
            headers: headers.iter().map(|h| h.to_string()).collect(),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Create the table with `headers` if missing; idempotent
    async fn ensure_table(&self, table: &TableRef, headers: &[&str]) -> Result<TableHandle>;

    async fn append_row(&self, handle: &TableHandle, row: Vec<String>) -> Result<()>;

    /// All data rows in storage order, header excluded
    async fn read_rows(&self, handle: &TableHandle) -> Result<Vec<Vec<String>>>;
}

impl TableRef {
    pub fn new(kind: TableKind, user_id: &str) -> Result<Self> {
        validate_user_id(user_id)?;
        Ok(Self {
            kind,
            user_id: user_id.to_string(),
        })
    }

    /// Worksheet title: `<user>` for jobs, `contacts_<user>` for contacts
    pub fn worksheet_title(&self) -> String {
        match self.kind {
            TableKind::Jobs => self.user_id.clone(),
            TableKind::Contacts => format!("{}{}", CONTACTS_PREFIX, self.user_id),
        }
    }

    /// File name: `job_tracker_<user>.csv` or `job_contacts_<user>.csv`
    pub fn file_name(&self) -> String {
        let prefix = match self.kind {
            TableKind::Jobs => "job_tracker",
            TableKind::Contacts => "job_contacts",
        };
        format!("{}_{}.csv", prefix, self.user_id)
    }
}

/// User ids name files and worksheets, so they are restricted to a safe
/// alphabet and may not look like a contacts table.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        anyhow::bail!("User id must not be empty");
    }
    if !user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        anyhow::bail!("User id contains unsupported characters: {}", user_id);
    }
    if user_id.starts_with('.') {
        anyhow::bail!("User id must not start with a dot: {}", user_id);
    }
    if user_id.starts_with(CONTACTS_PREFIX) {
        anyhow::bail!("User id must not start with {}: {}", CONTACTS_PREFIX, user_id);
    }
    Ok(())
}

pub async fn ensure_table<R: TableRecord>(
    store: &dyn RecordStore,
    user_id: &str,
) -> Result<TableHandle> {
    let table = TableRef::new(R::KIND, user_id)?;
    store.ensure_table(&table, R::headers()).await
}

pub async fn append<R: TableRecord>(
    store: &dyn RecordStore,
    handle: &TableHandle,
    record: &R,
) -> Result<()> {
    store.append_row(handle, record.to_row()).await
}

/// Read every record, skipping rows that do not parse
pub async fn read_all<R: TableRecord>(
    store: &dyn RecordStore,
    handle: &TableHandle,
) -> Result<Vec<R>> {
    let rows = store.read_rows(handle).await?;
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for (index, row) in rows.iter().enumerate() {
        match R::from_row(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                // +2: one for the header, one for 1-based numbering
                warn!("Skipping malformed row {} in {}: {}", index + 2, handle.name, e);
            }
        }
    }

    if skipped > 0 {
        info!(
            "Read {} rows from {} ({} skipped)",
            records.len(),
            handle.name,
            skipped
        );
    }

    Ok(records)
}

/// Build the backend selected in configuration
pub fn build_store(config: &StorageConfig) -> Result<Arc<dyn RecordStore>> {
    match config {
        StorageConfig::Csv { data_path } => {
            info!("Using CSV storage in {}", data_path.display());
            Ok(Arc::new(CsvStore::new(data_path.clone())))
        }
        StorageConfig::Sheets {
            spreadsheet_id,
            credentials_path,
        } => {
            info!("Using Google Sheets storage, document {}", spreadsheet_id);
            Ok(Arc::new(SheetsStore::from_credentials_file(
                spreadsheet_id.clone(),
                credentials_path,
            )?))
        }
    }
}
