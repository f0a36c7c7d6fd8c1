// src/storage/csv_store.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::io::SeekFrom;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{info, warn};

use super::{RecordStore, TableHandle, TableRef};

/// One CSV file per user and table kind inside `data_dir`
pub struct CsvStore {
    data_dir: PathBuf,
}

impl CsvStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn table_path(&self, table: &TableRef) -> PathBuf {
        self.data_dir.join(table.file_name())
    }
}

/// Encode rows as CSV text, one record per line
pub(crate) fn encode_rows<I, R>(rows: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        writer
            .write_record(row)
            .context("Failed to encode CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))
}

async fn needs_line_break(file: &mut fs::File) -> Result<bool> {
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(false);
    }

    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}

#[async_trait]
impl RecordStore for CsvStore {
    fn backend_name(&self) -> &'static str {
        "csv"
    }

    async fn ensure_table(&self, table: &TableRef, headers: &[&str]) -> Result<TableHandle> {
        fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", self.data_dir.display()))?;

        let path = self.table_path(table);
        let is_empty = match fs::metadata(&path).await {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        if is_empty {
            let header = encode_rows([headers])?;
            fs::write(&path, header)
                .await
                .with_context(|| format!("Failed to create table: {}", path.display()))?;
            info!("Created table {}", path.display());
        }

        Ok(TableHandle::new(path.to_string_lossy().into_owned(), headers))
    }

    async fn append_row(&self, handle: &TableHandle, row: Vec<String>) -> Result<()> {
        let encoded = encode_rows([row])?;

        let mut file = fs::OpenOptions::new()
            .read(true)
            .append(true)
            .open(&handle.name)
            .await
            .with_context(|| format!("Failed to open table: {}", handle.name))?;

        // A file saved by another editor may lack the final line break
        if needs_line_break(&mut file).await? {
            warn!("Table {} did not end with a newline", handle.name);
            file.write_all(b"\n").await?;
        }

        file.write_all(&encoded)
            .await
            .with_context(|| format!("Failed to append to table: {}", handle.name))?;
        file.flush().await?;

        Ok(())
    }

    async fn read_rows(&self, handle: &TableHandle) -> Result<Vec<Vec<String>>> {
        let content = match fs::read(&handle.name).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read table: {}", handle.name))
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_slice());

        let mut rows = Vec::new();
        for result in reader.records() {
            match result {
                Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
                Err(e) => {
                    warn!("Skipping unreadable row in {}: {}", handle.name, e);
                }
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{append, ensure_table, read_all};
    use crate::types::records::parse_timestamp;
    use crate::types::{ContactRecord, JobRecord, TableKind, TableRecord, JOB_HEADERS};

    fn job(n: usize) -> JobRecord {
        JobRecord {
            timestamp: parse_timestamp(&format!("2024-05-{:02} 09:00:00", n + 1)).unwrap(),
            job_link: format!("https://jobs.example.com/{}", n),
            company: format!("Company {}", n),
            job_description: format!("Line one, with comma\n\"quoted\" line {}", n),
            top_skills: "Rust, SQL".to_string(),
            skills_summary: "Summary".to_string(),
        }
    }

    #[tokio::test]
    async fn test_append_then_read_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("data"));

        let handle = ensure_table::<JobRecord>(&store, "missy").await.unwrap();
        let jobs: Vec<JobRecord> = (0..5).map(job).collect();
        for record in &jobs {
            append(&store, &handle, record).await.unwrap();
        }

        let read = read_all::<JobRecord>(&store, &handle).await.unwrap();
        assert_eq!(read, jobs);
    }

    #[tokio::test]
    async fn test_ensure_table_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().to_path_buf());

        let first = ensure_table::<JobRecord>(&store, "missy").await.unwrap();
        append(&store, &first, &job(1)).await.unwrap();
        let second = ensure_table::<JobRecord>(&store, "missy").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(read_all::<JobRecord>(&store, &second).await.unwrap().len(), 1);

        let content = std::fs::read_to_string(&first.name).unwrap();
        assert!(content.starts_with(&JOB_HEADERS.join(",")));
        assert_eq!(content.matches("Timestamp").count(), 1);
    }

    #[tokio::test]
    async fn test_empty_table_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().to_path_buf());

        let handle = ensure_table::<ContactRecord>(&store, "missy").await.unwrap();
        assert!(handle.name.ends_with("job_contacts_missy.csv"));
        assert!(read_all::<ContactRecord>(&store, &handle).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().to_path_buf());
        let handle = ensure_table::<JobRecord>(&store, "missy").await.unwrap();

        append(&store, &handle, &job(0)).await.unwrap();
        store
            .append_row(&handle, vec!["2024-05-02 09:00:00".into(), "only two".into()])
            .await
            .unwrap();
        store
            .append_row(
                &handle,
                vec![
                    "not a date".into(),
                    "a".into(),
                    "b".into(),
                    "c".into(),
                    "d".into(),
                    "e".into(),
                ],
            )
            .await
            .unwrap();
        append(&store, &handle, &job(3)).await.unwrap();

        let read = read_all::<JobRecord>(&store, &handle).await.unwrap();
        assert_eq!(read, vec![job(0), job(3)]);
    }

    #[tokio::test]
    async fn test_jobs_and_contacts_use_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().to_path_buf());

        let jobs = ensure_table::<JobRecord>(&store, "missy").await.unwrap();
        let contacts = ensure_table::<ContactRecord>(&store, "missy").await.unwrap();
        assert_ne!(jobs.name, contacts.name);

        let jobs_ref = TableRef::new(TableKind::Jobs, "missy").unwrap();
        assert_eq!(store.table_path(&jobs_ref).to_string_lossy(), jobs.name);
    }

    #[tokio::test]
    async fn test_append_after_unterminated_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().to_path_buf());
        let handle = ensure_table::<JobRecord>(&store, "missy").await.unwrap();

        let first = job(0);
        let line = String::from_utf8(encode_rows([first.to_row()]).unwrap()).unwrap();
        let mut content = std::fs::read_to_string(&handle.name).unwrap();
        content.push_str(line.trim_end_matches('\n'));
        std::fs::write(&handle.name, content).unwrap();

        append(&store, &handle, &job(1)).await.unwrap();
        append(&store, &handle, &job(2)).await.unwrap();

        let read = read_all::<JobRecord>(&store, &handle).await.unwrap();
        assert_eq!(read, vec![first, job(1), job(2)]);
    }

    #[tokio::test]
    async fn test_append_without_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().to_path_buf());
        let handle = TableHandle::new(
            dir.path().join("missing.csv").to_string_lossy().into_owned(),
            &JOB_HEADERS,
        );
        assert!(store.append_row(&handle, vec!["x".into()]).await.is_err());
        assert!(store.read_rows(&handle).await.unwrap().is_empty());
    }
}
