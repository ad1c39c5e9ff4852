// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Indexed-store backend (SQLite)
//
// Schema:
//
//   CREATE TABLE records (
//       id   INTEGER PRIMARY KEY,
//       data TEXT NOT NULL          -- the record as a JSON object
//   );
//
// Every query is one bounded statement ordered by `id` with native
// LIMIT/OFFSET. Field values are addressed with `json_extract` on a bound
// JSON path and only text and numeric values take part in matching, the
// same coercion the scan applies.

use super::backend::RecordSource;
use super::scan::BatchStreamBackend;
use crate::query::{Page, Predicate};
use crate::record::Record;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CREATE_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS records (id INTEGER PRIMARY KEY, data TEXT NOT NULL)";

const INSERT_RECORD: &str = "INSERT OR IGNORE INTO records (id, data) VALUES (?1, ?2)";

const SELECT_BY_ID: &str = "SELECT data FROM records WHERE id = ?1 ORDER BY id ASC LIMIT ?2 OFFSET ?3";

const SELECT_CONTAINS: &str = r#"
    SELECT data FROM records
    WHERE json_type(data, ?1) IN ('text', 'integer', 'real')
      AND instr(CAST(json_extract(data, ?1) AS TEXT), ?2) > 0
    ORDER BY id ASC
    LIMIT ?3 OFFSET ?4
"#;

const SELECT_EQUALS_IGNORE_CASE: &str = r#"
    SELECT data FROM records
    WHERE json_type(data, ?1) IN ('text', 'integer', 'real')
      AND lower(CAST(json_extract(data, ?1) AS TEXT)) = ?2
    ORDER BY id ASC
    LIMIT ?3 OFFSET ?4
"#;

/// Read-only record source backed by an SQLite file
#[derive(Clone, Debug)]
pub struct IndexedStoreBackend {
    pool: SqlitePool,
    path: PathBuf,
}

impl IndexedStoreBackend {
    /// Open the store read-only.
    ///
    /// Connections are established lazily, one per concurrent query, up to
    /// `max_connections`.
    pub fn open<P: AsRef<Path>>(path: P, max_connections: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() {
            bail!("Indexed store not found: {}", path.display());
        }

        let options = SqliteConnectOptions::new().filename(&path).read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy_with(options);

        info!(
            "Opened indexed store at {} (max {} connections)",
            path.display(),
            max_connections
        );

        Ok(Self { pool, path })
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Quoted JSON path for a field, e.g. `$."email"`
fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field)
}

fn decode_row(row: &SqliteRow) -> Result<Record> {
    let data: String = row.try_get("data").context("Missing data column")?;
    let value: Value = serde_json::from_str(&data).context("Stored record is not valid JSON")?;
    Record::try_from(value).map_err(|_| anyhow!("Stored record is not a JSON object"))
}

#[async_trait]
impl RecordSource for IndexedStoreBackend {
    async fn find(&self, predicate: &Predicate, page: Page) -> Result<Vec<Record>> {
        let limit = i64::try_from(page.limit).context("limit out of range")?;
        let offset = i64::try_from(page.offset).context("offset out of range")?;

        // Returned to the pool when dropped, on every exit path
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire indexed store connection")?;

        debug!("Indexed query: {} (limit {}, offset {})", predicate, limit, offset);

        let rows = match predicate {
            Predicate::IdEquals(id) => {
                sqlx::query(SELECT_BY_ID)
                    .bind(*id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&mut *conn)
                    .await
            }
            Predicate::FieldContains { field, term } => {
                sqlx::query(SELECT_CONTAINS)
                    .bind(json_path(field))
                    .bind(term.clone())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&mut *conn)
                    .await
            }
            Predicate::FieldEqualsIgnoreCase { field, value } => {
                sqlx::query(SELECT_EQUALS_IGNORE_CASE)
                    .bind(json_path(field))
                    .bind(value.clone())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&mut *conn)
                    .await
            }
        }
        .with_context(|| format!("Indexed query failed: {}", predicate))?;

        rows.iter().map(decode_row).collect()
    }

    async fn health_check(&self) -> Result<bool> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Health check failed for {}: {}", self.path.display(), e);
                Ok(false)
            }
        }
    }

    fn backend_type(&self) -> &str {
        "indexed"
    }
}

/// Counters reported by [`build_index`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub inserted: u64,
    pub duplicates: u64,
    pub skipped: u64,
    /// Inserted records with numbers SQLite cannot render as the scan does
    pub inexact: u64,
}

/// Build an indexed store at `output` from the batches of `source`.
///
/// The first occurrence of a duplicate `id` wins, as it would in a scan.
/// Records without an integer `id` cannot be keyed and are skipped.
/// Records whose numbers SQLite would store inexactly (integers beyond
/// `i64`, reals with more than 15 significant digits) are kept but counted
/// and logged: text matching on those fields may differ from a scan.
pub async fn build_index<P: AsRef<Path>>(output: P, source: &BatchStreamBackend) -> Result<IndexStats> {
    let output = output.as_ref();
    if output.exists() {
        bail!("Refusing to overwrite existing file: {}", output.display());
    }

    let options = SqliteConnectOptions::new()
        .filename(output)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to create indexed store {}", output.display()))?;

    sqlx::query(CREATE_TABLE)
        .execute(&pool)
        .await
        .context("Failed to create records table")?;

    let mut stats = IndexStats::default();

    let mut batches = source.batches();
    loop {
        let (batch, rest) = tokio::task::spawn_blocking(move || {
            let batch = batches.next();
            (batch, batches)
        })
        .await
        .context("Batch loading task failed")?;
        batches = rest;

        let Some(batch) = batch else {
            break;
        };

        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        for record in batch {
            let Some(id) = record.id() else {
                warn!("Skipping record without integer id");
                stats.skipped += 1;
                continue;
            };

            let data = serde_json::to_string(&record).context("Failed to serialize record")?;
            let result = sqlx::query(INSERT_RECORD)
                .bind(id)
                .bind(data)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert record {}", id))?;

            if result.rows_affected() == 0 {
                stats.duplicates += 1;
            } else {
                stats.inserted += 1;
                if !record.has_exact_numeric_text() {
                    warn!("Record {} has numbers the index cannot match exactly as text", id);
                    stats.inexact += 1;
                }
            }
        }

        tx.commit().await.context("Failed to commit batch")?;
    }

    pool.close().await;

    info!(
        "Built indexed store {}: {} inserted, {} duplicate ids, {} skipped, {} inexact",
        output.display(),
        stats.inserted,
        stats.duplicates,
        stats.skipped,
        stats.inexact
    );

    Ok(stats)
}
