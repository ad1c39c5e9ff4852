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

// Batch-stream backend: sequential scan with bounded accumulation
//
// Batches are re-read from disk on every query and at most one batch is
// resident per running scan. There is no caching and no index, so every
// query costs O(records before the end of its window).

use super::backend::RecordSource;
use super::batch::load_batch;
use crate::query::{Page, Predicate};
use crate::record::Record;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::iter::Flatten;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Collect the matches of `predicate` at positions `[offset, offset + limit)`.
///
/// Records are pulled lazily and the scan stops as soon as the window is
/// full, so nothing after the last returned match is consumed.
pub fn scan_records<I>(records: I, predicate: &Predicate, page: Page) -> Vec<Record>
where
    I: IntoIterator<Item = Record>,
{
    let mut accumulator = Vec::new();
    if page.limit == 0 {
        return accumulator;
    }

    let mut matched_so_far = 0usize;
    for record in records {
        if !predicate.matches(&record) {
            continue;
        }

        if page.contains(matched_so_far) {
            accumulator.push(record);
        }
        matched_so_far += 1;

        if accumulator.len() >= page.limit {
            break;
        }
    }

    accumulator
}

/// Fresh, finite traversal over the batches of one source.
///
/// Loads one batch per `next()`; batches that fail to open or parse are
/// logged and skipped.
pub struct BatchIter {
    paths: Arc<[PathBuf]>,
    position: usize,
}

impl Iterator for BatchIter {
    type Item = Vec<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(path) = self.paths.get(self.position) {
            self.position += 1;

            match load_batch(path) {
                Ok(records) => {
                    debug!("Scanning batch {} ({} records)", path.display(), records.len());
                    return Some(records);
                }
                Err(e) => {
                    warn!("Skipping unreadable batch: {}", e);
                }
            }
        }
        None
    }
}

/// Record source over an ordered sequence of batch files
pub struct BatchStreamBackend {
    paths: Arc<[PathBuf]>,
}

impl BatchStreamBackend {
    /// Batches are scanned in the given order
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: paths.into(),
        }
    }

    /// A source with no batches; every query finds nothing
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn batch_count(&self) -> usize {
        self.paths.len()
    }

    pub fn batches(&self) -> BatchIter {
        BatchIter {
            paths: Arc::clone(&self.paths),
            position: 0,
        }
    }

    /// All records in canonical scan order
    pub fn records(&self) -> Flatten<BatchIter> {
        self.batches().flatten()
    }
}

#[async_trait]
impl RecordSource for BatchStreamBackend {
    async fn find(&self, predicate: &Predicate, page: Page) -> Result<Vec<Record>> {
        let records = self.records();
        let predicate = predicate.clone();

        let results = tokio::task::spawn_blocking(move || scan_records(records, &predicate, page))
            .await
            .context("Scan task failed")?;

        Ok(results)
    }

    async fn health_check(&self) -> Result<bool> {
        let missing: Vec<_> = self.paths.iter().filter(|p| !p.is_file()).collect();
        if missing.is_empty() {
            Ok(true)
        } else {
            warn!("Health check failed - missing batches: {:?}", missing);
            Ok(false)
        }
    }

    fn backend_type(&self) -> &str {
        "batch-stream"
    }
}
