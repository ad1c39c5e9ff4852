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

// Backend selection from the storage artifacts found at startup

use super::backend::RecordSource;
use super::batch::load_batch;
use super::indexed::IndexedStoreBackend;
use super::scan::BatchStreamBackend;
use crate::config::DatasetConfig;
use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage artifacts discovered in the data directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageArtifacts {
    pub index: Option<PathBuf>,
    pub full_dataset: Option<PathBuf>,
    /// Sorted lexicographically by file name
    pub partitions: Vec<PathBuf>,
}

impl StorageArtifacts {
    /// Look for artifacts in `config.data_dir`.
    ///
    /// A missing or unreadable directory yields no artifacts rather than an
    /// error; the service then serves an empty dataset.
    pub fn discover(config: &DatasetConfig) -> Result<Self> {
        let data_dir = config.data_path();
        if !data_dir.is_dir() {
            warn!("Data directory {} does not exist", data_dir.display());
            return Ok(Self::default());
        }

        let index = Some(config.index_path()).filter(|p| p.is_file());
        let full_dataset = Some(config.full_dataset_path()).filter(|p| p.is_file());

        let matcher = partition_matcher(&config.partition_pattern)?;
        let mut partitions: Vec<(String, PathBuf)> = match std::fs::read_dir(&data_dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_file())
                .filter_map(|entry| {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let wanted = matcher.is_match(&name) && name != config.full_dataset_file;
                    wanted.then(|| (name, entry.path()))
                })
                .collect(),
            Err(e) => {
                warn!("Cannot list data directory {}: {}", data_dir.display(), e);
                Vec::new()
            }
        };
        partitions.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(Self {
            index,
            full_dataset,
            partitions: partitions.into_iter().map(|(_, path)| path).collect(),
        })
    }
}

/// Compile a file-name glob (`*` and `?` wildcards) into an anchored regex
pub fn partition_matcher(pattern: &str) -> Result<Regex> {
    let mut expr = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');

    Regex::new(&expr).with_context(|| format!("Invalid partition pattern '{}'", pattern))
}

/// The dataset source chosen for the lifetime of the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Indexed(PathBuf),
    SingleFile(PathBuf),
    Partitioned(Vec<PathBuf>),
    Empty,
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Indexed(path) => write!(f, "indexed store {}", path.display()),
            DatasetSource::SingleFile(path) => write!(f, "single dataset file {}", path.display()),
            DatasetSource::Partitioned(paths) => write!(f, "{} partitioned batch files", paths.len()),
            DatasetSource::Empty => write!(f, "empty dataset"),
        }
    }
}

impl DatasetSource {
    /// Open the record source for this dataset
    pub fn open(&self, config: &DatasetConfig) -> Result<Arc<dyn RecordSource>> {
        Ok(match self {
            DatasetSource::Indexed(path) => {
                Arc::new(IndexedStoreBackend::open(path, config.max_connections)?)
            }
            DatasetSource::SingleFile(path) => Arc::new(BatchStreamBackend::new(vec![path.clone()])),
            DatasetSource::Partitioned(paths) => Arc::new(BatchStreamBackend::new(paths.clone())),
            DatasetSource::Empty => Arc::new(BatchStreamBackend::empty()),
        })
    }

    /// Batch-stream view of a non-indexed source, used to build an index
    pub fn batch_stream(&self) -> Option<BatchStreamBackend> {
        match self {
            DatasetSource::Indexed(_) => None,
            DatasetSource::SingleFile(path) => Some(BatchStreamBackend::new(vec![path.clone()])),
            DatasetSource::Partitioned(paths) => Some(BatchStreamBackend::new(paths.clone())),
            DatasetSource::Empty => Some(BatchStreamBackend::empty()),
        }
    }
}

pub struct BackendSelector;

impl BackendSelector {
    /// Choose the dataset source, first match wins:
    /// indexed store, valid single dataset file, partitioned batches, empty.
    pub fn select(artifacts: &StorageArtifacts) -> DatasetSource {
        if let Some(index) = &artifacts.index {
            return DatasetSource::Indexed(index.clone());
        }

        Self::select_batches(artifacts)
    }

    /// Same order as [`BackendSelector::select`] without the indexed store
    pub fn select_batches(artifacts: &StorageArtifacts) -> DatasetSource {
        if let Some(full) = &artifacts.full_dataset {
            match load_batch(full) {
                Ok(_) => return DatasetSource::SingleFile(full.clone()),
                Err(e) => warn!("Ignoring malformed dataset file, falling back to partitions: {}", e),
            }
        }

        if !artifacts.partitions.is_empty() {
            return DatasetSource::Partitioned(artifacts.partitions.clone());
        }

        DatasetSource::Empty
    }

    /// Discover, select and open in one step
    pub fn create(config: &DatasetConfig) -> Result<(DatasetSource, Arc<dyn RecordSource>)> {
        let artifacts = StorageArtifacts::discover(config)?;
        let source = Self::select(&artifacts);

        match &source {
            DatasetSource::Empty => {
                warn!("No storage artifacts in {}; serving an empty dataset", config.data_dir)
            }
            other => info!("Selected dataset source: {}", other),
        }

        let backend = source.open(config)?;
        Ok((source, backend))
    }
}
