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

// Configuration types for record-lookup

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LookupConfig {
    #[serde(default)]
    pub zenoh: ZenohConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub query: QuerySettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Zenoh configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZenohConfig {
    #[serde(default = "default_mode")]
    pub mode: String, // "peer", "client", or "router"

    #[serde(default)]
    pub connect: Option<EndpointsConfig>,

    #[serde(default)]
    pub listen: Option<EndpointsConfig>,
}

impl Default for ZenohConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            connect: None,
            listen: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointsConfig {
    pub endpoints: Vec<String>,
}

/// Where the dataset artifacts live and how they are named
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// SQLite indexed store, preferred when present
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Single file holding the whole dataset as one batch
    #[serde(default = "default_full_dataset_file")]
    pub full_dataset_file: String,

    /// File name glob for partitioned batches (`*` and `?` wildcards)
    #[serde(default = "default_partition_pattern")]
    pub partition_pattern: String,

    /// Upper bound on concurrent read connections to the indexed store
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            index_file: default_index_file(),
            full_dataset_file: default_full_dataset_file(),
            partition_pattern: default_partition_pattern(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatasetConfig {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_path().join(&self.index_file)
    }

    pub fn full_dataset_path(&self) -> PathBuf {
        self.data_path().join(&self.full_dataset_file)
    }
}

/// Largest page a caller may request, whatever `max_limit` says
pub const PAGE_LIMIT_CAP: u32 = 1000;

/// Query surface settings shared by both backends
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuerySettings {
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// At most [`PAGE_LIMIT_CAP`]
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,

    /// Fields whose search keys must be decimal digits only
    #[serde(default = "default_numeric_fields")]
    pub numeric_fields: Vec<String>,

    /// When non-empty, only these fields may be searched
    #[serde(default)]
    pub searchable_fields: Vec<String>,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            numeric_fields: default_numeric_fields(),
            searchable_fields: Vec::new(),
        }
    }
}

impl QuerySettings {
    /// Upper bound on `limit`, never above [`PAGE_LIMIT_CAP`]
    pub fn effective_max_limit(&self) -> u32 {
        self.max_limit.min(PAGE_LIMIT_CAP)
    }

    pub fn is_numeric_field(&self, field: &str) -> bool {
        self.numeric_fields.iter().any(|f| f == field)
    }

    pub fn is_searchable(&self, field: &str) -> bool {
        self.searchable_fields.is_empty() || self.searchable_fields.iter().any(|f| f == field)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String, // "text", "json"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_mode() -> String { "peer".to_string() }
fn default_data_dir() -> String { "./data".to_string() }
fn default_index_file() -> String { "records.db".to_string() }
fn default_full_dataset_file() -> String { "fake_leak.json".to_string() }
fn default_partition_pattern() -> String { "fake_leak_part_*.json*".to_string() }
fn default_max_connections() -> u32 { 8 }
fn default_key_prefix() -> String { "records".to_string() }
fn default_limit() -> u32 { 10 }
fn default_max_limit() -> u32 { PAGE_LIMIT_CAP }
fn default_numeric_fields() -> Vec<String> { vec!["aadhar_card".to_string()] }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
