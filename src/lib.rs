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

// Read-only record lookup service
//
// Answers lookup-by-id, partial-match and exact-match queries over a fixed
// dataset of records that is either:
// - an indexed SQLite store (preferred), or
// - a sequence of JSON record batches scanned one batch at a time
//
// Both backends share one query contract with identical ordering and
// pagination, and are served over Zenoh queryables.

pub mod config;
pub mod error;
pub mod interface;
pub mod protocol;
pub mod query;
pub mod record;
pub mod service;
pub mod storage;

// Re-export main types
pub use config::{load_config, load_config_with_env, LookupConfig};
pub use error::{BatchError, LookupError, LookupResult};
pub use interface::QueryInterface;
pub use protocol::{LookupRequest, LookupResponse, LookupStatus, ServiceInfo};
pub use query::{IntegerParam, Page, Predicate};
pub use record::Record;
pub use service::LookupService;
pub use storage::{
    BackendSelector, BatchStreamBackend, DatasetSource, IndexedStoreBackend, RecordSource,
};
