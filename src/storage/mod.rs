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

// Storage backend module
//
// Provides a trait-based abstraction over the two dataset sources:
// an indexed store (SQLite) and a stream of record batch files.
// The source is chosen once at startup by `BackendSelector`.
//
// This module is READ-ONLY. The only writer is `build_index`, an offline
// tool used by the `build-index` command.

pub mod backend;
pub mod batch;
pub mod factory;
pub mod indexed;
pub mod scan;

pub use backend::RecordSource;
pub use batch::{load_batch, BatchFile, BatchFormat, Compression};
pub use factory::{partition_matcher, BackendSelector, DatasetSource, StorageArtifacts};
pub use indexed::{build_index, IndexStats, IndexedStoreBackend};
pub use scan::{scan_records, BatchIter, BatchStreamBackend};
