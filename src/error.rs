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

use std::path::PathBuf;
use thiserror::Error;

/// Outcome taxonomy for a lookup as seen by callers
#[derive(Debug, Error)]
pub enum LookupError {
    /// Malformed pagination parameters, field names or keys.
    /// Raised before any backend access.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The predicate matched zero records
    #[error("no records found")]
    NotFound,

    /// The indexed store failed to answer
    #[error("backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

impl LookupError {
    pub fn invalid(message: impl Into<String>) -> Self {
        LookupError::InvalidInput(message.into())
    }
}

pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Failure to load a single batch file.
///
/// The scan never surfaces these; they are logged and the batch is skipped.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read batch {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse batch {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("batch {path} element {index} is not a JSON object")]
    NotAnObject { path: PathBuf, index: usize },

    #[error("batch {path} has unsupported format")]
    UnsupportedFormat { path: PathBuf },
}
