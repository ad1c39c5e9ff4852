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

// Batch files: one independently loadable group of records on disk
//
// Supported layouts, detected from the file name:
// - `*.json`  - a single JSON array of objects
// - `*.jsonl` - one JSON object per line
// each optionally compressed as `*.gz` (gzip) or `*.zst` (zstd).

use crate::error::BatchError;
use crate::record::Record;
use flate2::read::GzDecoder;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    JsonArray,
    JsonLines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

/// A batch file with its detected layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    path: PathBuf,
    format: BatchFormat,
    compression: Compression,
}

impl BatchFile {
    /// Detect layout and compression from the file name
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self, BatchError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (stem, compression) = if let Some(stem) = name.strip_suffix(".gz") {
            (stem, Compression::Gzip)
        } else if let Some(stem) = name.strip_suffix(".zst") {
            (stem, Compression::Zstd)
        } else {
            (name.as_str(), Compression::None)
        };

        let format = if stem.ends_with(".jsonl") {
            BatchFormat::JsonLines
        } else if stem.ends_with(".json") {
            BatchFormat::JsonArray
        } else {
            return Err(BatchError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        };

        Ok(Self {
            path: path.to_path_buf(),
            format,
            compression,
        })
    }

    pub fn format(&self) -> BatchFormat {
        self.format
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Read the whole batch into memory.
    ///
    /// Fails if any element is malformed; a batch is never partially loaded.
    pub fn load(&self) -> Result<Vec<Record>, BatchError> {
        debug!(
            "Loading batch {} ({:?}, {:?})",
            self.path.display(),
            self.format,
            self.compression
        );

        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, self.open_reader()?);

        match self.format {
            BatchFormat::JsonArray => self.parse_array(reader),
            BatchFormat::JsonLines => self.parse_lines(reader),
        }
    }

    fn open_reader(&self) -> Result<Box<dyn Read>, BatchError> {
        let file = File::open(&self.path).map_err(|source| self.io_error(source))?;

        Ok(match self.compression {
            Compression::None => Box::new(file),
            Compression::Gzip => Box::new(GzDecoder::new(file)),
            Compression::Zstd => Box::new(
                zstd::stream::read::Decoder::new(file).map_err(|source| self.io_error(source))?,
            ),
        })
    }

    fn parse_array<R: Read>(&self, reader: R) -> Result<Vec<Record>, BatchError> {
        let values: Vec<Value> =
            serde_json::from_reader(reader).map_err(|source| self.json_error(source))?;

        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| self.to_record(index, value))
            .collect()
    }

    fn parse_lines<R: BufRead>(&self, reader: R) -> Result<Vec<Record>, BatchError> {
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(|source| self.io_error(source))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let value: Value =
                serde_json::from_str(trimmed).map_err(|source| self.json_error(source))?;
            records.push(self.to_record(records.len(), value)?);
        }

        Ok(records)
    }

    fn to_record(&self, index: usize, value: Value) -> Result<Record, BatchError> {
        Record::try_from(value).map_err(|_| BatchError::NotAnObject {
            path: self.path.clone(),
            index,
        })
    }

    fn io_error(&self, source: std::io::Error) -> BatchError {
        BatchError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> BatchError {
        BatchError::Json {
            path: self.path.clone(),
            source,
        }
    }
}

/// Detect and load a batch in one step
pub fn load_batch<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, BatchError> {
    BatchFile::detect(path)?.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_detect_formats() {
        let json = BatchFile::detect("data/part_0001.json").unwrap();
        assert_eq!(json.format(), BatchFormat::JsonArray);
        assert_eq!(json.compression(), Compression::None);

        let jsonl_gz = BatchFile::detect("data/part_0001.jsonl.gz").unwrap();
        assert_eq!(jsonl_gz.format(), BatchFormat::JsonLines);
        assert_eq!(jsonl_gz.compression(), Compression::Gzip);

        let json_zst = BatchFile::detect("part.json.zst").unwrap();
        assert_eq!(json_zst.format(), BatchFormat::JsonArray);
        assert_eq!(json_zst.compression(), Compression::Zstd);

        assert!(matches!(
            BatchFile::detect("part.csv"),
            Err(BatchError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_load_json_array_keeps_order() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "batch.json",
            br#"[{"id": 3}, {"id": 1}, {"id": 2}]"#,
        );

        let records = load_batch(&path).unwrap();
        let ids: Vec<_> = records.iter().filter_map(Record::id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_load_json_lines_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "batch.jsonl", b"{\"id\": 1}\n\n{\"id\": 2}\n");

        let records = load_batch(&path).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_load_gzip_lines() {
        let dir = TempDir::new().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"{\"id\": 10}\n{\"id\": 11}\n").unwrap();
        let path = write_file(&dir, "batch.jsonl.gz", &encoder.finish().unwrap());

        let records = load_batch(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id(), Some(11));
    }

    #[test]
    fn test_load_zstd_array() {
        let dir = TempDir::new().unwrap();
        let compressed = zstd::encode_all(&br#"[{"id": 5}]"#[..], 3).unwrap();
        let path = write_file(&dir, "batch.json.zst", &compressed);

        let records = load_batch(&path).unwrap();
        assert_eq!(records[0].id(), Some(5));
    }

    #[test]
    fn test_malformed_batches_fail_whole() {
        let dir = TempDir::new().unwrap();

        let truncated = write_file(&dir, "truncated.json", br#"[{"id": 1}, {"id""#);
        assert!(matches!(load_batch(&truncated), Err(BatchError::Json { .. })));

        let scalar = write_file(&dir, "scalar.json", br#"[{"id": 1}, 42]"#);
        assert!(matches!(
            load_batch(&scalar),
            Err(BatchError::NotAnObject { index: 1, .. })
        ));

        let bad_line = write_file(&dir, "bad.jsonl", b"{\"id\": 1}\nnot json\n");
        assert!(load_batch(&bad_line).is_err());

        let missing = dir.path().join("missing.json");
        assert!(matches!(load_batch(&missing), Err(BatchError::Io { .. })));
    }
}
