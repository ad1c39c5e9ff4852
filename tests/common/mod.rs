// Shared fixtures for integration tests
#![allow(dead_code)]

use record_lookup::config::{DatasetConfig, QuerySettings};
use record_lookup::storage::{build_index, BackendSelector, BatchStreamBackend};
use record_lookup::LookupService;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Records 1..=25; only ids 5, 15 and 25 carry the digit 5 in `aadhar_card`
pub fn sample_records() -> Vec<Value> {
    (1..=25)
        .map(|id: i64| {
            let email = if id % 7 == 0 {
                format!("User{}@Example.COM", id)
            } else {
                format!("user{}@example.com", id)
            };
            json!({
                "id": id,
                "name": format!("Person {}", id),
                "aadhar_card": format!("1000000000{:02}", id),
                "email": email,
                "age": 20 + id,
                "city": if id % 3 == 0 { "Pune" } else { "Delhi" }
            })
        })
        .collect()
}

pub fn write_json(path: &Path, records: &[Value]) {
    std::fs::write(path, serde_json::to_vec(records).unwrap()).unwrap();
}

/// Write the sample records as three partition files (ids 1-10, 11-20, 21-25)
pub fn write_partitions(dir: &Path) -> Vec<PathBuf> {
    let records = sample_records();
    let chunks = [&records[0..10], &records[10..20], &records[20..25]];

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let path = dir.join(format!("fake_leak_part_{:02}.json", i + 1));
            write_json(&path, chunk);
            path
        })
        .collect()
}

pub fn dataset_config(dir: &Path) -> DatasetConfig {
    DatasetConfig {
        data_dir: dir.to_string_lossy().to_string(),
        ..DatasetConfig::default()
    }
}

/// Lookup service over whatever the selector picks in `dir`
pub fn service_for(dir: &Path) -> LookupService {
    let (dataset, source) = BackendSelector::create(&dataset_config(dir)).unwrap();
    LookupService::new(source, dataset, QuerySettings::default())
}

/// Two data directories holding the same dataset: one as partitions only,
/// one as an indexed store only.
pub async fn twin_datasets() -> (TempDir, TempDir) {
    let batch_dir = TempDir::new().unwrap();
    let partitions = write_partitions(batch_dir.path());

    let index_dir = TempDir::new().unwrap();
    let index_path = index_dir.path().join("records.db");
    build_index(&index_path, &BatchStreamBackend::new(partitions))
        .await
        .unwrap();

    (batch_dir, index_dir)
}

pub fn ids(records: &[record_lookup::Record]) -> Vec<i64> {
    records.iter().filter_map(|r| r.id()).collect()
}

pub fn shared(service: LookupService) -> Arc<LookupService> {
    Arc::new(service)
}
