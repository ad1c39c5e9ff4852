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

/// Pagination and ordering of the batch-stream backend
mod common;

use common::{ids, write_partitions};
use record_lookup::storage::{BatchStreamBackend, RecordSource};
use record_lookup::{Page, Predicate};
use tempfile::TempDir;

fn partitioned_backend(dir: &TempDir) -> BatchStreamBackend {
    BatchStreamBackend::new(write_partitions(dir.path()))
}

#[tokio::test]
async fn test_partial_search_finds_rare_digit() {
    let dir = TempDir::new().unwrap();
    let backend = partitioned_backend(&dir);

    let records = backend
        .search_by_field_partial("aadhar_card", "5", Page::new(10, 0))
        .await
        .unwrap();

    assert_eq!(ids(&records), vec![5, 15, 25]);
}

#[tokio::test]
async fn test_offset_selects_second_match() {
    let dir = TempDir::new().unwrap();
    let backend = partitioned_backend(&dir);

    let records = backend
        .search_by_field_partial("aadhar_card", "5", Page::new(1, 1))
        .await
        .unwrap();

    assert_eq!(ids(&records), vec![15]);
}

#[tokio::test]
async fn test_every_window_is_a_slice_of_all_matches() {
    let dir = TempDir::new().unwrap();
    let backend = partitioned_backend(&dir);
    let predicate = Predicate::field_contains("city", "Delhi").unwrap();

    let all = backend.find(&predicate, Page::new(1000, 0)).await.unwrap();
    let all_ids = ids(&all);
    assert_eq!(all_ids.len(), 17);

    for limit in [1usize, 2, 5, 16, 17, 40] {
        for offset in [0usize, 1, 3, 16, 17, 30] {
            let page = backend.find(&predicate, Page::new(limit, offset)).await.unwrap();

            let start = offset.min(all_ids.len());
            let end = (offset + limit).min(all_ids.len());
            assert_eq!(
                ids(&page),
                all_ids[start..end].to_vec(),
                "limit={} offset={}",
                limit,
                offset
            );
            assert!(page.len() <= limit);
        }
    }
}

#[tokio::test]
async fn test_canonical_order_follows_partition_order() {
    let dir = TempDir::new().unwrap();
    let mut paths = write_partitions(dir.path());
    paths.reverse();
    let backend = BatchStreamBackend::new(paths);

    let records = backend
        .search_by_field_partial("aadhar_card", "5", Page::new(10, 0))
        .await
        .unwrap();

    // Batch order, then in-batch order; no sort by id
    assert_eq!(ids(&records), vec![25, 15, 5]);
}

#[tokio::test]
async fn test_repeated_queries_are_identical() {
    let dir = TempDir::new().unwrap();
    let backend = partitioned_backend(&dir);

    let first = backend
        .search_by_field_partial("email", "example", Page::new(7, 4))
        .await
        .unwrap();
    let second = backend
        .search_by_field_partial("email", "example", Page::new(7, 4))
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_get_by_id_and_exact_match() {
    let dir = TempDir::new().unwrap();
    let backend = partitioned_backend(&dir);

    let record = backend.get_by_id(12).await.unwrap().unwrap();
    assert_eq!(record.field_text("name").as_deref(), Some("Person 12"));
    assert!(backend.get_by_id(26).await.unwrap().is_none());

    // Stored as "User14@Example.COM"
    let record = backend
        .get_by_field_exact("email", "user14@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.id(), Some(14));

    assert!(backend
        .get_by_field_exact("email", "user14@example")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_partial_match_is_case_sensitive() {
    let dir = TempDir::new().unwrap();
    let backend = partitioned_backend(&dir);

    let upper = backend
        .search_by_field_partial("email", "Example.COM", Page::new(100, 0))
        .await
        .unwrap();
    assert_eq!(ids(&upper), vec![7, 14, 21]);
}

#[tokio::test]
async fn test_numeric_fields_match_as_text() {
    let dir = TempDir::new().unwrap();
    let backend = partitioned_backend(&dir);

    // ages 21..=45; "4" appears in 24, 34 and 40..=45
    let records = backend
        .search_by_field_partial("age", "4", Page::new(100, 0))
        .await
        .unwrap();
    assert_eq!(ids(&records), vec![4, 14, 20, 21, 22, 23, 24, 25]);
}
