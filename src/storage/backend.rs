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

// Record source trait shared by the indexed and batch-stream backends

use crate::error::LookupResult;
use crate::query::{Page, Predicate};
use crate::record::Record;
use anyhow::Result;
use async_trait::async_trait;

/// Read-only query contract over one dataset source
///
/// Every implementation must return matches in its canonical order and
/// honour the `[offset, offset + limit)` window of `page`, so callers observe
/// the same results whichever backend is active.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Return the matches of `predicate` that fall inside `page`
    async fn find(&self, predicate: &Predicate, page: Page) -> Result<Vec<Record>>;

    /// First record whose `id` equals `id`
    async fn get_by_id(&self, id: i64) -> LookupResult<Option<Record>> {
        let records = self.find(&Predicate::id_equals(id), Page::first()).await?;
        Ok(records.into_iter().next())
    }

    /// Records whose `field` contains `term`, case-sensitively
    ///
    /// # Arguments
    /// * `field` - Field name, coerced to text for matching
    /// * `term` - Substring to look for
    /// * `page` - Already validated pagination window
    async fn search_by_field_partial(
        &self,
        field: &str,
        term: &str,
        page: Page,
    ) -> LookupResult<Vec<Record>> {
        let predicate = Predicate::field_contains(field, term)?;
        Ok(self.find(&predicate, page).await?)
    }

    /// First record whose `field` equals `value`, ignoring ASCII case
    async fn get_by_field_exact(&self, field: &str, value: &str) -> LookupResult<Option<Record>> {
        let predicate = Predicate::field_equals_ignore_case(field, value)?;
        let records = self.find(&predicate, Page::first()).await?;
        Ok(records.into_iter().next())
    }

    /// Health check
    async fn health_check(&self) -> Result<bool>;

    /// Get backend type identifier
    fn backend_type(&self) -> &str;
}
