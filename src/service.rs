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

// Lookup service: input validation in front of the selected record source

use crate::config::QuerySettings;
use crate::error::{LookupError, LookupResult};
use crate::protocol::{LookupRequest, LookupResponse, ServiceInfo};
use crate::query::{check_digits, check_field_name, IntegerParam, Page};
use crate::record::Record;
use crate::storage::{DatasetSource, RecordSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Field searched by the Aadhaar route
pub const AADHAR_FIELD: &str = "aadhar_card";

/// Answers lookups against one dataset source.
///
/// All caller input is validated before the source is touched.
pub struct LookupService {
    source: Arc<dyn RecordSource>,
    dataset: DatasetSource,
    settings: QuerySettings,
    started_at: DateTime<Utc>,
}

impl LookupService {
    pub fn new(source: Arc<dyn RecordSource>, dataset: DatasetSource, settings: QuerySettings) -> Self {
        Self {
            source,
            dataset,
            settings,
            started_at: Utc::now(),
        }
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    pub fn dataset(&self) -> &DatasetSource {
        &self.dataset
    }

    pub fn backend_type(&self) -> &str {
        self.source.backend_type()
    }

    pub async fn get_by_id(&self, id: &IntegerParam) -> LookupResult<Record> {
        let id = id
            .to_integer()
            .ok_or_else(|| LookupError::invalid(format!("id must be an integer, got '{}'", id)))?;

        self.source.get_by_id(id).await?.ok_or(LookupError::NotFound)
    }

    pub async fn search_by_field_partial(
        &self,
        field: &str,
        term: &str,
        limit: Option<&IntegerParam>,
        offset: Option<&IntegerParam>,
    ) -> LookupResult<Vec<Record>> {
        self.check_search_key(field, term)?;
        let page = Page::from_params(limit, offset, &self.settings)?;

        let records = self.source.search_by_field_partial(field, term, page).await?;
        if records.is_empty() {
            return Err(LookupError::NotFound);
        }
        Ok(records)
    }

    pub async fn get_by_field_exact(&self, field: &str, value: &str) -> LookupResult<Record> {
        self.check_search_key(field, value)?;

        self.source
            .get_by_field_exact(field, value)
            .await?
            .ok_or(LookupError::NotFound)
    }

    /// Partial match on the Aadhaar-like number
    pub async fn search_by_aadhar(
        &self,
        digits: &str,
        limit: Option<&IntegerParam>,
        offset: Option<&IntegerParam>,
    ) -> LookupResult<Vec<Record>> {
        check_digits(digits)?;
        self.search_by_field_partial(AADHAR_FIELD, digits, limit, offset)
            .await
    }

    fn check_search_key(&self, field: &str, key: &str) -> LookupResult<()> {
        check_field_name(field)?;

        if !self.settings.is_searchable(field) {
            return Err(LookupError::invalid(format!("field '{}' is not searchable", field)));
        }

        if self.settings.is_numeric_field(field) {
            check_digits(key)?;
        }

        Ok(())
    }

    /// Run a request and turn the outcome into a response
    pub async fn handle(&self, request: LookupRequest) -> LookupResponse {
        let query_id = Uuid::new_v4().to_string();
        let span = info_span!("lookup", query_id = %query_id, backend = self.backend_type());

        async {
            info!(op = request.op(), field = request.field(), "Processing request");
            debug!("Request: {:?}", request);

            let outcome = match &request {
                LookupRequest::GetById { id } => self.get_by_id(id).await.map(|r| vec![r]),
                LookupRequest::Search {
                    field,
                    term,
                    limit,
                    offset,
                } => {
                    self.search_by_field_partial(field, term, limit.as_ref(), offset.as_ref())
                        .await
                }
                LookupRequest::GetExact { field, value } => {
                    self.get_by_field_exact(field, value).await.map(|r| vec![r])
                }
            };

            self.respond(outcome)
        }
        .instrument(span)
        .await
        .with_query_id(query_id)
    }

    /// Log the outcome and build the response for it
    pub fn respond(&self, outcome: LookupResult<Vec<Record>>) -> LookupResponse {
        match outcome {
            Ok(records) => {
                info!("Returning {} record(s)", records.len());
                LookupResponse::found(records)
            }
            Err(LookupError::Backend(e)) => {
                tracing::error!("Lookup failed: {:#}", e);
                LookupResponse::from(&LookupError::Backend(e))
            }
            Err(LookupError::NotFound) => {
                info!("No records found");
                LookupResponse::from(&LookupError::NotFound)
            }
            Err(e) => {
                warn!("Lookup rejected: {}", e);
                LookupResponse::from(&e)
            }
        }
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            backend: self.backend_type().to_string(),
            dataset: self.dataset.to_string(),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}
