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

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};
use zenoh::query::Query;
use zenoh::Session;

use crate::protocol::{LookupRequest, LookupResponse};
use crate::query::IntegerParam;
use crate::service::LookupService;

/// Key expression routes served under the configured prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    Info,
    Query,
    Aadhar(&'a str),
    Unknown,
}

/// Resolve a concrete key expression to a route
pub fn route<'a>(key: &'a str, prefix: &str) -> Route<'a> {
    let Some(rest) = key
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Route::Unknown;
    };

    match rest.split_once('/') {
        None if rest == "info" => Route::Info,
        None if rest == "query" => Route::Query,
        Some(("aadhar", digits)) if !digits.is_empty() && !digits.contains('/') => {
            Route::Aadhar(digits)
        }
        _ => Route::Unknown,
    }
}

/// Query interface for serving lookups via Zenoh queryables
pub struct QueryInterface {
    session: Session,
    service: Arc<LookupService>,
    key_prefix: String,
}

impl QueryInterface {
    pub fn new(session: Session, service: Arc<LookupService>) -> Self {
        let key_prefix = service.settings().key_prefix.clone();
        Self {
            session,
            service,
            key_prefix,
        }
    }

    /// Run the query interface (blocks until stopped)
    pub async fn run(&self) -> Result<()> {
        let info_key = format!("{}/info", self.key_prefix);
        let info_queryable = self
            .session
            .declare_queryable(info_key.clone())
            .await
            .map_err(|e| anyhow!("{}", e))?;
        info!("Info interface listening on '{}'", info_key);

        let query_key = format!("{}/query", self.key_prefix);
        let query_queryable = self
            .session
            .declare_queryable(query_key.clone())
            .await
            .map_err(|e| anyhow!("{}", e))?;
        info!("Lookup interface listening on '{}'", query_key);

        let aadhar_key = format!("{}/aadhar/*", self.key_prefix);
        let aadhar_queryable = self
            .session
            .declare_queryable(aadhar_key.clone())
            .await
            .map_err(|e| anyhow!("{}", e))?;
        info!("Aadhaar interface listening on '{}'", aadhar_key);

        // Each query is handled on its own task
        loop {
            tokio::select! {
                Ok(query) = info_queryable.recv_async() => {
                    let service = self.service.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_info_query(query, service).await {
                            error!("Error handling info query: {}", e);
                        }
                    });
                }
                Ok(query) = query_queryable.recv_async() => {
                    let service = self.service.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_lookup_query(query, service).await {
                            error!("Error handling lookup query: {}", e);
                        }
                    });
                }
                Ok(query) = aadhar_queryable.recv_async() => {
                    let service = self.service.clone();
                    let prefix = self.key_prefix.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_aadhar_query(query, service, prefix).await {
                            error!("Error handling aadhar query: {}", e);
                        }
                    });
                }
                else => {
                    info!("All queryables closed");
                    return Ok(());
                }
            }
        }
    }

    async fn handle_info_query(query: Query, service: Arc<LookupService>) -> Result<()> {
        info!("Received info query on '{}'", query.selector());
        Self::reply_json(&query, &service.info()).await
    }

    async fn handle_lookup_query(query: Query, service: Arc<LookupService>) -> Result<()> {
        info!("Received lookup query on '{}'", query.selector());

        let request: LookupRequest = match query.payload() {
            Some(payload) => match serde_json::from_slice(&payload.to_bytes()) {
                Ok(request) => request,
                Err(e) => {
                    let response = LookupResponse::invalid(format!("Malformed request: {}", e));
                    return Self::reply_json(&query, &response).await;
                }
            },
            None => {
                let response = LookupResponse::invalid("Missing request payload".to_string());
                return Self::reply_json(&query, &response).await;
            }
        };

        let response = service.handle(request).await;
        Self::reply_json(&query, &response).await
    }

    async fn handle_aadhar_query(
        query: Query,
        service: Arc<LookupService>,
        prefix: String,
    ) -> Result<()> {
        info!("Received aadhar query");
        debug!("Aadhaar selector: '{}'", query.selector());

        // Pattern: {prefix}/aadhar/{digits}
        let key = query.key_expr().as_str().to_string();
        let Route::Aadhar(digits) = route(&key, &prefix) else {
            let response = LookupResponse::invalid("Invalid aadhar query format".to_string());
            return Self::reply_json(&query, &response).await;
        };

        let parameters = query.parameters();
        let limit = parameters.get("limit").map(IntegerParam::from);
        let offset = parameters.get("offset").map(IntegerParam::from);

        let outcome = service
            .search_by_aadhar(digits, limit.as_ref(), offset.as_ref())
            .await;
        let response = service.respond(outcome);
        Self::reply_json(&query, &response).await
    }

    async fn reply_json<T: Serialize>(query: &Query, body: &T) -> Result<()> {
        let bytes = serde_json::to_vec(body)?;
        query
            .reply(query.key_expr().clone(), bytes)
            .await
            .map_err(|e| anyhow!("{}", e))?;
        Ok(())
    }
}
