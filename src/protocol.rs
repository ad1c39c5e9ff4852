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

use crate::error::LookupError;
use crate::query::IntegerParam;
use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Lookup request carried as the JSON payload of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LookupRequest {
    GetById {
        id: IntegerParam,
    },
    Search {
        field: String,
        term: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<IntegerParam>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<IntegerParam>,
    },
    GetExact {
        field: String,
        value: String,
    },
}

impl LookupRequest {
    /// Operation name as carried in the `op` tag
    pub fn op(&self) -> &'static str {
        match self {
            LookupRequest::GetById { .. } => "get_by_id",
            LookupRequest::Search { .. } => "search",
            LookupRequest::GetExact { .. } => "get_exact",
        }
    }

    /// Field the request filters on; `id` for lookups by id
    pub fn field(&self) -> &str {
        match self {
            LookupRequest::GetById { .. } => crate::record::ID_FIELD,
            LookupRequest::Search { field, .. } | LookupRequest::GetExact { field, .. } => field,
        }
    }
}

/// Outcome class of a lookup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Ok,
    NotFound,
    InvalidInput,
    Error,
}

/// Response message for lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub status: LookupStatus,
    pub message: String,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
}

impl LookupResponse {
    pub fn found(records: Vec<Record>) -> Self {
        Self {
            status: LookupStatus::Ok,
            message: format!("{} record(s) found", records.len()),
            records,
            query_id: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            status: LookupStatus::Error,
            message,
            records: Vec::new(),
            query_id: None,
        }
    }

    pub fn invalid(message: String) -> Self {
        Self {
            status: LookupStatus::InvalidInput,
            message,
            records: Vec::new(),
            query_id: None,
        }
    }

    pub fn with_query_id(mut self, query_id: String) -> Self {
        self.query_id = Some(query_id);
        self
    }
}

impl From<&LookupError> for LookupResponse {
    fn from(error: &LookupError) -> Self {
        match error {
            LookupError::InvalidInput(message) => Self::invalid(message.clone()),
            LookupError::NotFound => Self {
                status: LookupStatus::NotFound,
                message: "No records found".to_string(),
                records: Vec::new(),
                query_id: None,
            },
            LookupError::Backend(e) => Self::error(format!("{:#}", e)),
        }
    }
}

/// Service description returned on the info key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub backend: String,
    pub dataset: String,
    pub started_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_op_and_field() {
        let by_id = LookupRequest::GetById { id: IntegerParam::Int(5) };
        assert_eq!((by_id.op(), by_id.field()), ("get_by_id", "id"));

        let exact = LookupRequest::GetExact {
            field: "email".to_string(),
            value: "a@b.com".to_string(),
        };
        assert_eq!((exact.op(), exact.field()), ("get_exact", "email"));

        // The op name matches the serialized tag
        let json = serde_json::to_value(&exact).unwrap();
        assert_eq!(json["op"], json!(exact.op()));
    }

    #[test]
    fn test_request_shapes() {
        let by_id: LookupRequest = serde_json::from_value(json!({"op": "get_by_id", "id": 5})).unwrap();
        assert_eq!(by_id, LookupRequest::GetById { id: IntegerParam::Int(5) });

        let search: LookupRequest = serde_json::from_value(json!({
            "op": "search",
            "field": "aadhar_card",
            "term": "5",
            "limit": "10"
        }))
        .unwrap();
        assert_eq!(
            search,
            LookupRequest::Search {
                field: "aadhar_card".to_string(),
                term: "5".to_string(),
                limit: Some(IntegerParam::Text("10".to_string())),
                offset: None,
            }
        );

        let unknown = serde_json::from_value::<LookupRequest>(json!({"op": "delete", "id": 1}));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_error_mapping() {
        let not_found = LookupResponse::from(&LookupError::NotFound);
        assert_eq!(not_found.status, LookupStatus::NotFound);

        let invalid = LookupResponse::from(&LookupError::invalid("bad limit"));
        assert_eq!(invalid.status, LookupStatus::InvalidInput);
        assert_eq!(invalid.message, "bad limit");

        let json = serde_json::to_value(LookupResponse::found(vec![])).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json.get("query_id").is_none());
    }
}
