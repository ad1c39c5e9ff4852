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

// Query predicates and pagination shared by every backend

use crate::config::QuerySettings;
use crate::error::{LookupError, LookupResult};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Record filter evaluated by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Integer equality on `id`
    IdEquals(i64),
    /// Case-sensitive substring containment on a text-coerced field
    FieldContains { field: String, term: String },
    /// ASCII case-insensitive equality on a text-coerced field.
    /// `value` is held already lowercased.
    FieldEqualsIgnoreCase { field: String, value: String },
}

impl Predicate {
    pub fn id_equals(id: i64) -> Self {
        Predicate::IdEquals(id)
    }

    pub fn field_contains(field: &str, term: &str) -> LookupResult<Self> {
        check_field_name(field)?;
        Ok(Predicate::FieldContains {
            field: field.to_string(),
            term: term.to_string(),
        })
    }

    pub fn field_equals_ignore_case(field: &str, value: &str) -> LookupResult<Self> {
        check_field_name(field)?;
        Ok(Predicate::FieldEqualsIgnoreCase {
            field: field.to_string(),
            value: value.to_ascii_lowercase(),
        })
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::IdEquals(id) => record.id() == Some(*id),
            Predicate::FieldContains { field, term } => record
                .field_text(field)
                .is_some_and(|text| text.contains(term.as_str())),
            Predicate::FieldEqualsIgnoreCase { field, value } => record
                .field_text(field)
                .is_some_and(|text| text.to_ascii_lowercase() == *value),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::IdEquals(id) => write!(f, "id == {}", id),
            Predicate::FieldContains { field, term } => write!(f, "{} contains '{}'", field, term),
            Predicate::FieldEqualsIgnoreCase { field, value } => {
                write!(f, "lower({}) == '{}'", field, value)
            }
        }
    }
}

/// Field names are restricted to identifiers so they can be addressed
/// safely as JSON paths by the indexed store.
pub fn check_field_name(field: &str) -> LookupResult<()> {
    let mut chars = field.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(LookupError::invalid(format!("invalid field name '{}'", field)))
    }
}

/// Numeric keys (Aadhaar-like numbers) must be decimal digits only
pub fn check_digits(key: &str) -> LookupResult<()> {
    if !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(LookupError::invalid("Aadhaar number must be digits only"))
    }
}

/// Pagination window: positions `[offset, offset + limit)` among all matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// First match only
    pub fn first() -> Self {
        Self { limit: 1, offset: 0 }
    }

    /// One past the last match position that belongs to the window
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.offset && position < self.end()
    }

    /// Validate caller-supplied pagination parameters.
    ///
    /// Absent parameters take the configured defaults; present ones are
    /// never clamped.
    pub fn from_params(
        limit: Option<&IntegerParam>,
        offset: Option<&IntegerParam>,
        settings: &QuerySettings,
    ) -> LookupResult<Self> {
        let limit = match limit {
            None => i64::from(settings.default_limit),
            Some(raw) => raw
                .to_integer()
                .ok_or_else(|| LookupError::invalid(format!("limit must be an integer, got '{}'", raw)))?,
        };

        let max_limit = settings.effective_max_limit();
        if limit < 1 || limit > i64::from(max_limit) {
            return Err(LookupError::invalid(format!(
                "limit must be between 1 and {}, got {}",
                max_limit, limit
            )));
        }

        let offset = match offset {
            None => 0,
            Some(raw) => raw
                .to_integer()
                .ok_or_else(|| LookupError::invalid(format!("offset must be an integer, got '{}'", raw)))?,
        };

        if offset < 0 {
            return Err(LookupError::invalid(format!(
                "offset must be >= 0, got {}",
                offset
            )));
        }

        let offset = usize::try_from(offset)
            .map_err(|_| LookupError::invalid(format!("offset {} is out of range", offset)))?;

        Ok(Self::new(limit as usize, offset))
    }
}

/// An integer parameter as received from the transport: text or a JSON integer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntegerParam {
    Int(i64),
    Text(String),
}

impl IntegerParam {
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            IntegerParam::Int(value) => Some(*value),
            IntegerParam::Text(text) => text.parse().ok(),
        }
    }

    fn as_text(&self) -> Cow<'_, str> {
        match self {
            IntegerParam::Int(value) => Cow::Owned(value.to_string()),
            IntegerParam::Text(text) => Cow::Borrowed(text.as_str()),
        }
    }
}

impl fmt::Display for IntegerParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for IntegerParam {
    fn from(text: &str) -> Self {
        IntegerParam::Text(text.to_string())
    }
}

impl From<i64> for IntegerParam {
    fn from(value: i64) -> Self {
        IntegerParam::Int(value)
    }
}
