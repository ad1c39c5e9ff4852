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

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;

/// Field holding the unique integer key
pub const ID_FIELD: &str = "id";

/// One entity of the dataset: an immutable field-name to value mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Integer `id` of the record, if it has one
    pub fn id(&self) -> Option<i64> {
        self.0.get(ID_FIELD).and_then(Value::as_i64)
    }

    /// Field value coerced to text for matching.
    ///
    /// Only strings and numbers coerce; every other JSON type yields `None`
    /// and can never satisfy a field predicate.
    ///
    /// Numbers render as serde_json prints them. The indexed store renders
    /// numbers through SQLite, which agrees for integers in `i64` range and
    /// for floats of up to 15 significant digits without an exponent; see
    /// [`Record::has_exact_numeric_text`].
    pub fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        match self.0.get(field)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            _ => None,
        }
    }

    /// Whether every numeric field renders to the same text in SQLite as
    /// it does here, so both backends coerce it identically.
    pub fn has_exact_numeric_text(&self) -> bool {
        self.0.values().all(|value| match value {
            Value::Number(n) => numeric_text_is_exact(n),
            _ => true,
        })
    }
}

/// SQLite keeps integers in `i64` and prints reals with 15 significant digits
fn numeric_text_is_exact(n: &Number) -> bool {
    if n.is_i64() {
        return true;
    }
    if n.is_u64() {
        return false;
    }

    let text = n.to_string();
    if text.contains(['e', 'E']) {
        return false;
    }
    let digits = text
        .chars()
        .filter(char::is_ascii_digit)
        .skip_while(|&c| c == '0')
        .count();
    digits <= 15
}

impl TryFrom<Value> for Record {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::try_from(value).unwrap()
    }

    #[test]
    fn test_id_requires_integer() {
        assert_eq!(record(json!({"id": 7})).id(), Some(7));
        assert_eq!(record(json!({"id": "7"})).id(), None);
        assert_eq!(record(json!({"id": 7.5})).id(), None);
        assert_eq!(record(json!({"name": "x"})).id(), None);
    }

    #[test]
    fn test_field_text_coercion() {
        let r = record(json!({
            "email": "a@b.com",
            "age": 42,
            "active": true,
            "tags": ["x"],
            "note": null
        }));

        assert_eq!(r.field_text("email").as_deref(), Some("a@b.com"));
        assert_eq!(r.field_text("age").as_deref(), Some("42"));
        assert_eq!(r.field_text("active"), None);
        assert_eq!(r.field_text("tags"), None);
        assert_eq!(r.field_text("note"), None);
        assert_eq!(r.field_text("missing"), None);
    }

    #[test]
    fn test_exact_numeric_text() {
        assert!(record(json!({"id": 1, "age": 42, "score": 1.5, "name": "x"})).has_exact_numeric_text());
        assert!(record(json!({"balance": -9223372036854775807i64})).has_exact_numeric_text());

        assert!(!record(json!({"score": 18446744073709551615u64})).has_exact_numeric_text());
        assert!(!record(json!({"ratio": 0.30000000000000004})).has_exact_numeric_text());
        assert!(!record(json!({"tiny": 1e-7})).has_exact_numeric_text());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Record::try_from(json!([1, 2])).is_err());
        assert!(Record::try_from(json!("text")).is_err());
    }

    #[test]
    fn test_serializes_transparently() {
        let r = record(json!({"id": 1, "email": "a@b.com"}));
        let text = serde_json::to_string(&r).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, json!({"id": 1, "email": "a@b.com"}));
    }
}
