//! # Remote Queries
//!
//! This module contains the remote side of the translation: the [`RemoteQuery`] sent to the
//! record API's list endpoint, and the [`QueryTranslator`] that derives it from a grid
//! request.
//!
//! A query is encoded as bracketed query-string pairs:
//!
//! ```text
//! filter[type]=model_a,model_b
//! filter[fields][status][eq]=published
//! page[offset]=100
//! page[limit]=50
//! order_by=title_ASC,_updated_at_DESC
//! version=current
//! ```
pub mod operator;
mod translator;

pub use translator::{CURRENT_VERSION, FilterMergePolicy, QueryTranslator};

use serde_json::Value;
use std::collections::BTreeMap;

/// Predicates on a single field, keyed by remote operator token.
pub type FieldPredicates = BTreeMap<String, Value>;

/// The top-level `filter` object of a list query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    /// Restricts the listing to one or more collections (comma-separated ids).
    pub item_type: Option<String>,
    /// `None` when the grid has no filters. This is not the same as `Some` of an empty map,
    /// which would never be produced.
    pub fields: Option<BTreeMap<String, FieldPredicates>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteQuery {
    pub filter: QueryFilter,
    pub offset: u64,
    pub limit: u64,
    /// Comma-joined `field_DIRECTION` entries in grid order.
    pub order_by: Option<String>,
    pub version: Option<String>,
}

impl RemoteQuery {
    /// The same query with `limit = 0`: it matches the same records but returns none of
    /// them, only the envelope with the total count.
    pub fn for_count(&self) -> Self {
        Self {
            offset: 0,
            limit: 0,
            order_by: None,
            ..self.clone()
        }
    }

    /// Returns the predicates on `field`, if any.
    pub fn field(&self, field: &str) -> Option<&FieldPredicates> {
        self.filter.fields.as_ref()?.get(field)
    }

    /// Encodes the query as the ordered list of query-string pairs.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if let Some(item_type) = &self.filter.item_type {
            pairs.push(("filter[type]".to_string(), item_type.clone()));
        }

        if let Some(fields) = &self.filter.fields {
            for (field, predicates) in fields {
                for (operator, value) in predicates {
                    pairs.push((
                        format!("filter[fields][{field}][{operator}]"),
                        encode_value(value),
                    ));
                }
            }
        }

        pairs.push(("page[offset]".to_string(), self.offset.to_string()));
        pairs.push(("page[limit]".to_string(), self.limit.to_string()));

        if let Some(order_by) = &self.order_by {
            pairs.push(("order_by".to_string(), order_by.clone()));
        }

        if let Some(version) = &self.version {
            pairs.push(("version".to_string(), version.clone()));
        }

        pairs
    }

    /// A stable textual key identifying the query, used by the page cache.
    pub fn cache_key(&self) -> String {
        self.to_query_pairs()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(encode_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query() -> RemoteQuery {
        let mut fields = BTreeMap::new();
        fields.insert(
            "status".to_string(),
            FieldPredicates::from([("eq".to_string(), json!("published"))]),
        );
        fields.insert(
            "position".to_string(),
            FieldPredicates::from([("gte".to_string(), json!(3))]),
        );

        RemoteQuery {
            filter: QueryFilter {
                item_type: Some("model_a".to_string()),
                fields: Some(fields),
            },
            offset: 20,
            limit: 10,
            order_by: Some("title_ASC".to_string()),
            version: Some("current".to_string()),
        }
    }

    #[test]
    fn test_query_pairs() {
        let pairs = query().to_query_pairs();

        let expected: Vec<(String, String)> = [
            ("filter[type]", "model_a"),
            ("filter[fields][position][gte]", "3"),
            ("filter[fields][status][eq]", "published"),
            ("page[offset]", "20"),
            ("page[limit]", "10"),
            ("order_by", "title_ASC"),
            ("version", "current"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_value_encoding() {
        assert_eq!(encode_value(&json!(null)), "");
        assert_eq!(encode_value(&json!(true)), "true");
        assert_eq!(encode_value(&json!(2.5)), "2.5");
        assert_eq!(encode_value(&json!(["a", "b", 3])), "a,b,3");
        assert_eq!(encode_value(&json!({"k": 1})), r#"{"k":1}"#);
    }

    #[test]
    fn test_count_query_keeps_filters() {
        let original = query();
        let count = original.for_count();

        assert_eq!(count.limit, 0);
        assert_eq!(count.offset, 0);
        assert_eq!(count.order_by, None);
        assert_eq!(count.filter, original.filter);
        assert_eq!(count.version, original.version);
    }

    #[test]
    fn test_cache_key_distinguishes_pages() {
        let first = query();
        let second = RemoteQuery {
            offset: 30,
            ..query()
        };

        assert_ne!(first.cache_key(), second.cache_key());
        assert_eq!(first.cache_key(), query().cache_key());
    }
}
