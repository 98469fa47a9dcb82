//! # Records Fixture
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an in-process record API for
//! integration testing `gridsource-core` and the `gridsource` CLI.
//! It is not intended for production use.
//!
//! [`RecordsApi`] is a `wiremock` responder serving a fixed set of records from `GET /items`.
//! It understands the subset of the list call the adapter uses:
//!
//! * `filter[type]` and `filter[fields][<field>][<op>]`
//! * `page[offset]` and `page[limit]` (`limit = 0` returns only the count)
//! * `order_by`
//!
//! Responses are always JSON:API envelopes with `meta.total_count`.
use serde_json::{Value, json};
use std::{cmp::Ordering, time::Duration};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const ITEMS_PATH: &str = "/items";

#[derive(Debug, Clone, PartialEq)]
pub struct FixtureRecord {
    pub id: &'static str,
    pub item_type: &'static str,
    pub creator: Option<&'static str>,
    pub status: &'static str,
    pub updated_at: &'static str,
    pub title: &'static str,
    pub position: i64,
}

/// Five records across two collections. `rec_3` has no creator.
pub fn sample_records() -> Vec<FixtureRecord> {
    vec![
        FixtureRecord {
            id: "rec_1",
            item_type: "model_a",
            creator: Some("user_1"),
            status: "published",
            updated_at: "2024-01-05T10:00:00Z",
            title: "Alpha",
            position: 1,
        },
        FixtureRecord {
            id: "rec_2",
            item_type: "model_a",
            creator: Some("user_2"),
            status: "draft",
            updated_at: "2024-02-11T08:30:00Z",
            title: "Bravo",
            position: 2,
        },
        FixtureRecord {
            id: "rec_3",
            item_type: "model_b",
            creator: None,
            status: "published",
            updated_at: "2024-03-01T12:00:00Z",
            title: "Charlie",
            position: 3,
        },
        FixtureRecord {
            id: "rec_4",
            item_type: "model_b",
            creator: Some("user_1"),
            status: "updated",
            updated_at: "2023-12-24T18:45:00Z",
            title: "Delta",
            position: 4,
        },
        FixtureRecord {
            id: "rec_5",
            item_type: "model_a",
            creator: Some("user_2"),
            status: "published",
            updated_at: "2024-04-20T09:15:00Z",
            title: "Echo",
            position: 5,
        },
    ]
}

impl FixtureRecord {
    /// The record with references resolved inline, as a flat listing holds it.
    pub fn embedded_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": "item",
            "item_type": { "id": self.item_type, "type": "item_type" },
            "creator": self.creator.map(|id| json!({ "id": id, "type": "user" })),
            "meta": { "status": self.status, "updated_at": self.updated_at },
            "title": self.title,
            "position": self.position,
        })
    }

    /// The record as a JSON:API resource object, as returned inside the envelope.
    pub fn relationship_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": "item",
            "attributes": { "title": self.title, "position": self.position },
            "relationships": {
                "item_type": { "data": { "id": self.item_type, "type": "item_type" } },
                "creator": {
                    "data": self.creator.map(|id| json!({ "id": id, "type": "user" }))
                },
            },
            "meta": { "status": self.status, "updated_at": self.updated_at },
        })
    }

    fn attribute(&self, field: &str) -> Option<Value> {
        let value = match field {
            "id" => json!(self.id),
            "item_type" | "itemTypeId" => json!(self.item_type),
            "creator" => json!(self.creator),
            "status" | "_status" => json!(self.status),
            "updated_at" | "_updated_at" | "updatedAt" => json!(self.updated_at),
            "title" => json!(self.title),
            "position" => json!(self.position),
            _ => return None,
        };

        Some(value)
    }
}

/// A `wiremock` responder serving [`sample_records`] (or any other record set).
#[derive(Debug, Clone)]
pub struct RecordsApi {
    records: Vec<FixtureRecord>,
    delay: Option<Duration>,
}

impl Default for RecordsApi {
    fn default() -> Self {
        Self::new(sample_records())
    }
}

impl RecordsApi {
    pub fn new(records: Vec<FixtureRecord>) -> Self {
        Self {
            records,
            delay: None,
        }
    }

    /// Delays every response, to let a test interleave overlapping requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn select(&self, params: &ListParams) -> Vec<&FixtureRecord> {
        let mut matching: Vec<&FixtureRecord> = self
            .records
            .iter()
            .filter(|record| {
                params
                    .item_types
                    .as_ref()
                    .is_none_or(|types| types.iter().any(|t| t == record.item_type))
            })
            .filter(|record| {
                params
                    .predicates
                    .iter()
                    .all(|predicate| predicate.matches(record))
            })
            .collect();

        for (field, descending) in params.order.iter().rev() {
            matching.sort_by(|a, b| {
                let left = a.attribute(field).unwrap_or(Value::Null);
                let right = b.attribute(field).unwrap_or(Value::Null);
                let ordering = compare(&left, &right);
                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        matching
    }
}

impl Respond for RecordsApi {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if !request.headers.contains_key("authorization") {
            return ResponseTemplate::new(401).set_body_json(json!({
                "data": [{ "id": "401", "attributes": { "code": "INVALID_AUTHORIZATION_HEADER" } }]
            }));
        }

        let params = match ListParams::parse(request) {
            Ok(params) => params,
            Err(message) => {
                return ResponseTemplate::new(422).set_body_json(json!({
                    "data": [{ "id": "422", "attributes": { "code": "INVALID_FIELD", "details": message } }]
                }));
            }
        };

        let matching = self.select(&params);
        let total = matching.len();

        let page = matching
            .into_iter()
            .skip(params.offset)
            .take(params.limit.unwrap_or(usize::MAX));

        let body = json!({
            "data": page.map(FixtureRecord::relationship_json).collect::<Vec<_>>(),
            "meta": { "total_count": total },
        });

        let response = ResponseTemplate::new(200).set_body_json(body);

        match self.delay {
            Some(delay) => response.set_delay(delay),
            None => response,
        }
    }
}

struct Predicate {
    field: String,
    operator: String,
    value: String,
}

impl Predicate {
    fn matches(&self, record: &FixtureRecord) -> bool {
        let Some(actual) = record.attribute(&self.field) else {
            return false;
        };
        let text = match &actual {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let list = || self.value.split(',').map(str::trim);

        match self.operator.as_str() {
            "eq" => text == self.value,
            "ne" => text != self.value,
            "contains" => text.to_lowercase().contains(&self.value.to_lowercase()),
            "starts_with" => text.starts_with(&self.value),
            "ends_with" => text.ends_with(&self.value),
            "in" => list().any(|v| v == text),
            "not_in" => list().all(|v| v != text),
            "gt" => compare(&actual, &parse_scalar(&self.value)) == Ordering::Greater,
            "gte" => compare(&actual, &parse_scalar(&self.value)) != Ordering::Less,
            "lt" => compare(&actual, &parse_scalar(&self.value)) == Ordering::Less,
            "lte" => compare(&actual, &parse_scalar(&self.value)) != Ordering::Greater,
            _ => false,
        }
    }
}

struct ListParams {
    item_types: Option<Vec<String>>,
    predicates: Vec<Predicate>,
    offset: usize,
    limit: Option<usize>,
    /// `(field, descending)` in priority order.
    order: Vec<(String, bool)>,
}

impl ListParams {
    fn parse(request: &Request) -> Result<Self, String> {
        let mut params = ListParams {
            item_types: None,
            predicates: Vec::new(),
            offset: 0,
            limit: None,
            order: Vec::new(),
        };

        for (key, value) in request.url.query_pairs() {
            match key.as_ref() {
                "filter[type]" => {
                    params.item_types = Some(value.split(',').map(str::to_string).collect());
                }
                "page[offset]" => {
                    params.offset = value.parse().map_err(|_| format!("bad offset '{value}'"))?;
                }
                "page[limit]" => {
                    params.limit =
                        Some(value.parse().map_err(|_| format!("bad limit '{value}'"))?);
                }
                "order_by" => {
                    for entry in value.split(',') {
                        let (field, direction) = entry
                            .rsplit_once('_')
                            .ok_or_else(|| format!("bad order '{entry}'"))?;
                        params.order.push((field.to_string(), direction == "DESC"));
                    }
                }
                key => {
                    if let Some(rest) = key.strip_prefix("filter[fields][") {
                        let (field, operator) = rest
                            .strip_suffix(']')
                            .and_then(|rest| rest.split_once("]["))
                            .ok_or_else(|| format!("bad filter key '{key}'"))?;

                        params.predicates.push(Predicate {
                            field: field.to_string(),
                            operator: operator.to_string(),
                            value: value.to_string(),
                        });
                    }
                }
            }
        }

        Ok(params)
    }
}

fn parse_scalar(value: &str) -> Value {
    value
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(value))
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (a, b) => a.to_string().cmp(&b.to_string()),
    }
}

/// Mounts `api` on `GET /items` of `server`.
pub async fn mount(server: &MockServer, api: RecordsApi) {
    Mock::given(method("GET"))
        .and(path(ITEMS_PATH))
        .respond_with(api)
        .mount(server)
        .await;
}

/// Starts a mock server serving [`sample_records`].
pub async fn start() -> MockServer {
    let server = MockServer::start().await;
    mount(&server, RecordsApi::default()).await;
    server
}
