use super::client::{ClientBuildError, RemoteError};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr, time::Duration};

pub const DEFAULT_BASE_URL: &str = "https://site-api.datocms.com/";
pub const DEFAULT_API_VERSION: u32 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of each HTTP exchange a client logs.
///
/// Levels are ordered: every level logs what the previous ones do.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Nothing.
    #[default]
    None,
    /// Method, URL, status and elapsed time.
    Basic,
    /// Also the query parameters and response bodies.
    Body,
    /// Also the request and response header names.
    BodyAndHeaders,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().replace('-', "_").as_str() {
            "NONE" => Ok(LogLevel::None),
            "BASIC" => Ok(LogLevel::Basic),
            "BODY" => Ok(LogLevel::Body),
            "BODY_AND_HEADERS" => Ok(LogLevel::BodyAndHeaders),
            other => Err(format!(
                "Invalid log level '{other}'. Expected one of: none, basic, body, body-and-headers"
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::None => "none",
            LogLevel::Basic => "basic",
            LogLevel::Body => "body",
            LogLevel::BodyAndHeaders => "body-and-headers",
        };
        f.write_str(name)
    }
}

/// Which flavour of the list call to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// JSON:API document: `{ "data": [...], "meta": { "total_count": n } }`.
    #[default]
    Envelope,
    /// Records with their relationships resolved inline and no count metadata. The client
    /// builds it from the envelope.
    Flat,
}

impl FromStr for ListMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "envelope" | "raw" => Ok(ListMode::Envelope),
            "flat" | "simple" => Ok(ListMode::Flat),
            other => Err(format!(
                "Invalid list mode '{other}'. Expected 'envelope' or 'flat'"
            )),
        }
    }
}

/// The records of one list call, plus the total count when the response carried one.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub records: Vec<Value>,
    pub total_count: Option<u64>,
}

impl Listing {
    /// Reads a response body, detecting its shape from the JSON itself.
    ///
    /// * An array is a flat listing without a count.
    /// * An object with a `data` array is an envelope; `meta.total_count` is optional.
    pub fn from_body(body: Value) -> Result<Self, RemoteError> {
        match body {
            Value::Array(records) => Ok(Self {
                records,
                total_count: None,
            }),
            Value::Object(mut document) => {
                let total_count = document
                    .get("meta")
                    .and_then(|meta| meta.get("total_count"))
                    .and_then(Value::as_u64);

                match document.remove("data") {
                    Some(Value::Array(records)) => Ok(Self {
                        records,
                        total_count,
                    }),
                    Some(_) => Err(RemoteError::UnexpectedBody(
                        "`data` is not an array".to_string(),
                    )),
                    None => Err(RemoteError::UnexpectedBody(
                        "document has no `data` member".to_string(),
                    )),
                }
            }
            other => Err(RemoteError::UnexpectedBody(format!(
                "expected an array or a document, got `{other}`"
            ))),
        }
    }
}

impl Listing {
    /// Rewrites every JSON:API resource object into a flat record and drops the count.
    ///
    /// `relationships.<name>.data` becomes `<name>` and the members of `attributes` move to
    /// the top level. Records that are already flat are kept as they are.
    pub fn into_flat(self) -> Self {
        Self {
            records: self.records.into_iter().map(flatten_record).collect(),
            total_count: None,
        }
    }
}

fn flatten_record(record: Value) -> Value {
    let Value::Object(mut object) = record else {
        return record;
    };

    if !object.get("relationships").is_some_and(Value::is_object) {
        return Value::Object(object);
    }

    if let Some(Value::Object(attributes)) = object.remove("attributes") {
        for (name, value) in attributes {
            object.entry(name).or_insert(value);
        }
    }

    if let Some(Value::Object(relationships)) = object.remove("relationships") {
        for (name, relationship) in relationships {
            let target = match relationship {
                Value::Object(mut relationship) => {
                    relationship.remove("data").unwrap_or(Value::Null)
                }
                _ => Value::Null,
            };
            object.insert(name, target);
        }
    }

    Value::Object(object)
}

/// Deployment settings shared by every client a [`super::ClientFactory`] builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: Url,
    pub api_version: u32,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_version: DEFAULT_API_VERSION,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientSettings {
    /// Points the clients at another API host (e.g. a test server).
    ///
    /// A trailing slash is added so relative endpoint paths resolve under the given path.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self, ClientBuildError> {
        let raw = base_url.as_ref();
        let mut url = Url::parse(raw)
            .map_err(|err| ClientBuildError::InvalidBaseUrl(raw.to_string(), err))?;

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path().trim_end_matches('/'));
            url.set_path(&path);
        }

        self.base_url = url;
        Ok(self)
    }

    pub fn with_api_version(mut self, api_version: u32) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_from_envelope() {
        let listing = Listing::from_body(json!({
            "data": [{ "id": "a" }, { "id": "b" }],
            "meta": { "total_count": 12 }
        }))
        .unwrap();

        assert_eq!(listing.records.len(), 2);
        assert_eq!(listing.total_count, Some(12));
    }

    #[test]
    fn test_listing_from_envelope_without_count() {
        let listing = Listing::from_body(json!({ "data": [] })).unwrap();

        assert_eq!(listing.total_count, None);
    }

    #[test]
    fn test_listing_from_flat_array() {
        let listing = Listing::from_body(json!([{ "id": "a" }])).unwrap();

        assert_eq!(listing.records.len(), 1);
        assert_eq!(listing.total_count, None);
    }

    #[test]
    fn test_listing_rejects_other_bodies() {
        assert!(matches!(
            Listing::from_body(json!({ "errors": [] })),
            Err(RemoteError::UnexpectedBody(_))
        ));
        assert!(matches!(
            Listing::from_body(json!({ "data": {} })),
            Err(RemoteError::UnexpectedBody(_))
        ));
        assert!(matches!(
            Listing::from_body(json!("nope")),
            Err(RemoteError::UnexpectedBody(_))
        ));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let settings = ClientSettings::default()
            .with_base_url("http://127.0.0.1:8080/api")
            .unwrap();

        assert_eq!(settings.base_url.as_str(), "http://127.0.0.1:8080/api/");
        assert_eq!(
            settings.base_url.join("items").unwrap().as_str(),
            "http://127.0.0.1:8080/api/items"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ClientSettings::default().with_base_url("not a url");

        assert!(matches!(result, Err(ClientBuildError::InvalidBaseUrl(url, _)) if url == "not a url"));
    }

    #[test]
    fn test_flat_listing_resolves_relationships() {
        let listing = Listing::from_body(json!({
            "data": [{
                "id": "rec_1",
                "type": "item",
                "attributes": { "title": "Hello" },
                "relationships": {
                    "item_type": { "data": { "id": "model_a", "type": "item_type" } },
                    "creator": { "data": null }
                },
                "meta": { "status": "draft" }
            }],
            "meta": { "total_count": 1 }
        }))
        .unwrap()
        .into_flat();

        assert_eq!(listing.total_count, None);
        assert_eq!(
            listing.records,
            vec![json!({
                "id": "rec_1",
                "type": "item",
                "title": "Hello",
                "item_type": { "id": "model_a", "type": "item_type" },
                "creator": null,
                "meta": { "status": "draft" }
            })]
        );
    }

    #[test]
    fn test_flat_listing_keeps_flat_records() {
        let record = json!({ "id": "rec_1", "item_type": { "id": "model_a" } });

        let listing = Listing::from_body(json!([record.clone()])).unwrap().into_flat();

        assert_eq!(listing.records, vec![record]);
    }

    #[test]
    fn test_log_level_parsing_and_order() {
        assert_eq!("body-and-headers".parse(), Ok(LogLevel::BodyAndHeaders));
        assert_eq!("BASIC".parse(), Ok(LogLevel::Basic));
        assert!("verbose".parse::<LogLevel>().is_err());
        assert!(LogLevel::None < LogLevel::Basic);
        assert!(LogLevel::Body < LogLevel::BodyAndHeaders);
    }
}
