//! # Records Client
//!
//! A thin HTTP client for the record API's `items` list endpoint.
//!
//! The client is configured once (token, environment, API version) and is cheap to share:
//! it wraps a `reqwest::Client`, which pools connections internally.
//!
//! Failures are never retried here. A failed list or count call propagates to the caller
//! of [`crate::DataSource::get_rows`], which owns any retry policy.
use super::types::{ClientSettings, ListMode, Listing, LogLevel};
use crate::query::RemoteQuery;
use http::{
    HeaderMap, HeaderValue, StatusCode,
    header::{ACCEPT, AUTHORIZATION, InvalidHeaderValue},
};
use reqwest::Url;
use std::time::Instant;

const LOG_TARGET: &str = "gridsource::remote";
const ITEMS_PATH: &str = "items";

pub const API_VERSION_HEADER: &str = "x-api-version";
pub const ENVIRONMENT_HEADER: &str = "x-environment";

/// Errors that can occur while building a [`RecordsClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("An API token is required to query the record API")]
    MissingToken,
    #[error("Invalid base URL '{0}': {1}")]
    InvalidBaseUrl(String, #[source] url::ParseError),
    #[error("Invalid value for header '{name}': '{source}'")]
    InvalidHeader {
        name: &'static str,
        source: InvalidHeaderValue,
    },
    #[error("Failed to build the HTTP client: '{0}'")]
    Http(#[source] reqwest::Error),
}

/// Errors that can occur while talking to the record API.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Request to '{url}' failed: '{source}'")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Record API responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to decode the response body: '{0}'")]
    Decode(#[from] serde_json::Error),
    #[error("Unexpected response body: {0}")]
    UnexpectedBody(String),
    #[error("The count response did not include `meta.total_count`")]
    MissingTotalCount,
}

/// A configured client for one (token, environment, log level) tuple.
#[derive(Debug)]
pub struct RecordsClient {
    http: reqwest::Client,
    items_url: Url,
    environment: Option<String>,
    log_level: LogLevel,
}

impl RecordsClient {
    /// Builds a client.
    ///
    /// # Arguments
    ///
    /// * `settings` - Deployment settings (base URL, API version, timeout).
    /// * `token` - Bearer token. Must not be empty.
    /// * `environment` - Optional sandbox environment, sent as `X-Environment`.
    /// * `log_level` - How much of each exchange to log.
    ///
    /// # Returns
    ///
    /// * `Ok(RecordsClient)` - The configured client.
    /// * `Err(ClientBuildError)` - If the token is empty or a header cannot be encoded.
    pub fn new(
        settings: &ClientSettings,
        token: &str,
        environment: Option<&str>,
        log_level: LogLevel,
    ) -> Result<Self, ClientBuildError> {
        if token.trim().is_empty() {
            return Err(ClientBuildError::MissingToken);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut auth = header_value("authorization", &format!("Bearer {token}"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        headers.insert(
            API_VERSION_HEADER,
            HeaderValue::from(settings.api_version),
        );

        if let Some(environment) = environment {
            headers.insert(
                ENVIRONMENT_HEADER,
                header_value(ENVIRONMENT_HEADER, environment)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(ClientBuildError::Http)?;

        let items_url = settings
            .base_url
            .join(ITEMS_PATH)
            .map_err(|err| ClientBuildError::InvalidBaseUrl(settings.base_url.to_string(), err))?;

        Ok(Self {
            http,
            items_url,
            environment: environment.map(str::to_string),
            log_level,
        })
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Runs a list query.
    ///
    /// The API always answers with the envelope. In [`ListMode::Flat`] the records are
    /// flattened here and the count is dropped, so the caller resolves it separately.
    pub async fn list(&self, query: &RemoteQuery, mode: ListMode) -> Result<Listing, RemoteError> {
        let pairs = query.to_query_pairs();

        let request = self.http.get(self.items_url.clone()).query(&pairs);

        if self.log_level >= LogLevel::Basic {
            tracing::debug!(
                target: LOG_TARGET,
                method = "GET",
                url = %self.items_url,
                ?mode,
                "list request"
            );
        }
        if self.log_level >= LogLevel::Body {
            tracing::trace!(target: LOG_TARGET, query = ?pairs, "list request parameters");
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|source| RemoteError::Transport {
            url: self.items_url.to_string(),
            source,
        })?;

        let status = response.status();

        if self.log_level >= LogLevel::BodyAndHeaders {
            let names: Vec<&str> = response.headers().keys().map(|k| k.as_str()).collect();
            tracing::trace!(target: LOG_TARGET, headers = ?names, "list response headers");
        }

        let body = response.text().await.map_err(|source| RemoteError::Transport {
            url: self.items_url.to_string(),
            source,
        })?;

        if self.log_level >= LogLevel::Basic {
            tracing::debug!(
                target: LOG_TARGET,
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "list response"
            );
        }
        if self.log_level >= LogLevel::Body {
            tracing::trace!(target: LOG_TARGET, %body, "list response body");
        }

        if !status.is_success() {
            return Err(RemoteError::Status { status, body });
        }

        let listing = Listing::from_body(serde_json::from_str(&body)?)?;

        Ok(match mode {
            ListMode::Envelope => listing,
            ListMode::Flat => listing.into_flat(),
        })
    }

    /// Counts the records matching `query`'s filters with a single `page[limit]=0` request.
    ///
    /// The total is read from the envelope of that response only.
    pub async fn count(&self, query: &RemoteQuery) -> Result<u64, RemoteError> {
        let listing = self.list(&query.for_count(), ListMode::Envelope).await?;

        listing.total_count.ok_or(RemoteError::MissingTotalCount)
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ClientBuildError> {
    HeaderValue::from_str(value).map_err(|source| ClientBuildError::InvalidHeader { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grid::GridRequest, query::QueryTranslator};
    use serde_json::json;
    use std::num::NonZeroU64;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> ClientSettings {
        ClientSettings::default().with_base_url(server.uri()).unwrap()
    }

    fn query() -> RemoteQuery {
        let request = GridRequest::new()
            .with_page(1, NonZeroU64::new(2).unwrap())
            .filter("status", "equals", "published");

        QueryTranslator::new(NonZeroU64::new(50).unwrap()).translate(&request, Some("model_a"))
    }

    #[test]
    fn test_empty_token_is_rejected() {
        for token in ["", "   "] {
            let result =
                RecordsClient::new(&ClientSettings::default(), token, None, LogLevel::None);
            assert!(matches!(result, Err(ClientBuildError::MissingToken)));
        }
    }

    #[test]
    fn test_invalid_environment_is_rejected() {
        let result = RecordsClient::new(
            &ClientSettings::default(),
            "token",
            Some("bad\nvalue"),
            LogLevel::None,
        );

        assert!(matches!(
            result,
            Err(ClientBuildError::InvalidHeader { name, .. }) if name == ENVIRONMENT_HEADER
        ));
    }

    #[tokio::test]
    async fn test_list_sends_query_and_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items"))
            .and(header("authorization", "Bearer secret"))
            .and(header("x-api-version", "3"))
            .and(header("x-environment", "sandbox"))
            .and(query_param("filter[type]", "model_a"))
            .and(query_param("filter[fields][status][eq]", "published"))
            .and(query_param("page[offset]", "2"))
            .and(query_param("page[limit]", "2"))
            .and(query_param("version", "current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "a" }],
                "meta": { "total_count": 7 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            RecordsClient::new(&settings(&server), "secret", Some("sandbox"), LogLevel::Body)
                .unwrap();

        let listing = client.list(&query(), ListMode::Envelope).await.unwrap();

        assert_eq!(listing.records, vec![json!({ "id": "a" })]);
        assert_eq!(listing.total_count, Some(7));
    }

    #[tokio::test]
    async fn test_flat_mode_flattens_the_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": "a",
                    "relationships": { "item_type": { "data": { "id": "model_a" } } }
                }],
                "meta": { "total_count": 7 }
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client =
            RecordsClient::new(&settings(&server), "secret", None, LogLevel::None).unwrap();

        let flat = client.list(&query(), ListMode::Flat).await.unwrap();
        let envelope = client.list(&query(), ListMode::Envelope).await.unwrap();

        assert_eq!(flat.total_count, None);
        assert_eq!(flat.records, vec![json!({ "id": "a", "item_type": { "id": "model_a" } })]);
        assert_eq!(envelope.total_count, Some(7));
        assert!(envelope.records[0].get("relationships").is_some());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), requests[1].url.query());
    }

    #[tokio::test]
    async fn test_error_status_is_propagated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let client =
            RecordsClient::new(&settings(&server), "secret", None, LogLevel::None).unwrap();

        let err = client.list(&query(), ListMode::Envelope).await.unwrap_err();

        assert!(matches!(
            &err,
            RemoteError::Status { status, body }
                if *status == StatusCode::UNAUTHORIZED && body == "invalid token"
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client =
            RecordsClient::new(&settings(&server), "secret", None, LogLevel::None).unwrap();

        let err = client.list(&query(), ListMode::Envelope).await.unwrap_err();

        assert!(matches!(err, RemoteError::Decode(_)));
    }

    #[tokio::test]
    async fn test_count_uses_zero_limit_envelope_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("page[limit]", "0"))
            .and(query_param("filter[fields][status][eq]", "published"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [],
                "meta": { "total_count": 42 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            RecordsClient::new(&settings(&server), "secret", None, LogLevel::None).unwrap();

        assert_eq!(client.count(&query()).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_count_without_total_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client =
            RecordsClient::new(&settings(&server), "secret", None, LogLevel::None).unwrap();

        let err = client.count(&query()).await.unwrap_err();

        assert!(matches!(err, RemoteError::MissingTotalCount));
    }
}
