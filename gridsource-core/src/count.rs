//! # Count Resolution
//!
//! The grid needs the total number of rows matching its filters, not just the size of the
//! current page. Depending on the list flavour, the API either reports that total in the
//! response envelope or drops it.
//!
//! The [`CountResolver`] picks one of two strategies per page fetch:
//!
//! 1. **Embedded**: the listing carried `meta.total_count`. No extra request.
//! 2. **Auxiliary**: one extra `page[limit]=0` request with the same filters and scope,
//!    whose envelope supplies the total.
//!
//! When the auxiliary query is disabled and the listing has no total, the count is unknown.
use crate::{
    query::RemoteQuery,
    remote::{Listing, RecordsClient, client::RemoteError},
};

/// How a total was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStrategy {
    Embedded,
    Auxiliary,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCount {
    pub total: Option<u64>,
    pub strategy: CountStrategy,
}

#[derive(Debug, Clone, Copy)]
pub struct CountResolver {
    fallback: bool,
}

impl Default for CountResolver {
    fn default() -> Self {
        Self { fallback: true }
    }
}

impl CountResolver {
    /// `fallback` enables the auxiliary count query for listings without a total.
    pub fn new(fallback: bool) -> Self {
        Self { fallback }
    }

    /// Resolves the total row count for the page described by `query` and `listing`.
    ///
    /// Issues at most one extra request.
    pub async fn resolve(
        &self,
        client: &RecordsClient,
        query: &RemoteQuery,
        listing: &Listing,
    ) -> Result<ResolvedCount, RemoteError> {
        if let Some(total) = listing.total_count {
            tracing::debug!(total, "using embedded total count");
            return Ok(ResolvedCount {
                total: Some(total),
                strategy: CountStrategy::Embedded,
            });
        }

        if !self.fallback {
            return Ok(ResolvedCount {
                total: None,
                strategy: CountStrategy::Unavailable,
            });
        }

        let total = client.count(query).await?;
        tracing::debug!(total, "resolved total count with an auxiliary query");

        Ok(ResolvedCount {
            total: Some(total),
            strategy: CountStrategy::Auxiliary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grid::GridRequest,
        query::QueryTranslator,
        remote::{ClientSettings, LogLevel},
    };
    use serde_json::json;
    use std::num::NonZeroU64;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RecordsClient {
        let settings = ClientSettings::default().with_base_url(server.uri()).unwrap();
        RecordsClient::new(&settings, "token", None, LogLevel::None).unwrap()
    }

    fn query() -> RemoteQuery {
        QueryTranslator::new(NonZeroU64::new(10).unwrap()).translate(&GridRequest::new(), None)
    }

    #[tokio::test]
    async fn test_embedded_count_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let listing = Listing {
            records: vec![],
            total_count: Some(9),
        };

        let resolved = CountResolver::default()
            .resolve(&client(&server), &query(), &listing)
            .await
            .unwrap();

        assert_eq!(resolved.total, Some(9));
        assert_eq!(resolved.strategy, CountStrategy::Embedded);
    }

    #[tokio::test]
    async fn test_auxiliary_count_runs_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("page[limit]", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [],
                "meta": { "total_count": 31 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let listing = Listing {
            records: vec![json!({ "id": "a" }), json!({ "id": "b" })],
            total_count: None,
        };

        let resolved = CountResolver::default()
            .resolve(&client(&server), &query(), &listing)
            .await
            .unwrap();

        assert_eq!(resolved.total, Some(31));
        assert_eq!(resolved.strategy, CountStrategy::Auxiliary);
    }

    #[tokio::test]
    async fn test_disabled_fallback_leaves_count_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let listing = Listing {
            records: vec![],
            total_count: None,
        };

        let resolved = CountResolver::new(false)
            .resolve(&client(&server), &query(), &listing)
            .await
            .unwrap();

        assert_eq!(resolved.total, None);
        assert_eq!(resolved.strategy, CountStrategy::Unavailable);
    }

    #[tokio::test]
    async fn test_auxiliary_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let listing = Listing {
            records: vec![],
            total_count: None,
        };

        let err = CountResolver::default()
            .resolve(&client(&server), &query(), &listing)
            .await
            .unwrap_err();

        assert!(matches!(err, RemoteError::Status { .. }));
    }
}
