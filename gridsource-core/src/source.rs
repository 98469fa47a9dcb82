//! # Data Source
//!
//! The [`DataSource`] is the single entry point the grid talks to. For each
//! [`GridRequest`] it:
//!
//! 1. Takes the next request sequence number.
//! 2. Translates the request into a [`RemoteQuery`].
//! 3. Fetches the listing with the memoized [`RecordsClient`] for its credentials.
//! 4. Flattens the records into [`Row`](crate::grid::Row)s.
//! 5. Resolves the total row count.
//! 6. Publishes the page, unless a newer request was issued in the meantime.
//!
//! ## Stale responses
//!
//! The grid may fire a new request (e.g. on every keystroke in a filter box) before the
//! previous one resolved, and the remote API offers no cancellation. A response whose
//! sequence number is no longer the latest issued is discarded: `get_rows` returns
//! [`GetRowsError::Superseded`] and the visible page is left untouched.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gridsource_core::{ClientFactory, Credentials, DataSource, DataSourceOptions, GridRequest};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = Arc::new(ClientFactory::default());
//! let source = DataSource::new(
//!     factory,
//!     Credentials::new("api-token"),
//!     DataSourceOptions::default().with_model_ids("model_a,model_b"),
//! );
//!
//! let page = source.get_rows(&GridRequest::new()).await?;
//! println!("{} of {:?} rows", page.rows.len(), page.row_count);
//! # Ok(())
//! # }
//! ```
pub mod cache;

use crate::{
    count::CountResolver,
    grid::{COLUMNS, ColumnSpec, GridRequest, InitialState, Page},
    query::{CURRENT_VERSION, FilterMergePolicy, QueryTranslator, RemoteQuery},
    record::{self, ShapeMismatch},
    remote::{
        ClientFactory, ListMode, LogLevel, RecordsClient,
        client::{ClientBuildError, RemoteError},
    },
};
use cache::{PageCache, PageCachePolicy};
use parking_lot::Mutex;
use std::{
    fmt,
    num::NonZeroU64,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::watch;

pub const DEFAULT_PAGE_SIZE: NonZeroU64 = NonZeroU64::new(50).unwrap();

/// Errors that can occur while fetching a page.
#[derive(Debug, thiserror::Error)]
pub enum GetRowsError {
    #[error("Failed to configure the records client: '{0}'")]
    Configuration(#[from] ClientBuildError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Shape(#[from] ShapeMismatch),
    #[error("Response to request #{sequence} was discarded: request #{latest} is newer")]
    Superseded { sequence: u64, latest: u64 },
}

/// The credential tuple a data source queries with.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_token: String,
    pub environment: Option<String>,
    pub log_level: LogLevel,
}

impl Credentials {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            environment: None,
            log_level: LogLevel::default(),
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"<redacted>")
            .field("environment", &self.environment)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Per-deployment behaviour of a [`DataSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceOptions {
    /// Comma-separated collection ids the listing is restricted to.
    pub model_ids: Option<String>,
    pub default_page_size: NonZeroU64,
    /// `version` query parameter; `None` omits it.
    pub version: Option<String>,
    pub list_mode: ListMode,
    /// Whether to run the auxiliary count query when a listing has no total.
    pub count_fallback: bool,
    pub merge_policy: FilterMergePolicy,
    pub cache_policy: PageCachePolicy,
}

impl Default for DataSourceOptions {
    fn default() -> Self {
        Self {
            model_ids: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            version: Some(CURRENT_VERSION.to_string()),
            list_mode: ListMode::default(),
            count_fallback: true,
            merge_policy: FilterMergePolicy::default(),
            cache_policy: PageCachePolicy::default(),
        }
    }
}

impl DataSourceOptions {
    pub fn with_model_ids(mut self, model_ids: impl Into<String>) -> Self {
        self.model_ids = Some(model_ids.into());
        self
    }

    pub fn with_default_page_size(mut self, page_size: NonZeroU64) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_list_mode(mut self, list_mode: ListMode) -> Self {
        self.list_mode = list_mode;
        self
    }

    pub fn with_count_fallback(mut self, count_fallback: bool) -> Self {
        self.count_fallback = count_fallback;
        self
    }

    pub fn with_merge_policy(mut self, merge_policy: FilterMergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    pub fn with_cache_policy(mut self, cache_policy: PageCachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }
}

/// The page currently shown by the grid, tagged with the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisiblePage {
    pub sequence: u64,
    pub page: Page,
}

pub struct DataSource {
    factory: Arc<ClientFactory>,
    credentials: Credentials,
    options: DataSourceOptions,
    translator: QueryTranslator,
    counter: CountResolver,
    sequence: AtomicU64,
    visible: watch::Sender<Option<VisiblePage>>,
    cache: Option<Mutex<PageCache>>,
}

impl DataSource {
    pub fn new(
        factory: Arc<ClientFactory>,
        credentials: Credentials,
        options: DataSourceOptions,
    ) -> Self {
        let translator = QueryTranslator::new(options.default_page_size)
            .with_merge_policy(options.merge_policy)
            .with_version(options.version.clone());
        let counter = CountResolver::new(options.count_fallback);
        let cache = PageCache::from_policy(options.cache_policy).map(Mutex::new);
        let (visible, _) = watch::channel(None);

        Self {
            factory,
            credentials,
            options,
            translator,
            counter,
            sequence: AtomicU64::new(0),
            visible,
            cache,
        }
    }

    pub fn options(&self) -> &DataSourceOptions {
        &self.options
    }

    /// Pagination state for the grid's first render.
    pub fn initial_state(&self) -> InitialState {
        InitialState::new(self.options.default_page_size)
    }

    pub fn columns(&self) -> &'static [ColumnSpec] {
        COLUMNS
    }

    /// The remote query `request` translates to, without running it.
    pub fn translate(&self, request: &GridRequest) -> RemoteQuery {
        self.translator
            .translate(request, self.options.model_ids.as_deref())
    }

    /// Subscribes to the page visible to the grid. Only the latest request ever updates it.
    pub fn subscribe(&self) -> watch::Receiver<Option<VisiblePage>> {
        self.visible.subscribe()
    }

    pub fn visible_page(&self) -> Option<VisiblePage> {
        self.visible.borrow().clone()
    }

    /// Fetches the page for `request`.
    ///
    /// # Returns
    ///
    /// * `Ok(Page)` - The rows and total count; the page is now the visible one.
    /// * `Err(GetRowsError::Superseded)` - A newer request was issued while this one was in
    ///   flight. Its outcome, success or failure, is discarded.
    /// * `Err(GetRowsError)` - Configuration, remote or record shape failure.
    pub async fn get_rows(&self, request: &GridRequest) -> Result<Page, GetRowsError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let query = self.translate(request);

        tracing::debug!(sequence, query = %query.cache_key(), "fetching page");

        let outcome = match self.cached(&query) {
            Some(page) => Ok(page),
            None => self.fetch(&query).await,
        };

        let latest = self.sequence.load(Ordering::SeqCst);
        if sequence != latest {
            tracing::warn!(sequence, latest, "discarding superseded response");
            return Err(GetRowsError::Superseded { sequence, latest });
        }

        let page = outcome?;
        self.publish(sequence, &page);

        Ok(page)
    }

    fn client(&self) -> Result<Arc<RecordsClient>, ClientBuildError> {
        self.factory.get_client(
            &self.credentials.api_token,
            self.credentials.environment.as_deref(),
            self.credentials.log_level,
        )
    }

    async fn fetch(&self, query: &RemoteQuery) -> Result<Page, GetRowsError> {
        let client = self.client()?;
        let listing = client.list(query, self.options.list_mode).await?;

        let rows = record::to_rows(&listing.records).inspect_err(|err| {
            tracing::warn!(error = %err, "record API returned a malformed record");
        })?;

        let count = self.counter.resolve(&client, query, &listing).await?;

        let page = Page {
            rows,
            row_count: count.total,
        };

        if let Some(cache) = &self.cache {
            cache.lock().insert(query.cache_key(), page.clone());
        }

        Ok(page)
    }

    fn cached(&self, query: &RemoteQuery) -> Option<Page> {
        let page = self.cache.as_ref()?.lock().get(&query.cache_key())?;
        tracing::debug!("page served from cache");
        Some(page)
    }

    fn publish(&self, sequence: u64, page: &Page) {
        self.visible.send_if_modified(|current| {
            if current.as_ref().is_some_and(|shown| shown.sequence > sequence) {
                return false;
            }

            *current = Some(VisiblePage {
                sequence,
                page: page.clone(),
            });
            true
        });
    }
}
