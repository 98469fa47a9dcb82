//! # Gridsource Core
//!
//! `gridsource-core` is the foundational library powering the Gridsource CLI. It adapts a
//! remote, paginated REST record API to the request/response protocol spoken by tabular
//! data grids: page number, page size, sort columns and filter predicates in, a page of flat
//! rows plus the total row count out.
//!
//! ## Key Components
//!
//! * **[`DataSource`]:** The main entry point. It translates a [`GridRequest`], runs the
//!   remote list call, flattens the records into [`Row`]s and resolves the total row count.
//!   It also guards the grid against stale responses when requests overlap.
//! * **[`ClientFactory`]:** Builds and memoizes one [`RecordsClient`] per
//!   (token, environment, log level) tuple.
//! * **[`QueryTranslator`]:** Turns a grid request into a [`RemoteQuery`]
//!   (`filter[fields]`, `page[offset]`, `page[limit]`, `order_by`).
//! * **[`RemoteRecord`]:** The two record shapes returned by the API (embedded references
//!   and JSON:API relationships), both mapped to the same [`Row`].
//!
//! ## Count strategies
//!
//! Some list calls report the total number of matching records in their envelope, some
//! do not. The [`CountResolver`] uses the embedded count when there is one and otherwise
//! issues a single auxiliary `page[limit]=0` query.
//!
//! ## Re-exports
//!
//! This crate re-exports `reqwest` and `serde_json` so consumers use compatible versions.
pub mod count;
pub mod grid;
pub mod query;
pub mod record;
pub mod remote;
pub mod source;

pub use count::{CountResolver, CountStrategy, ResolvedCount};
pub use grid::{
    COLUMNS, ColumnSpec, ColumnType, FilterItem, FilterModel, GridRequest, InitialState, Page,
    PaginationModel, Row, SortDirection, SortItem,
};
pub use query::{
    CURRENT_VERSION, FilterMergePolicy, QueryTranslator, RemoteQuery, operator::map_operator,
};
pub use record::{RemoteRecord, ShapeMismatch};
pub use remote::{
    ClientFactory, ClientSettings, ListMode, Listing, LogLevel, RecordsClient,
    client::{ClientBuildError, RemoteError},
};
pub use source::{
    Credentials, DEFAULT_PAGE_SIZE, DataSource, DataSourceOptions, GetRowsError, VisiblePage,
    cache::PageCachePolicy,
};

// Re-exports
pub use reqwest;
pub use serde_json;
