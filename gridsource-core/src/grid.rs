//! # Grid Protocol
//!
//! The data structures exchanged with the data grid: the [`GridRequest`] issued on every
//! navigation, sort or filter change, and the [`Page`] of [`Row`]s sent back.
//!
//! Field names follow the grid's camelCase wire format (`paginationModel`, `sortModel`,
//! `filterModel.items`) so requests can be deserialized straight from the grid.
use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroU64, str::FromStr};

/// Which page to show and how many rows it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationModel {
    /// Zero-based page index.
    pub page: u64,
    pub page_size: NonZeroU64,
}

impl PaginationModel {
    pub fn new(page: u64, page_size: NonZeroU64) -> Self {
        Self { page, page_size }
    }

    /// The first page for a given page size.
    pub fn first(page_size: NonZeroU64) -> Self {
        Self::new(0, page_size)
    }

    /// Index of the first row of this page across the whole collection.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.page_size.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// The uppercase suffix used by the remote `order_by` parameter.
    pub fn as_remote(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!(
                "Invalid sort direction '{other}'. Expected 'asc' or 'desc'"
            )),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// A sorted column. The grid may send a column without a direction, which sorts nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortItem {
    pub field: String,
    #[serde(default)]
    pub sort: Option<SortDirection>,
}

/// A single filter predicate as the grid sends it.
///
/// `operator` is the grid's operator name (`equals`, `startsWith`, ...). Unknown names are
/// accepted here and resolved later by [`crate::query::operator::map_operator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterItem {
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterModel {
    #[serde(default)]
    pub items: Vec<FilterItem>,
}

/// One grid refresh.
///
/// Every part is optional on the wire: on first load the grid usually omits pagination,
/// sorting and filtering altogether, and the data source fills in its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_model: Option<PaginationModel>,
    #[serde(default)]
    pub sort_model: Vec<SortItem>,
    #[serde(default)]
    pub filter_model: FilterModel,
}

impl GridRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u64, page_size: NonZeroU64) -> Self {
        self.pagination_model = Some(PaginationModel::new(page, page_size));
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, sort: SortDirection) -> Self {
        self.sort_model.push(SortItem {
            field: field.into(),
            sort: Some(sort),
        });
        self
    }

    pub fn filter(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.filter_model.items.push(FilterItem {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        });
        self
    }
}

/// A remote record flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Stable identifier of the record, unique across pages.
    pub id: String,
    pub item_type_id: String,
    /// Creator id, or [`crate::record::UNKNOWN_CREATOR`] when the record carries none.
    pub creator: String,
    pub status: Option<String>,
    pub updated_at: Option<String>,
}

/// The response to a [`GridRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub rows: Vec<Row>,
    /// Total number of rows matching the active filters across all pages.
    ///
    /// `None` when the API reported no total and the auxiliary count query is disabled.
    pub row_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    String,
    DateTime,
}

/// Static column metadata consumed by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub field: &'static str,
    pub header_name: &'static str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
}

/// The columns of a [`Row`], in display order.
pub const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: "id",
        header_name: "ID",
        column_type: Some(ColumnType::String),
    },
    ColumnSpec {
        field: "itemTypeId",
        header_name: "Item Type",
        column_type: Some(ColumnType::String),
    },
    ColumnSpec {
        field: "creator",
        header_name: "Author",
        column_type: None,
    },
    ColumnSpec {
        field: "status",
        header_name: "Status",
        column_type: None,
    },
    ColumnSpec {
        field: "updatedAt",
        header_name: "Updated",
        column_type: Some(ColumnType::DateTime),
    },
];

/// First-load state handed to the grid before any request was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialState {
    pub pagination: InitialPagination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPagination {
    pub pagination_model: PaginationModel,
    pub row_count: u64,
}

impl InitialState {
    pub fn new(page_size: NonZeroU64) -> Self {
        Self {
            pagination: InitialPagination {
                pagination_model: PaginationModel::first(page_size),
                row_count: 0,
            },
        }
    }
}
