use super::{FieldPredicates, QueryFilter, RemoteQuery, operator::map_operator};
use crate::grid::{GridRequest, PaginationModel};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, num::NonZeroU64};

/// The `version` parameter sent by default, selecting the latest (draft) state of records.
pub const CURRENT_VERSION: &str = "current";

/// What happens when the grid sends several filters on the same field.
///
/// The remote filter model holds one predicate object per field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMergePolicy {
    /// The last filter on a field replaces the earlier ones.
    #[default]
    Overwrite,
    /// Filters on a field are combined, one predicate per operator. A repeated operator
    /// still keeps only its last value.
    Combine,
}

/// Converts [`GridRequest`]s into [`RemoteQuery`]s.
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    default_page_size: NonZeroU64,
    merge_policy: FilterMergePolicy,
    version: Option<String>,
}

impl QueryTranslator {
    pub fn new(default_page_size: NonZeroU64) -> Self {
        Self {
            default_page_size,
            merge_policy: FilterMergePolicy::default(),
            version: Some(CURRENT_VERSION.to_string()),
        }
    }

    pub fn with_merge_policy(mut self, merge_policy: FilterMergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    /// Sets the `version` parameter. `None` omits it.
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// The pagination of `request`, or the first page when the grid sent none.
    pub fn pagination(&self, request: &GridRequest) -> PaginationModel {
        request
            .pagination_model
            .unwrap_or_else(|| PaginationModel::first(self.default_page_size))
    }

    /// Builds the remote list query for `request`.
    ///
    /// # Arguments
    ///
    /// * `request` - The grid request. Missing pagination, sort or filters get defaults.
    /// * `scope_filter` - Optional collection restriction, sent as `filter[type]`.
    pub fn translate(&self, request: &GridRequest, scope_filter: Option<&str>) -> RemoteQuery {
        let pagination = self.pagination(request);

        RemoteQuery {
            filter: QueryFilter {
                item_type: scope_filter
                    .filter(|scope| !scope.is_empty())
                    .map(str::to_string),
                fields: self.fields(request),
            },
            offset: pagination.offset(),
            limit: pagination.page_size.get(),
            order_by: order_by(request),
            version: self.version.clone(),
        }
    }

    fn fields(&self, request: &GridRequest) -> Option<BTreeMap<String, FieldPredicates>> {
        let mut fields: BTreeMap<String, FieldPredicates> = BTreeMap::new();

        // Items without a value are still being edited in the grid and filter nothing.
        for item in request
            .filter_model
            .items
            .iter()
            .filter(|item| !item.value.is_null())
        {
            let operator = map_operator(&item.operator).to_string();
            let predicates = fields.entry(item.field.clone()).or_default();

            if self.merge_policy == FilterMergePolicy::Overwrite {
                predicates.clear();
            }

            predicates.insert(operator, item.value.clone());
        }

        (!fields.is_empty()).then_some(fields)
    }
}

fn order_by(request: &GridRequest) -> Option<String> {
    let entries: Vec<String> = request
        .sort_model
        .iter()
        .filter_map(|item| {
            let sort = item.sort?;
            Some(format!("{}_{}", item.field, sort.as_remote()))
        })
        .collect();

    (!entries.is_empty()).then(|| entries.join(","))
}
