//! # Remote Records
//!
//! The record API returns the same logical record in two shapes depending on the endpoint:
//!
//! 1. **Embedded**: references are resolved inline.
//!    `{ "id": "...", "item_type": { "id": "..." }, "creator": { "id": "..." }, "meta": {...} }`
//! 2. **Relationship**: a JSON:API resource object.
//!    `{ "id": "...", "relationships": { "item_type": { "data": { "id": "..." } }, ... }, "meta": {...} }`
//!
//! [`RemoteRecord::from_value`] inspects what a record exposes to pick its shape, and
//! [`RemoteRecord::to_row`] flattens either shape into the same [`Row`].
use crate::grid::Row;
use serde::Deserialize;
use serde_json::Value;

/// Creator shown for records without a creator reference.
pub const UNKNOWN_CREATOR: &str = "Unknown";

/// A record that matches neither known shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Record '{}' has an unexpected shape: {reason}", .id.as_deref().unwrap_or("<no id>"))]
pub struct ShapeMismatch {
    pub id: Option<String>,
    pub reason: String,
}

impl ShapeMismatch {
    fn new(id: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }
}

/// A typed pointer to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reference {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordMeta {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmbeddedRecord {
    pub id: String,
    pub item_type: Reference,
    #[serde(default)]
    pub creator: Option<Reference>,
    #[serde(default)]
    pub meta: RecordMeta,
}

/// A JSON:API relationship whose target must be present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Relationship {
    pub data: Reference,
}

/// A JSON:API relationship whose target may be `null`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OptionalRelationship {
    #[serde(default)]
    pub data: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Relationships {
    pub item_type: Relationship,
    #[serde(default)]
    pub creator: Option<OptionalRelationship>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationshipRecord {
    pub id: String,
    pub relationships: Relationships,
    #[serde(default)]
    pub meta: RecordMeta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRecord {
    Embedded(EmbeddedRecord),
    Relationship(RelationshipRecord),
}

impl RemoteRecord {
    /// Decodes a record, choosing the shape from what the record exposes.
    ///
    /// A `relationships` object selects the relationship shape; otherwise an `item_type`
    /// object selects the embedded shape. The chosen shape must decode on its own; fields of
    /// the other shape are never used to complete it.
    pub fn from_value(value: &Value) -> Result<Self, ShapeMismatch> {
        let id = value.get("id").and_then(Value::as_str).map(str::to_string);

        let Some(object) = value.as_object() else {
            return Err(ShapeMismatch::new(id, "record is not a JSON object"));
        };

        if object.get("relationships").is_some_and(Value::is_object) {
            RelationshipRecord::deserialize(value)
                .map(RemoteRecord::Relationship)
                .map_err(|err| {
                    ShapeMismatch::new(id, format!("invalid relationship record: {err}"))
                })
        } else if object.get("item_type").is_some_and(Value::is_object) {
            EmbeddedRecord::deserialize(value)
                .map(RemoteRecord::Embedded)
                .map_err(|err| ShapeMismatch::new(id, format!("invalid embedded record: {err}")))
        } else {
            Err(ShapeMismatch::new(
                id,
                "record has neither a `relationships` object nor an embedded `item_type`",
            ))
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RemoteRecord::Embedded(record) => &record.id,
            RemoteRecord::Relationship(record) => &record.id,
        }
    }

    /// Flattens the record into a grid row.
    pub fn to_row(&self) -> Row {
        let (item_type, creator, meta) = match self {
            RemoteRecord::Embedded(record) => {
                (&record.item_type, record.creator.as_ref(), &record.meta)
            }
            RemoteRecord::Relationship(record) => (
                &record.relationships.item_type.data,
                record
                    .relationships
                    .creator
                    .as_ref()
                    .and_then(|creator| creator.data.as_ref()),
                &record.meta,
            ),
        };

        Row {
            id: self.id().to_string(),
            item_type_id: item_type.id.clone(),
            // TODO: tell creator kinds (account, user, access token) apart once the grid
            // has a column for them.
            creator: creator
                .map(|creator| creator.id.clone())
                .unwrap_or_else(|| UNKNOWN_CREATOR.to_string()),
            status: meta.status.clone(),
            updated_at: meta.updated_at.clone(),
        }
    }
}

/// Decodes and flattens every record of a listing.
///
/// The first record with an unexpected shape aborts the whole page.
pub fn to_rows(records: &[Value]) -> Result<Vec<Row>, ShapeMismatch> {
    records
        .iter()
        .map(|value| RemoteRecord::from_value(value).map(|record| record.to_row()))
        .collect()
}
