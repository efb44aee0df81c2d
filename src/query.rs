use std::collections::BTreeMap;

use serde_json::Value;

use crate::{naming::Namespace, searchable::Searchable};

/// A search request against one record type.
///
/// Sonic only understands free text, so `wheres` are carried along and
/// applied to the fetched records afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Bucket name of the record type being searched.
    pub entity: String,
    pub query: String,
    pub limit: Option<usize>,
    pub wheres: BTreeMap<String, Value>,
}

impl SearchQuery {
    pub fn new(entity: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            query: query.into(),
            limit: None,
            wheres: BTreeMap::new(),
        }
    }

    /// Search the record type `model` belongs to.
    pub fn for_model<R: Searchable + ?Sized>(
        model: &R,
        query: impl Into<String>,
    ) -> Self {
        Self::new(model.searchable_as(), query)
    }

    /// Limit the number of identifiers Sonic returns.
    pub fn take(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Require `attribute == value` on every returned record.
    pub fn where_eq(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.wheres.insert(attribute.into(), value.into());
        self
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::for_bucket(&self.entity)
    }
}
