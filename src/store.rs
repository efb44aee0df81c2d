use crate::{error::Result, query::SearchQuery, record_id::RecordId};

/// Where records are loaded from once Sonic has named them.
///
/// Implementations may return rows in any order, extra rows, or fewer rows
/// than asked for (e.g. soft-deleted records); the engine reconciles the
/// batch against the ranked identifiers. Errors are passed to the caller
/// untouched.
pub trait RecordStore<R> {
    fn fetch_by_ids(
        &self,
        query: &SearchQuery,
        ids: &[RecordId],
    ) -> Result<Vec<R>>;
}

impl<R, F> RecordStore<R> for F
where
    F: Fn(&SearchQuery, &[RecordId]) -> Result<Vec<R>>,
{
    fn fetch_by_ids(
        &self,
        query: &SearchQuery,
        ids: &[RecordId],
    ) -> Result<Vec<R>> {
        self(query, ids)
    }
}
