use std::fmt;

/// The opaque key a record is indexed under in Sonic.
///
/// Sonic stores object identifiers as strings, so every key is kept in its
/// string form. Integer keys are rendered in decimal, which means a record
/// keyed `1` matches the identifier `"1"` coming back from a query.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty identifier Sonic clients use to mean "no match".
    pub fn is_sentinel(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

macro_rules! record_id_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RecordId {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

record_id_from_int!(u32, u64, i32, i64, usize);

/// Identifiers returned by a query, best match first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    ids: Vec<RecordId>,
}

impl SearchHits {
    /// Build from the raw strings a search channel returns.
    ///
    /// Empty strings are dropped: the client reports "no matches" as a
    /// single empty identifier, and an empty key can never name a record.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = raw
            .into_iter()
            .map(|s| RecordId::new(s))
            .filter(|id| !id.is_sentinel())
            .collect();
        Self { ids }
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    pub fn into_ids(self) -> Vec<RecordId> {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<T: Into<RecordId>> FromIterator<T> for SearchHits {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let ids = iter
            .into_iter()
            .map(Into::into)
            .filter(|id: &RecordId| !id.is_sentinel())
            .collect();
        Self { ids }
    }
}
