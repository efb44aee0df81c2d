use serde_json::Value;

use crate::record_id::RecordId;

/// What a record contributes to the index.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchableData {
    /// Nothing to index; the record is skipped on update.
    Empty,
    /// Text pushed verbatim.
    Text(String),
    /// Field values joined with single spaces before pushing.
    Fields(Vec<Value>),
}

impl SearchableData {
    /// Render the text Sonic should index, or `None` when there is nothing
    /// to push.
    ///
    /// Strings are used unquoted, numbers and booleans in their JSON form,
    /// and nulls are left out. Nested arrays and objects are rendered as
    /// JSON.
    pub fn to_text(&self) -> Option<String> {
        let text = match self {
            Self::Empty => return None,
            Self::Text(text) => text.clone(),
            Self::Fields(values) => values
                .iter()
                .filter_map(render_value)
                .collect::<Vec<_>>()
                .join(" "),
        };

        (!text.is_empty()).then_some(text)
    }
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl From<&str> for SearchableData {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SearchableData {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<Value>> for SearchableData {
    fn from(values: Vec<Value>) -> Self {
        Self::Fields(values)
    }
}

/// A record type the engine can index, search and filter.
pub trait Searchable {
    /// Key the record is pushed under and matched against query results.
    fn scout_key(&self) -> RecordId;

    /// Name of the Sonic bucket for this record type, usually the type
    /// name. The collection is derived from it by pluralizing.
    fn searchable_as(&self) -> String;

    fn to_searchable_data(&self) -> SearchableData;

    /// Locale passed with every push, e.g. `eng` or `none` to disable
    /// stopword handling. `None` lets Sonic detect it.
    fn sonic_locale(&self) -> Option<String> {
        None
    }

    /// Attribute lookup used to apply `where` filters after fetching.
    fn attribute(&self, name: &str) -> Option<Value>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fields_are_joined_with_spaces() {
        let data = SearchableData::Fields(vec![
            json!(1),
            json!("searchable model"),
        ]);
        assert_eq!(data.to_text().as_deref(), Some("1 searchable model"));
    }

    #[test]
    fn nulls_are_skipped() {
        let data = SearchableData::Fields(vec![
            json!("hello@example.com"),
            Value::Null,
            json!(true),
        ]);
        assert_eq!(data.to_text().as_deref(), Some("hello@example.com true"));
    }

    #[test]
    fn empty_inputs_have_no_text() {
        assert_eq!(SearchableData::Empty.to_text(), None);
        assert_eq!(SearchableData::Text(String::new()).to_text(), None);
        assert_eq!(SearchableData::Fields(vec![]).to_text(), None);
        assert_eq!(SearchableData::Fields(vec![Value::Null]).to_text(), None);
    }

    #[test]
    fn text_is_passed_through() {
        let data = SearchableData::from("already flattened");
        assert_eq!(data.to_text().as_deref(), Some("already flattened"));
    }
}
