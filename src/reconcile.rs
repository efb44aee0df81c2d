use std::collections::{BTreeMap, HashMap};

use serde_json::{Number, Value};

use crate::{
    record_id::{RecordId, SearchHits},
    searchable::Searchable,
};

/// Reconcile a fetched batch of records against Sonic's ranked identifiers.
///
/// 1. Drop records whose key is not among `hits`
/// 2. Drop records failing any of `filters` (attribute equality, ANDed)
/// 3. Order the rest by their rank in `hits`
///
/// When an identifier is ranked more than once, its first (best) position
/// is used. Identifiers with no fetched record are skipped.
pub fn reconcile<R: Searchable>(
    hits: &SearchHits,
    fetched: Vec<R>,
    filters: &BTreeMap<String, Value>,
) -> Vec<R> {
    if hits.is_empty() {
        return Vec::new();
    }

    let mut positions: HashMap<&RecordId, usize> =
        HashMap::with_capacity(hits.len());
    for (rank, id) in hits.ids().iter().enumerate() {
        positions.entry(id).or_insert(rank);
    }

    let mut kept: Vec<(usize, R)> = fetched
        .into_iter()
        .filter_map(|record| {
            let rank = *positions.get(&record.scout_key())?;
            matches_filters(&record, filters).then_some((rank, record))
        })
        .collect();

    kept.sort_by_key(|(rank, _)| *rank);
    kept.into_iter().map(|(_, record)| record).collect()
}

/// True when `record` satisfies every `attribute == value` pair.
///
/// A record without the attribute never matches.
pub fn matches_filters<R: Searchable + ?Sized>(
    record: &R,
    filters: &BTreeMap<String, Value>,
) -> bool {
    filters.iter().all(|(attribute, expected)| {
        record
            .attribute(attribute)
            .is_some_and(|actual| loosely_equal(&actual, expected))
    })
}

/// Loose equality, as record attributes are compared by the host framework
/// (PHP 8 `==`):
///
/// - identical values are equal
/// - numbers, and strings spelling numbers, compare by numeric value, so
///   `1 == "1"` and `"1" == "01"`; integers compare exactly
/// - a number and a non-numeric string compare as strings
/// - a boolean equals anything with the same truthiness (`true == 1`)
/// - null equals `""` and anything falsy
pub fn loosely_equal(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }

    match (left, right) {
        (Value::Bool(b), other) | (other, Value::Bool(b)) => {
            *b == is_truthy(other)
        }
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => {
            s.is_empty()
        }
        (Value::Null, other) | (other, Value::Null) => !is_truthy(other),
        (Value::Number(a), Value::Number(b)) => {
            numeric_eq(Numeric::from_number(a), Numeric::from_number(b))
        }
        (Value::Number(n), Value::String(s))
        | (Value::String(s), Value::Number(n)) => match Numeric::parse(s) {
            Some(parsed) => numeric_eq(Numeric::from_number(n), parsed),
            None => n.to_string() == *s,
        },
        (Value::String(a), Value::String(b)) => {
            match (Numeric::parse(a), Numeric::parse(b)) {
                (Some(a), Some(b)) => numeric_eq(a, b),
                _ => false,
            }
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i128),
    Float(f64),
}

impl Numeric {
    fn from_number(number: &Number) -> Self {
        if let Some(n) = number.as_i64() {
            Self::Int(n.into())
        } else if let Some(n) = number.as_u64() {
            Self::Int(n.into())
        } else {
            Self::Float(number.as_f64().unwrap_or(f64::NAN))
        }
    }

    /// Numeric strings allow surrounding whitespace, a sign, a fraction and
    /// an exponent. `inf` and `nan` are not numbers here.
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let valid = text.bytes().any(|b| b.is_ascii_digit())
            && text.bytes().all(|b| {
                b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-')
            });
        if !valid {
            return None;
        }
        if let Ok(n) = text.parse::<i128>() {
            return Some(Self::Int(n));
        }
        text.parse::<f64>().ok().map(Self::Float)
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Float(f) => f,
        }
    }
}

fn numeric_eq(left: Numeric, right: Numeric) -> bool {
    match (left, right) {
        (Numeric::Int(a), Numeric::Int(b)) => a == b,
        (a, b) => a.as_f64() == b.as_f64(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => Numeric::from_number(n).as_f64() != 0.0,
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}
