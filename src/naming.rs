//! Collection and bucket naming.
//!
//! Every record type lives in its own bucket, named after the type, inside a
//! collection named after the pluralized type: `SearchableModel` records are
//! pushed to collection `SearchableModels`, bucket `SearchableModel`.

use crate::searchable::Searchable;

/// The (collection, bucket) pair a record type is indexed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub collection: String,
    pub bucket: String,
}

impl Namespace {
    pub fn for_bucket(bucket: &str) -> Self {
        Self {
            collection: pluralize(bucket),
            bucket: bucket.to_string(),
        }
    }

    pub fn of<R: Searchable + ?Sized>(record: &R) -> Self {
        Self::for_bucket(&record.searchable_as())
    }
}

const UNCOUNTABLE: &[&str] = &[
    "audio",
    "data",
    "deer",
    "equipment",
    "feedback",
    "fish",
    "hardware",
    "information",
    "metadata",
    "money",
    "news",
    "police",
    "rice",
    "series",
    "sheep",
    "software",
    "species",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("criterion", "criteria"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

const F_TO_VES: &[&str] =
    &["calf", "half", "leaf", "loaf", "self", "shelf", "thief", "wolf"];
const FE_TO_VES: &[&str] = &["knife", "life", "wife"];
const O_TO_OES: &[&str] = &["echo", "hero", "potato", "tomato", "veto"];
const IS_TO_ES: &[&str] = &[
    "analysis",
    "axis",
    "basis",
    "crisis",
    "diagnosis",
    "emphasis",
    "hypothesis",
    "oasis",
    "parenthesis",
    "synopsis",
    "thesis",
];

/// English plural of `word`.
///
/// Only the last CamelCase or `_`/`-` separated segment is inflected, so
/// `OrderItem` becomes `OrderItems` and `blog_person` becomes `blog_people`.
/// The case of the segment is carried over to the suffix.
///
/// # Examples
///
/// ```
/// use sonic_scout::naming::pluralize;
///
/// assert_eq!(pluralize("SearchableModel"), "SearchableModels");
/// assert_eq!(pluralize("Category"), "Categories");
/// assert_eq!(pluralize("Person"), "People");
/// ```
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let start = last_segment_start(word);
    let (head, segment) = word.split_at(start);
    if segment.is_empty() {
        return word.to_string();
    }

    let lower = segment.to_ascii_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    if let Some((_, plural)) = IRREGULAR.iter().find(|(one, _)| *one == lower)
    {
        return format!("{head}{}", match_case(segment, plural));
    }

    let (strip, suffix) = suffix_rule(&lower);
    let stem = &segment[..segment.len() - strip];
    let suffix = if is_shouting(segment) {
        suffix.to_ascii_uppercase()
    } else {
        suffix.to_string()
    };

    format!("{head}{stem}{suffix}")
}

/// Bytes to strip from the end of the segment and the suffix to append.
fn suffix_rule(lower: &str) -> (usize, &'static str) {
    if FE_TO_VES.contains(&lower) {
        return (2, "ves");
    }
    if F_TO_VES.contains(&lower) {
        return (1, "ves");
    }
    if O_TO_OES.contains(&lower) {
        return (0, "es");
    }
    if IS_TO_ES.contains(&lower) {
        return (2, "es");
    }

    let bytes = lower.as_bytes();
    let last = bytes[bytes.len() - 1];
    let before = bytes.len().checked_sub(2).map(|i| bytes[i]);

    if last == b'y' && before.is_some_and(|b| !is_vowel(b)) {
        return (1, "ies");
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return (0, "es");
    }
    (0, "s")
}

fn last_segment_start(word: &str) -> usize {
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (i, c) in word.char_indices() {
        match prev {
            Some('_' | '-' | ' ') => start = i,
            Some(p) if c.is_uppercase() && (p.is_lowercase() || p.is_numeric()) => {
                start = i;
            }
            _ => {}
        }
        prev = Some(c);
    }

    start
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn is_shouting(segment: &str) -> bool {
    segment.chars().count() > 1
        && segment.chars().any(char::is_alphabetic)
        && !segment.chars().any(char::is_lowercase)
}

fn match_case(template: &str, replacement: &str) -> String {
    if is_shouting(template) {
        return replacement.to_ascii_uppercase();
    }
    let mut chars = replacement.chars();
    match (template.chars().next(), chars.next()) {
        (Some(t), Some(first)) if t.is_uppercase() => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => replacement.to_string(),
    }
}
