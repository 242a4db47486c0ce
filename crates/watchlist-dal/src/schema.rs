//! Field contract of watch list entries.
//!
//! Request bodies arrive as loosely typed JSON objects. Functions here check
//! presence, type and length of each field in a single pass, so the caller
//! gets every offending field at once, and turn them into typed values.
//! Stored entries are re-checked by `garde` rules sharing the same limit.

use std::{collections::BTreeMap, fmt::Display};

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{MAX_TEXT_LENGTH, watchlist::WatchlistEntry};

pub const MISSING_FIELD: &str = "Missing data for required field.";
pub const NULL_FIELD: &str = "Field may not be null.";
pub const NOT_STRING: &str = "Not a valid string.";
pub const NOT_INTEGER: &str = "Not a valid integer.";
pub const LONGER_THAN_MAX: &str = "Longer than maximum length 200.";

/// Reasons of validation failure grouped by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(reason.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, reasons) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, reasons.join(" "))?;
        }
        Ok(())
    }
}

impl From<garde::Report> for FieldErrors {
    fn from(report: garde::Report) -> Self {
        let mut errors = FieldErrors::new();
        for (path, error) in report.iter() {
            let field = path.to_string();
            let field = if field.is_empty() {
                "_schema".to_string()
            } else {
                field
            };
            errors.add(field, error.message());
        }
        errors
    }
}

/// Validated payload for a new entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewWatchlistEntry {
    pub original_title: String,
    pub overview: String,
    pub genres: String,
    pub popularity: i64,
    pub release_date: String,
    pub poster_path: String,
    pub review: String,
}

/// Validated changes to an existing entry, `None` means field is left as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistPatch {
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub genres: Option<String>,
    pub popularity: Option<i64>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub review: Option<Option<String>>,
}

fn is_too_long(value: &str) -> bool {
    value.chars().count() > MAX_TEXT_LENGTH
}

#[allow(clippy::ptr_arg)]
pub(crate) fn text_length(value: &String, _ctx: &()) -> garde::Result {
    if is_too_long(value) {
        Err(garde::Error::new(LONGER_THAN_MAX))
    } else {
        Ok(())
    }
}

pub(crate) fn optional_text_length(value: &Option<String>, ctx: &()) -> garde::Result {
    match value {
        Some(text) => text_length(text, ctx),
        None => Ok(()),
    }
}

impl WatchlistPatch {
    pub fn is_empty(&self) -> bool {
        *self == WatchlistPatch::default()
    }

    /// Merges changes into entry, fields not present in patch keep their values
    pub fn apply_to(self, entry: &mut WatchlistEntry) {
        if let Some(original_title) = self.original_title {
            entry.original_title = original_title;
        }
        if let Some(overview) = self.overview {
            entry.overview = overview;
        }
        if let Some(genres) = self.genres {
            entry.genres = genres;
        }
        if let Some(popularity) = self.popularity {
            entry.popularity = popularity;
        }
        if let Some(release_date) = self.release_date {
            entry.release_date = release_date;
        }
        if let Some(poster_path) = self.poster_path {
            entry.poster_path = poster_path;
        }
        if let Some(review) = self.review {
            entry.review = review;
        }
    }
}

type Conversion<T> = fn(&Value) -> Result<T, &'static str>;

fn as_string(value: &Value) -> Result<String, &'static str> {
    value.as_str().map(str::to_string).ok_or(NOT_STRING)
}

fn as_text(value: &Value) -> Result<String, &'static str> {
    let text = as_string(value)?;
    if is_too_long(&text) {
        Err(LONGER_THAN_MAX)
    } else {
        Ok(text)
    }
}

// Integral floats and numeric strings are accepted as well
fn as_integer(value: &Value) -> Result<i64, &'static str> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or(NOT_INTEGER)
}

struct FieldReader<'a> {
    data: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    fn new(data: &'a Map<String, Value>) -> Self {
        Self {
            data,
            errors: FieldErrors::new(),
        }
    }

    fn convert<T>(&mut self, name: &str, value: &Value, conversion: Conversion<T>) -> Option<T> {
        match conversion(value) {
            Ok(v) => Some(v),
            Err(reason) => {
                self.errors.add(name, reason);
                None
            }
        }
    }

    fn required<T>(&mut self, name: &str, conversion: Conversion<T>) -> Option<T> {
        let data = self.data;
        match data.get(name) {
            None => {
                self.errors.add(name, MISSING_FIELD);
                None
            }
            Some(Value::Null) => {
                self.errors.add(name, NULL_FIELD);
                None
            }
            Some(value) => self.convert(name, value, conversion),
        }
    }

    /// Absent and null are both `None`
    fn optional<T>(&mut self, name: &str, conversion: Conversion<T>) -> Option<T> {
        let data = self.data;
        match data.get(name) {
            None | Some(Value::Null) => None,
            Some(value) => self.convert(name, value, conversion),
        }
    }

    /// Null is rejected, absent is `None`
    fn not_null<T>(&mut self, name: &str, conversion: Conversion<T>) -> Option<T> {
        let data = self.data;
        match data.get(name) {
            None => None,
            Some(Value::Null) => {
                self.errors.add(name, NULL_FIELD);
                None
            }
            Some(value) => self.convert(name, value, conversion),
        }
    }

    /// Absent is `None`, null is `Some(None)`
    fn nullable<T>(&mut self, name: &str, conversion: Conversion<T>) -> Option<Option<T>> {
        let data = self.data;
        match data.get(name) {
            None => None,
            Some(Value::Null) => Some(None),
            Some(value) => self.convert(name, value, conversion).map(Some),
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, FieldErrors> {
        match value {
            Some(value) => self.errors.into_result(value),
            None => Err(self.errors),
        }
    }
}

fn truncate_chars(s: String, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s,
    }
}

/// Checks body of create request.
///
/// All required fields must be present with proper types, unknown fields are ignored.
/// On success `overview` is cut to maximum length and `review` is always empty,
/// as new entries are never reviewed yet.
pub fn validate_create(data: &Map<String, Value>) -> Result<NewWatchlistEntry, FieldErrors> {
    let mut reader = FieldReader::new(data);
    // id is generated by database, it's only checked for type
    let _id = reader.optional("id", as_integer);
    let original_title = reader.required("original_title", as_text);
    // overview is truncated, not rejected
    let overview = reader.required("overview", as_string);
    let genres = reader.required("genres", as_text);
    let popularity = reader.required("popularity", as_integer);
    let release_date = reader.required("release_date", as_text);
    let poster_path = reader.required("poster_path", as_text);
    let _review = reader.optional("review", as_text);

    let entry = match (
        original_title,
        overview,
        genres,
        popularity,
        release_date,
        poster_path,
    ) {
        (
            Some(original_title),
            Some(overview),
            Some(genres),
            Some(popularity),
            Some(release_date),
            Some(poster_path),
        ) => Some(NewWatchlistEntry {
            original_title,
            overview: truncate_chars(overview, MAX_TEXT_LENGTH),
            genres,
            popularity,
            release_date,
            poster_path,
            review: String::new(),
        }),
        _ => None,
    };
    reader.finish(entry)
}

/// Checks body of update request.
///
/// Only known fields are taken, anything else (including `id`, which never changes) is ignored.
pub fn validate_patch(data: &Map<String, Value>) -> Result<WatchlistPatch, FieldErrors> {
    let mut reader = FieldReader::new(data);
    let patch = WatchlistPatch {
        original_title: reader.not_null("original_title", as_text),
        overview: reader.not_null("overview", as_text),
        genres: reader.not_null("genres", as_text),
        popularity: reader.not_null("popularity", as_integer),
        release_date: reader.not_null("release_date", as_text),
        poster_path: reader.not_null("poster_path", as_text),
        review: reader.nullable("review", as_text),
    };
    reader.finish(Some(patch))
}

/// Consistency check of already stored entry
pub fn validate_stored(entry: &WatchlistEntry) -> Result<(), FieldErrors> {
    entry.validate().map_err(FieldErrors::from)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("Not an object"),
        }
    }

    fn movie() -> Map<String, Value> {
        object(json!({
            "original_title": "Stalker",
            "overview": "A guide leads two men through the Zone.",
            "genres": "Drama, Science Fiction",
            "popularity": 42,
            "release_date": "1979-05-25",
            "poster_path": "/stalker.jpg"
        }))
    }

    fn entry() -> WatchlistEntry {
        WatchlistEntry {
            id: 7,
            original_title: "Solaris".into(),
            overview: "Psychologist is sent to a space station.".into(),
            genres: "Drama".into(),
            popularity: 10,
            release_date: "1972-03-20".into(),
            poster_path: "/solaris.jpg".into(),
            review: None,
        }
    }

    #[test]
    fn test_valid_create() {
        let mut data = movie();
        data.insert("review".into(), json!("Should be ignored"));
        data.insert("unknown".into(), json!(true));
        let new_entry = validate_create(&data).unwrap();
        assert_eq!(new_entry.original_title, "Stalker");
        assert_eq!(new_entry.popularity, 42);
        assert_eq!(new_entry.review, "");
    }

    #[test]
    fn test_create_collects_all_errors() {
        let mut data = movie();
        data.remove("genres");
        data.insert("popularity".into(), json!("very"));
        data.insert("poster_path".into(), Value::Null);
        data.insert("original_title".into(), json!(123));

        let errors = validate_create(&data).unwrap_err();
        assert_eq!(errors.get("genres").unwrap(), [MISSING_FIELD]);
        assert_eq!(errors.get("popularity").unwrap(), [NOT_INTEGER]);
        assert_eq!(errors.get("poster_path").unwrap(), [NULL_FIELD]);
        assert_eq!(errors.get("original_title").unwrap(), [NOT_STRING]);
        assert_eq!(errors.fields().count(), 4);
    }

    #[test]
    fn test_create_empty_body() {
        let errors = validate_create(&Map::new()).unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(
            fields,
            [
                "genres",
                "original_title",
                "overview",
                "popularity",
                "poster_path",
                "release_date"
            ]
        );
    }

    #[test]
    fn test_create_checks_optional_types() {
        let mut data = movie();
        data.insert("id".into(), json!("abc"));
        data.insert("review".into(), json!(5));
        let errors = validate_create(&data).unwrap_err();
        assert_eq!(errors.get("id").unwrap(), [NOT_INTEGER]);
        assert_eq!(errors.get("review").unwrap(), [NOT_STRING]);
    }

    #[test]
    fn test_integer_coercion() {
        for (value, expected) in [
            (json!(7), Some(7)),
            (json!(7.0), Some(7)),
            (json!("12"), Some(12)),
            (json!(7.5), None),
            (json!(true), None),
            (json!("seven"), None),
        ] {
            let mut data = movie();
            data.insert("popularity".into(), value.clone());
            let res = validate_create(&data);
            match expected {
                Some(n) => assert_eq!(res.unwrap().popularity, n, "value {value}"),
                None => assert!(res.is_err(), "value {value}"),
            }
        }
    }

    #[test]
    fn test_overview_is_truncated() {
        let mut data = movie();
        let long = "ž".repeat(250);
        data.insert("overview".into(), json!(long));
        let new_entry = validate_create(&data).unwrap();
        assert_eq!(new_entry.overview.chars().count(), MAX_TEXT_LENGTH);
    }

    #[test]
    fn test_too_long_title() {
        let mut data = movie();
        data.insert("original_title".into(), json!("x".repeat(201)));
        let errors = validate_create(&data).unwrap_err();
        assert_eq!(errors.get("original_title").unwrap(), [LONGER_THAN_MAX]);
        assert_eq!(errors.fields().count(), 1);
    }

    #[test]
    fn test_length_reported_with_other_errors() {
        let mut data = movie();
        data.remove("genres");
        data.insert("original_title".into(), json!("x".repeat(201)));
        data.insert("review".into(), json!("r".repeat(201)));
        let errors = validate_create(&data).unwrap_err();
        assert_eq!(errors.get("genres").unwrap(), [MISSING_FIELD]);
        assert_eq!(errors.get("original_title").unwrap(), [LONGER_THAN_MAX]);
        assert_eq!(errors.get("review").unwrap(), [LONGER_THAN_MAX]);
        assert_eq!(errors.fields().count(), 3);
    }

    #[test]
    fn test_patch_only_known_fields() {
        let data = object(json!({"review": "Great film", "id": 999, "director": "Tarkovsky"}));
        let patch = validate_patch(&data).unwrap();
        assert_eq!(
            patch,
            WatchlistPatch {
                review: Some(Some("Great film".into())),
                ..Default::default()
            }
        );

        let mut e = entry();
        let original = e.clone();
        patch.apply_to(&mut e);
        assert_eq!(e.review.as_deref(), Some("Great film"));
        assert_eq!(e.id, original.id);
        assert_eq!(e.original_title, original.original_title);
        assert_eq!(e.popularity, original.popularity);
    }

    #[test]
    fn test_patch_rejects_wrong_types() {
        let data = object(json!({"popularity": "not-a-number", "genres": null, "overview": "ok"}));
        let errors = validate_patch(&data).unwrap_err();
        assert_eq!(errors.get("popularity").unwrap(), [NOT_INTEGER]);
        assert_eq!(errors.get("genres").unwrap(), [NULL_FIELD]);
        assert!(errors.get("overview").is_none());
    }

    #[test]
    fn test_patch_clears_review() {
        let data = object(json!({"review": null}));
        let patch = validate_patch(&data).unwrap();
        let mut e = entry();
        e.review = Some("Meh".into());
        patch.apply_to(&mut e);
        assert_eq!(e.review, None);
    }

    #[test]
    fn test_patch_review_too_long() {
        let data = object(json!({"review": "a".repeat(201)}));
        let errors = validate_patch(&data).unwrap_err();
        assert_eq!(errors.get("review").unwrap(), [LONGER_THAN_MAX]);
    }

    #[test]
    fn test_patch_length_reported_with_type_errors() {
        let data = object(json!({"popularity": "lots", "genres": "g".repeat(201)}));
        let errors = validate_patch(&data).unwrap_err();
        assert_eq!(errors.get("popularity").unwrap(), [NOT_INTEGER]);
        assert_eq!(errors.get("genres").unwrap(), [LONGER_THAN_MAX]);
    }

    #[test]
    fn test_empty_patch() {
        let patch = validate_patch(&Map::new()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_stored_entry() {
        assert!(validate_stored(&entry()).is_ok());
        let mut e = entry();
        e.genres = "g".repeat(300);
        e.review = Some("r".repeat(201));
        let errors = validate_stored(&e).unwrap_err();
        assert_eq!(errors.get("genres").unwrap(), [LONGER_THAN_MAX]);
        assert_eq!(errors.get("review").unwrap(), [LONGER_THAN_MAX]);
    }

    #[test]
    fn test_errors_serialization() {
        let mut errors = FieldErrors::new();
        errors.add("genres", MISSING_FIELD);
        errors.add("popularity", NOT_INTEGER);
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            value,
            json!({"genres": [MISSING_FIELD], "popularity": [NOT_INTEGER]})
        );
    }
}
