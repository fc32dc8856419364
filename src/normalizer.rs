//! Best-effort reshaping of arbitrary webhook payloads into chartable records.
//!
//! A payload is classified into one of the [`Shape`] variants by an ordered
//! list of recognizers; the first recognizer whose predicate accepts the value
//! decides how it is turned into [`Record`]s. Normalization is total: a value
//! nobody recognizes, or one nested deeper than [`MAX_DEPTH`], yields an empty
//! sequence ("nothing to chart") instead of an error.

use crate::record::{Record, display_label, is_numeric_like, parse_grouped_number, to_number};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    static ref LABEL_KEY: Regex = Regex::new(r"(?i)month|date|name|label").unwrap();
    static ref PROFIT_KEY: Regex = Regex::new(r"(?i)profit").unwrap();
    static ref YEAR_KEY: Regex = Regex::new(r"(?i)year").unwrap();
    static ref DELIMITED: Regex = Regex::new(r"[,;\n]").unwrap();
    static ref FIELD_SEPARATOR: Regex = Regex::new(r"[,;\t]").unwrap();
    static ref NUMBER_IN_TEXT: Regex = Regex::new(r"-?\d+(?:\.\d+)?").unwrap();
}

/// Keys probed, in priority order, for a collection nested inside an object.
pub const NESTED_COLLECTION_KEYS: [&str; 5] = ["data", "items", "series", "points", "values"];

/// Nesting depth after which a payload is treated as unrecognized.
pub const MAX_DEPTH: usize = 32;

const INDIA_POPULATION: &str = "Population of India";
const WORLD_POPULATION: &str = "World Population";

/// Structural class of a raw payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// `[[...], [...]]`, optionally with a header row
    ArrayOfArrays,
    /// `[1, "2", 3.5]`
    ArrayOfScalars,
    /// `[{...}, {...}]`
    ArrayOfObjects,
    /// `{"data": [...]}` or `{"a": 1, "b": 2}`
    KeyedObject,
    /// CSV-like text
    DelimitedText,
    /// Prose with numbers in it
    FreeText,
    Unrecognized,
}

struct Recognizer {
    shape: Shape,
    matches: fn(&Value) -> bool,
    transform: fn(&Value, usize) -> Vec<Record>,
}

const RECOGNIZERS: [Recognizer; 6] = [
    Recognizer {
        shape: Shape::ArrayOfArrays,
        matches: is_array_of_arrays,
        transform: from_array_of_arrays,
    },
    Recognizer {
        shape: Shape::ArrayOfScalars,
        matches: is_array_of_scalars,
        transform: from_array_of_scalars,
    },
    Recognizer {
        shape: Shape::ArrayOfObjects,
        matches: is_array_of_objects,
        transform: from_array_of_objects,
    },
    Recognizer {
        shape: Shape::KeyedObject,
        matches: is_keyed_object,
        transform: from_keyed_object,
    },
    Recognizer {
        shape: Shape::DelimitedText,
        matches: is_delimited_text,
        transform: from_delimited_text,
    },
    Recognizer {
        shape: Shape::FreeText,
        matches: Value::is_string,
        transform: from_free_text,
    },
];

impl Shape {
    /// Classifies a payload using the same priority order as [`normalize`].
    pub fn classify(value: &Value) -> Shape {
        RECOGNIZERS
            .iter()
            .find(|r| (r.matches)(value))
            .map_or(Shape::Unrecognized, |r| r.shape)
    }
}

/// Reshapes an arbitrary payload into records
///
/// Never fails: unrecognized input produces an empty vector.
pub fn normalize(value: &Value) -> Vec<Record> {
    normalize_at(value, 0)
}

fn normalize_at(value: &Value, depth: usize) -> Vec<Record> {
    if depth > MAX_DEPTH {
        return Vec::new();
    }
    match RECOGNIZERS.iter().find(|r| (r.matches)(value)) {
        Some(recognizer) => {
            debug!("payload recognized as {:?} at depth {}", recognizer.shape, depth);
            (recognizer.transform)(value, depth)
        }
        None => Vec::new(),
    }
}

/// Full dataset pipeline: the year/population mapper first, the general
/// normalizer when the mapper finds nothing.
pub fn normalize_payload(value: &Value) -> Vec<Record> {
    let population = map_year_population(value);
    if !population.is_empty() {
        return population;
    }
    normalize(value)
}

/// Parses a response body as JSON, falling back to the raw text.
pub fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// [`normalize_payload`] over a response body.
pub fn normalize_text(text: &str) -> Vec<Record> {
    normalize_payload(&parse_body(text))
}

fn is_array_of_arrays(value: &Value) -> bool {
    matches!(value, Value::Array(rows) if rows.first().is_some_and(Value::is_array))
}

fn is_array_of_scalars(value: &Value) -> bool {
    matches!(value, Value::Array(items) if !items.is_empty() && items.iter().all(is_numeric_like))
}

fn is_array_of_objects(value: &Value) -> bool {
    matches!(value, Value::Array(rows) if rows.first().is_some_and(Value::is_object))
}

fn is_keyed_object(value: &Value) -> bool {
    match value {
        Value::Object(object) => {
            nested_collection(object).is_some()
                || (!object.is_empty() && object.values().all(is_numeric_like))
        }
        _ => false,
    }
}

fn is_delimited_text(value: &Value) -> bool {
    matches!(value, Value::String(text) if DELIMITED.is_match(text))
}

fn nested_collection(object: &Map<String, Value>) -> Option<&Value> {
    NESTED_COLLECTION_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|nested| nested.is_array() || nested.is_object())
}

fn from_array_of_arrays(value: &Value, _depth: usize) -> Vec<Record> {
    let Value::Array(rows) = value else {
        return Vec::new();
    };
    let header = match rows.first() {
        Some(Value::Array(first)) if rows.len() > 1 => first
            .iter()
            .map(|cell| cell.as_str().map(str::to_string))
            .collect::<Option<Vec<String>>>(),
        _ => None,
    };

    match header {
        Some(header) => from_header_rows(&header, &rows[1..]),
        None => from_positional_rows(rows),
    }
}

fn from_header_rows(header: &[String], rows: &[Value]) -> Vec<Record> {
    let x_index = header
        .iter()
        .position(|h| LABEL_KEY.is_match(h))
        .unwrap_or(0);

    rows.iter()
        .filter_map(Value::as_array)
        .map(|cells| {
            let mut record = Record::new(display_label(cells.get(x_index)));
            for (column, title) in header.iter().enumerate() {
                if column == x_index {
                    continue;
                }
                if let Some(number) = cells.get(column).and_then(to_number) {
                    record.set(title.as_str(), number);
                }
            }
            record
        })
        .collect()
}

fn from_positional_rows(rows: &[Value]) -> Vec<Record> {
    rows.iter()
        .filter_map(Value::as_array)
        .map(|cells| {
            let mut record = Record::new(display_label(cells.first()));
            if let Some(value) = cells.get(1).and_then(to_number) {
                record.set("value", value);
            }
            if let Some(value) = cells.get(2).and_then(to_number) {
                record.set("value2", value);
            }
            record
        })
        .collect()
}

fn from_array_of_scalars(value: &Value, _depth: usize) -> Vec<Record> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(to_number)
        .enumerate()
        .map(|(i, number)| Record::new((i + 1).to_string()).with("value", number))
        .collect()
}

fn from_array_of_objects(value: &Value, _depth: usize) -> Vec<Record> {
    let Value::Array(rows) = value else {
        return Vec::new();
    };
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return Vec::new();
    };
    let objects = rows.iter().filter_map(Value::as_object);

    if first.contains_key("Month") {
        if let Some(profit_key) = first.keys().find(|k| PROFIT_KEY.is_match(k)) {
            return objects
                .map(|row| {
                    Record::new(display_label(row.get("Month")))
                        .with("Profit", parse_grouped_number(row.get(profit_key)))
                })
                .collect();
        }
    }

    let x_key = first
        .iter()
        .find(|(_, v)| v.is_string())
        .map(|(k, _)| k.as_str())
        .or_else(|| first.keys().map(String::as_str).find(|k| LABEL_KEY.is_match(k)))
        .unwrap_or("name");
    let series: Vec<&str> = first
        .iter()
        .filter(|(k, v)| k.as_str() != x_key && is_numeric_like(v))
        .map(|(k, _)| k.as_str())
        .collect();

    objects
        .map(|row| {
            let mut record = Record::new(display_label(row.get(x_key)));
            for key in &series {
                if let Some(number) = row.get(*key).and_then(to_number) {
                    record.set(*key, number);
                }
            }
            record
        })
        .collect()
}

fn from_keyed_object(value: &Value, depth: usize) -> Vec<Record> {
    let Value::Object(object) = value else {
        return Vec::new();
    };
    if let Some(nested) = nested_collection(object) {
        return normalize_at(nested, depth + 1);
    }
    object
        .iter()
        .filter_map(|(key, v)| to_number(v).map(|n| Record::new(key.as_str()).with("value", n)))
        .collect()
}

/// Splits CSV-like text into rows and hands them to the array-of-arrays rule.
///
/// Every field stays a string, so a multi-line text always treats its first
/// line as the header. Numeric cells are coerced later by the row rules.
fn from_delimited_text(value: &Value, depth: usize) -> Vec<Record> {
    let Value::String(text) = value else {
        return Vec::new();
    };
    let rows: Vec<Value> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            Value::Array(
                FIELD_SEPARATOR
                    .split(line)
                    .map(|field| Value::String(field.trim().to_string()))
                    .collect(),
            )
        })
        .collect();
    normalize_at(&Value::Array(rows), depth + 1)
}

fn from_free_text(value: &Value, _depth: usize) -> Vec<Record> {
    let Value::String(text) = value else {
        return Vec::new();
    };
    NUMBER_IN_TEXT
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .enumerate()
        .map(|(i, number)| Record::new((i + 1).to_string()).with("value", number))
        .collect()
}

/// Specialised mapper for year / population datasets
///
/// Applies to an array of objects whose first object has a year-like key and
/// keys containing "Population of India" and "World Population". Produces
/// `{name: <year>, india, world}` records sorted ascending by year. Any other
/// payload yields an empty vector.
pub fn map_year_population(value: &Value) -> Vec<Record> {
    let Value::Array(rows) = value else {
        return Vec::new();
    };
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return Vec::new();
    };
    let find_key = |pred: &dyn Fn(&str) -> bool| first.keys().find(|k| pred(k)).cloned();
    let (Some(year_key), Some(india_key), Some(world_key)) = (
        find_key(&|k| YEAR_KEY.is_match(k)),
        find_key(&|k| k.contains(INDIA_POPULATION)),
        find_key(&|k| k.contains(WORLD_POPULATION)),
    ) else {
        return Vec::new();
    };

    let mut years: Vec<(f64, Record)> = rows
        .iter()
        .filter_map(Value::as_object)
        .map(|row| {
            let year = row.get(&year_key);
            let record = Record::new(display_label(year))
                .with("india", parse_grouped_number(row.get(&india_key)))
                .with("world", parse_grouped_number(row.get(&world_key)));
            (parse_grouped_number(year), record)
        })
        .collect();
    years.sort_by(|a, b| a.0.total_cmp(&b.0));
    years.into_iter().map(|(_, record)| record).collect()
}
