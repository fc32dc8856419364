use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Key every record reserves for its display label.
pub const NAME_KEY: &str = "name";

/// One element of a charting sequence
///
/// A record always carries a display label plus zero or more numeric series
/// values. Series keep the order in which they were inserted, and that order
/// is also the order used when the record is serialized.
///
/// On the wire a record is a flat JSON object:
/// `{"name": "Jan", "Sales": 10}`.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Record {
    pub name: String,
    pub fields: Vec<(String, f64)>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Record {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a series value, replacing an existing entry under the same key.
    ///
    /// The `name` key is reserved for the label and is ignored here.
    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        let key = key.into();
        if key == NAME_KEY {
            return;
        }
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| *value)
    }

    /// Series value, or 0 when the record has no such series.
    pub fn value_or_zero(&self, key: &str) -> f64 {
        self.get(key).unwrap_or(0.0)
    }

    pub fn series_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(NAME_KEY, &self.name)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Record::from(&object))
    }
}

impl From<&Map<String, Value>> for Record {
    /// Lenient conversion: the label is stringified, non-numeric entries are dropped.
    fn from(object: &Map<String, Value>) -> Self {
        let mut record = Record::new(display_label(object.get(NAME_KEY)));
        for (key, value) in object {
            if let Some(number) = to_number(value) {
                record.set(key.as_str(), number);
            }
        }
        record
    }
}

/// Parses a string into a finite number
///
/// Surrounding whitespace is ignored. Empty strings and strings that parse
/// to NaN or an infinity are rejected.
pub fn parse_number_str(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Coerces a JSON value into a number when it is numeric-like
///
/// Numeric-like means a finite JSON number, or a string that is non-empty
/// after trimming and parses to a finite number. Booleans, null, arrays and
/// objects are never numeric-like.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_number_str(s),
        _ => None,
    }
}

pub fn is_numeric_like(value: &Value) -> bool {
    to_number(value).is_some()
}

/// Reads a number that may carry thousands separators ("1,234")
///
/// Anything that does not parse yields 0.
pub fn parse_grouped_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|n| n.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => {
            parse_number_str(&s.replace(',', "")).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Stringifies a value for use as a record label
///
/// Strings are used verbatim and whole numbers print without a fractional
/// part. A missing value or null becomes the empty string. Arrays join their
/// elements with commas and objects print as `[object Object]`, the way a
/// browser stringifies them.
pub fn display_label(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{}", f),
            _ => n.to_string(),
        },
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display_label(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_strings_match_std_parse() {
        for text in ["10", " 42 ", "-3.5", "1e3", "+7", "0.25\n"] {
            let expected: f64 = text.trim().parse().unwrap();
            assert_eq!(to_number(&json!(text)), Some(expected), "{:?}", text);
        }
        assert_eq!(to_number(&json!(12.5)), Some(12.5));
    }

    #[test]
    fn rejects_non_numeric_values() {
        for value in [
            json!(""),
            json!("   "),
            json!("NaN"),
            json!("inf"),
            json!("abc"),
            json!("1,234"),
            json!(true),
            json!(null),
            json!([1]),
            json!({"a": 1}),
        ] {
            assert!(!is_numeric_like(&value), "{:?}", value);
        }
    }

    #[test]
    fn grouped_numbers_strip_commas() {
        assert_eq!(parse_grouped_number(Some(&json!("1,234"))), 1234.0);
        assert_eq!(parse_grouped_number(Some(&json!("1,417,492,000"))), 1_417_492_000.0);
        assert_eq!(parse_grouped_number(Some(&json!(55))), 55.0);
        assert_eq!(parse_grouped_number(Some(&json!("n/a"))), 0.0);
        assert_eq!(parse_grouped_number(None), 0.0);
    }

    #[test]
    fn labels_print_whole_numbers_without_fraction() {
        assert_eq!(display_label(Some(&json!(2000))), "2000");
        assert_eq!(display_label(Some(&json!(2000.0))), "2000");
        assert_eq!(display_label(Some(&json!(2.5))), "2.5");
        assert_eq!(display_label(Some(&json!("Jan"))), "Jan");
        assert_eq!(display_label(Some(&json!(null))), "");
        assert_eq!(display_label(None), "");
    }

    #[test]
    fn composite_labels_stringify_like_a_browser() {
        assert_eq!(display_label(Some(&json!([1, "a", [2, 3]]))), "1,a,2,3");
        assert_eq!(display_label(Some(&json!([null, 2.5, true]))), ",2.5,true");
        assert_eq!(display_label(Some(&json!([]))), "");
        assert_eq!(display_label(Some(&json!({"a": 1}))), "[object Object]");
        assert_eq!(display_label(Some(&json!(false))), "false");
    }

    #[test]
    fn set_replaces_and_preserves_order() {
        let mut record = Record::new("Jan").with("b", 1.0).with("a", 2.0);
        record.set("b", 3.0);
        record.set("name", 9.0);
        assert_eq!(record.fields, vec![("b".to_string(), 3.0), ("a".to_string(), 2.0)]);
        assert_eq!(record.value_or_zero("missing"), 0.0);
    }

    #[test]
    fn serializes_as_flat_object() {
        let record = Record::new("Jan").with("Sales", 10.0).with("Cost", 4.5);
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"name":"Jan","Sales":10.0,"Cost":4.5}"#);

        let back: Record = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn deserialization_is_lenient() {
        let record: Record =
            serde_json::from_value(json!({"name": 1990, "india": "12", "note": "x"})).unwrap();
        assert_eq!(record.name, "1990");
        assert_eq!(record.fields, vec![("india".to_string(), 12.0)]);
    }
}
