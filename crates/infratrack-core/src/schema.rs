//! Fuzzy field resolution over loosely-typed tabular rows.
//!
//! Spreadsheets arrive with whatever headers the surveyor chose ("StartLat",
//! "Start Latitude", "start_lat "). A [`Record`] is the only typed accessor
//! over such a row: callers ask for a logical field by a list of aliases and
//! get back the first present, non-empty value.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A single cell as read from a sheet, CSV file or HTML table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
}

impl CellValue {
    /// Absent for matching purposes: no value or an empty string
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Lenient numeric reading, 0 when nothing numeric can be recovered
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => parse_numeric_lenient(s),
            CellValue::Bool(_) | CellValue::Empty => 0.0,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Lower-case and drop everything that is not a letter or a digit
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parse numbers out of strings like "1,200 m" or "$50".
///
/// Everything except digits, '.' and '-' is stripped, then the longest
/// numeric prefix is parsed. Unparseable input yields 0.
pub fn parse_numeric_lenient(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let bytes = cleaned.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let mut digits = 0;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    if digits == 0 {
        return 0.0;
    }
    cleaned[..end].parse::<f64>().unwrap_or(0.0)
}

/// One parsed row: original headers in order, plus a normalized lookup
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
    lookup: HashMap<String, usize>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column. A later header normalizing to the same key shadows the earlier one.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        let key = key.into();
        self.lookup.insert(normalize_key(&key), self.fields.len());
        self.fields.push((key, value.into()));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_blank())
    }

    pub fn fields(&self) -> &[(String, CellValue)] {
        &self.fields
    }

    /// First non-blank value among the aliases, in alias order
    pub fn get_fuzzy(&self, aliases: &[&str]) -> Option<&CellValue> {
        aliases.iter().find_map(|alias| {
            let idx = *self.lookup.get(&normalize_key(alias))?;
            let value = &self.fields[idx].1;
            (!value.is_blank()).then_some(value)
        })
    }

    /// Field as text, or `None` when no alias resolves
    pub fn text(&self, aliases: &[&str]) -> Option<String> {
        self.get_fuzzy(aliases).map(|v| v.to_string())
    }

    /// Field as a number, 0 when absent or unparseable
    pub fn number(&self, aliases: &[&str]) -> f64 {
        self.get_fuzzy(aliases).map(CellValue::as_number).unwrap_or(0.0)
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.push(k, v);
        }
        record
    }
}

/// Pair a header row with data rows. Missing headers become `col{i}`.
pub fn records_from_rows(headers: &[String], rows: Vec<Vec<CellValue>>) -> Vec<Record> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(i, value)| {
                    let key = headers
                        .get(i)
                        .filter(|h| !h.trim().is_empty())
                        .cloned()
                        .unwrap_or_else(|| format!("col{}", i));
                    (key, value)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Start_Lat "), "startlat");
        assert_eq!(normalize_key("Start Latitude"), "startlatitude");
        assert_eq!(normalize_key("X-1"), "x1");
        assert_eq!(normalize_key("اسم الخط"), "اسمالخط");
    }

    #[test]
    fn test_get_fuzzy_alias_order() {
        let record: Record = [("Start_Lat ", "21.6"), ("Lat1", "99")].into_iter().collect();
        let v = record.get_fuzzy(&["StartLat", "Start Latitude", "Lat1"]).unwrap();
        assert_eq!(v, &CellValue::Text("21.6".into()));
    }

    #[test]
    fn test_get_fuzzy_skips_blank_values() {
        let record: Record = [("Name", ""), ("Pipe Name", "P-7")].into_iter().collect();
        assert_eq!(record.text(&["Name", "Pipe Name"]).as_deref(), Some("P-7"));
        assert!(record.get_fuzzy(&["Contractor"]).is_none());
    }

    #[test]
    fn test_later_duplicate_header_wins() {
        let record: Record = [("Length", "10"), ("length", "20")].into_iter().collect();
        assert_eq!(record.number(&["LENGTH"]), 20.0);
    }

    #[test]
    fn test_numbers_render_as_text() {
        let mut record = Record::new();
        record.push("Name", 150.0);
        assert_eq!(record.text(&["name"]).as_deref(), Some("150"));
    }

    #[test]
    fn test_parse_numeric_lenient() {
        assert_eq!(parse_numeric_lenient("1,200 m"), 1200.0);
        assert_eq!(parse_numeric_lenient("$50"), 50.0);
        assert_eq!(parse_numeric_lenient("-12.5"), -12.5);
        assert_eq!(parse_numeric_lenient("12.5.3"), 12.5);
        assert_eq!(parse_numeric_lenient(".5"), 0.5);
        assert_eq!(parse_numeric_lenient("n/a"), 0.0);
        assert_eq!(parse_numeric_lenient("--"), 0.0);
        assert_eq!(parse_numeric_lenient(""), 0.0);
    }

    #[test]
    fn test_records_from_rows() {
        let headers = vec!["Name".to_string(), "".to_string()];
        let rows = vec![vec![CellValue::from("A"), CellValue::from(1.0), CellValue::from(2.0)]];
        let records = records_from_rows(&headers, rows);
        assert_eq!(records[0].number(&["col1"]), 1.0);
        assert_eq!(records[0].number(&["col2"]), 2.0);
    }

    fn header_variant() -> impl Strategy<Value = String> {
        // "StartLat" with random casing and separators between characters
        let chars: Vec<char> = "StartLat".chars().collect();
        proptest::collection::vec((any::<bool>(), prop_oneof![Just(""), Just(" "), Just("_"), Just("-"), Just(".")]), chars.len())
            .prop_map(move |choices| {
                chars
                    .iter()
                    .zip(choices)
                    .map(|(c, (upper, sep))| {
                        let c = if upper { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() };
                        format!("{}{}", c, sep)
                    })
                    .collect()
            })
    }

    proptest! {
        #[test]
        fn prop_header_insensitive(header in header_variant(), value in 1.0f64..1000.0) {
            let mut record = Record::new();
            record.push(header, value);
            prop_assert_eq!(record.number(&["StartLat", "Start Latitude"]), value);
        }
    }
}
