//! Collection contract and the in-memory JSON adapter.
//!
//! The engine hands over a compiled predicate tree; translating its
//! canonical operations into a storage-native form is entirely the
//! collection's business. `MemoryCollection` is the reference
//! implementation over JSON records.

use filter_expr::{Comparison, FieldPath, Predicate, PredicateOp, Value};
use serde_json::Value as Json;
use std::cmp::Ordering;

/// A collection that can narrow itself with a compiled predicate tree.
pub trait Filterable: Sized {
    fn apply_predicate(self, predicate: &Predicate) -> Self;
}

/// An in-memory collection of JSON records.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    records: Vec<Json>,
}

impl MemoryCollection {
    pub fn new(records: Vec<Json>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Json] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Json> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Filterable for MemoryCollection {
    fn apply_predicate(mut self, predicate: &Predicate) -> Self {
        self.records.retain(|record| matches(record, predicate));
        self
    }
}

fn matches(record: &Json, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Or(children) => children.iter().any(|child| matches(record, child)),
        Predicate::And(children) => children.iter().all(|child| matches(record, child)),
        Predicate::Leaf(comparison) => leaf_matches(record, comparison) != comparison.negate,
    }
}

fn leaf_matches(record: &Json, comparison: &Comparison) -> bool {
    let actual = lookup(record, &comparison.field);
    let expected = &comparison.value;
    match comparison.op {
        PredicateOp::Equals => actual.map_or(false, |a| value_eq(a, expected)),
        PredicateOp::Less => order(actual, expected).map_or(false, Ordering::is_lt),
        PredicateOp::LessEqual => order(actual, expected).map_or(false, Ordering::is_le),
        PredicateOp::Greater => order(actual, expected).map_or(false, Ordering::is_gt),
        PredicateOp::GreaterEqual => order(actual, expected).map_or(false, Ordering::is_ge),
        PredicateOp::Contains => strings(actual, expected).map_or(false, |(a, b)| a.contains(&b)),
        PredicateOp::StartsWith => {
            strings(actual, expected).map_or(false, |(a, b)| a.starts_with(&b))
        }
        PredicateOp::EndsWith => strings(actual, expected).map_or(false, |(a, b)| a.ends_with(&b)),
        PredicateOp::In => match expected {
            Value::List(items) => {
                actual.map_or(false, |a| items.iter().any(|item| value_eq(a, item)))
            }
            _ => false,
        },
        PredicateOp::IsNull => {
            let is_null = actual.map_or(true, Json::is_null);
            let want = !matches!(expected, Value::Boolean(false));
            is_null == want
        }
    }
}

/// Strict dotted-path walk through nested objects.
fn lookup<'a>(record: &'a Json, path: &FieldPath) -> Option<&'a Json> {
    let mut current = record;
    for segment in path.segments() {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn value_eq(actual: &Json, expected: &Value) -> bool {
    match expected {
        Value::String(s) => actual.as_str() == Some(s.as_str()),
        Value::Integer(i) => actual.is_number() && actual.as_f64() == Some(*i as f64),
        Value::Number(f) => actual.as_f64() == Some(*f),
        Value::Boolean(b) => actual.as_bool() == Some(*b),
        Value::List(_) => false,
    }
}

fn numeric(value: &Json) -> Option<f64> {
    match value {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn expected_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Number(f) => Some(*f),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Numeric ordering when both sides read as numbers, string ordering
/// otherwise.
fn order(actual: Option<&Json>, expected: &Value) -> Option<Ordering> {
    let actual = actual?;
    if let (Some(a), Some(b)) = (numeric(actual), expected_numeric(expected)) {
        return a.partial_cmp(&b);
    }
    match (actual.as_str(), expected) {
        (Some(a), Value::String(b)) => Some(a.cmp(b.as_str())),
        _ => None,
    }
}

fn strings<'a>(actual: Option<&'a Json>, expected: &Value) -> Option<(&'a str, String)> {
    let actual = actual?.as_str()?;
    let expected = match expected {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Number(f) => f.to_string(),
        _ => return None,
    };
    Some((actual, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use filter_expr::compile_filter;
    use serde_json::json;

    fn sample() -> MemoryCollection {
        MemoryCollection::new(vec![
            json!({
                "name": "small-vps",
                "status": "active",
                "price": 12.5,
                "country": "US",
                "cpu": {"cores": 2, "brand": "amd"},
                "gpu": null,
            }),
            json!({
                "name": "gpu-node",
                "status": "active",
                "price": 250,
                "country": "DE",
                "cpu": {"cores": 16, "brand": "intel"},
                "gpu": {"name": "rtx4090"},
            }),
            json!({
                "name": "storage-box",
                "status": "sold_out",
                "price": 40,
                "country": "NL",
                "cpu": {"cores": 4, "brand": "intel"},
            }),
        ])
    }

    fn names(filter: &str) -> Vec<String> {
        let tree = compile_filter(filter).unwrap();
        sample()
            .apply_predicate(&tree)
            .into_records()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_equals() {
        assert_eq!(names("status.eq.active"), vec!["small-vps", "gpu-node"]);
        assert_eq!(names("price.eq.250"), vec!["gpu-node"]);
    }

    #[test]
    fn test_negated_equals() {
        assert_eq!(names("status.ne.active"), vec!["storage-box"]);
    }

    #[test]
    fn test_ordering_across_int_and_float() {
        assert_eq!(names("price.gte.40"), vec!["gpu-node", "storage-box"]);
        assert_eq!(names("price.lt.13"), vec!["small-vps"]);
        assert_eq!(names("price.lte.40"), vec!["small-vps", "storage-box"]);
        assert_eq!(names("price.gt.250"), Vec::<String>::new());
    }

    #[test]
    fn test_pattern_operators() {
        assert_eq!(names("name.contains.vps"), vec!["small-vps"]);
        assert_eq!(names("name.startswith.gpu"), vec!["gpu-node"]);
        assert_eq!(names("name.endswith.box"), vec!["storage-box"]);
    }

    #[test]
    fn test_in_and_not_in() {
        assert_eq!(names("country.in.US,DE"), vec!["small-vps", "gpu-node"]);
        assert_eq!(names("country.not_in.US,DE"), vec!["storage-box"]);
    }

    #[test]
    fn test_range_narrows_to_listed_bounds() {
        // range lowers to In over its two bounds, compiled faithfully.
        assert_eq!(names("price.range.40,250"), vec!["gpu-node", "storage-box"]);
    }

    #[test]
    fn test_isnull_on_null_and_missing() {
        assert_eq!(names("gpu.isnull.true"), vec!["small-vps", "storage-box"]);
        assert_eq!(names("gpu.isnull.false"), vec!["gpu-node"]);
    }

    #[test]
    fn test_nested_field_path() {
        assert_eq!(names("cpu.brand.eq.intel"), vec!["gpu-node", "storage-box"]);
        assert_eq!(names("cpu.cores.gte.4"), vec!["gpu-node", "storage-box"]);
    }

    #[test]
    fn test_boolean_shape() {
        assert_eq!(
            names("status.eq.active&(country.in.US,DE|price.gte.100)"),
            vec!["small-vps", "gpu-node"]
        );
        assert_eq!(
            names("status.eq.sold_out|cpu.cores.gt.8"),
            vec!["gpu-node", "storage-box"]
        );
    }

    #[test]
    fn test_missing_field_never_matches_positive_leaf() {
        assert_eq!(names("nope.eq.1"), Vec::<String>::new());
        // ...but a negated leaf is a pure inversion, so it matches all.
        assert_eq!(names("nope.ne.1").len(), 3);
    }
}
