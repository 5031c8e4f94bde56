//! Filter expressions for store criteria
//!
//! Gateways backed by a real engine translate these into their own query
//! language; [`FilterExpr::matches`] evaluates them against a model's JSON form
//! for in-memory gateways.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Filter operator for field comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal to
    Eq,
    /// Not equal to
    Ne,
    /// Greater than
    Gt,
    /// Less than
    Lt,
    /// Greater than or equal
    Gte,
    /// Less than or equal
    Lte,
    /// Contains substring (strings) or element (arrays)
    Contains,
    /// In list of values
    In,
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Field to filter on
    pub field: String,
    /// Operator to apply
    pub operator: FilterOperator,
    /// Value to compare against
    pub value: Value,
}

impl FilterExpr {
    /// Create a new filter expression.
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    /// Create a contains filter.
    pub fn contains(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Contains, value)
    }

    /// Create a membership filter.
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Evaluate against a JSON object. Missing fields compare as `null`.
    pub fn matches(&self, doc: &Value) -> bool {
        let actual = doc.get(&self.field).unwrap_or(&Value::Null);
        match self.operator {
            FilterOperator::Eq => json_eq(actual, &self.value),
            FilterOperator::Ne => !json_eq(actual, &self.value),
            FilterOperator::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            FilterOperator::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            FilterOperator::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Contains => match (actual, &self.value) {
                (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
                (Value::Array(items), needle) => items.iter().any(|item| json_eq(item, needle)),
                _ => false,
            },
            FilterOperator::In => match &self.value {
                Value::Array(candidates) => candidates.iter().any(|c| json_eq(actual, c)),
                _ => false,
            },
        }
    }
}

/// Numbers compare by value so that `1` and `1.0` are equal.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Integers compare exactly; only floats go through `f64`.
fn compare_numbers(x: &Number, y: &Number) -> Option<Ordering> {
    match (x.as_u64(), y.as_u64(), x.as_i64(), y.as_i64()) {
        (Some(x), Some(y), _, _) => Some(x.cmp(&y)),
        (_, _, Some(x), Some(y)) => Some(x.cmp(&y)),
        // a negative i64 against a u64 beyond i64::MAX
        (None, Some(_), Some(_), None) => Some(Ordering::Less),
        (Some(_), None, None, Some(_)) => Some(Ordering::Greater),
        _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
    }
}

/// Ordering between two JSON values. Only numbers and strings are ordered.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({"id": 4, "name": "alpha", "tags": ["a", "b"], "score": 2.5})
    }

    #[test]
    fn test_eq_and_ne() {
        assert!(FilterExpr::eq("name", json!("alpha")).matches(&doc()));
        assert!(FilterExpr::eq("id", json!(4.0)).matches(&doc()));
        assert!(FilterExpr::new("name", FilterOperator::Ne, json!("beta")).matches(&doc()));
    }

    #[test]
    fn test_ordering_operators() {
        assert!(FilterExpr::new("score", FilterOperator::Gt, json!(2)).matches(&doc()));
        assert!(FilterExpr::new("score", FilterOperator::Lte, json!(2.5)).matches(&doc()));
        assert!(!FilterExpr::new("score", FilterOperator::Lt, json!(1)).matches(&doc()));
        // mixed types are never ordered
        assert!(!FilterExpr::new("name", FilterOperator::Gt, json!(1)).matches(&doc()));
    }

    #[test]
    fn test_contains_and_in() {
        assert!(FilterExpr::contains("name", json!("lph")).matches(&doc()));
        assert!(FilterExpr::contains("tags", json!("b")).matches(&doc()));
        assert!(FilterExpr::is_in("id", vec![json!(1), json!(4)]).matches(&doc()));
        assert!(!FilterExpr::is_in("id", vec![json!(1)]).matches(&doc()));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let low = json!({"id": 9_007_199_254_740_992_u64});
        let high = json!(9_007_199_254_740_993_u64);

        assert!(!FilterExpr::eq("id", high.clone()).matches(&low));
        assert!(FilterExpr::new("id", FilterOperator::Ne, high.clone()).matches(&low));
        assert!(FilterExpr::new("id", FilterOperator::Lt, high.clone()).matches(&low));
        assert!(!FilterExpr::new("id", FilterOperator::Gte, high.clone()).matches(&low));
        assert!(!FilterExpr::is_in("id", vec![high]).matches(&low));

        let max = json!({"id": u64::MAX});
        assert!(FilterExpr::new("id", FilterOperator::Gt, json!(-1)).matches(&max));
        assert!(FilterExpr::new("id", FilterOperator::Lt, json!(0)).matches(&json!({"id": i64::MIN})));
    }

    #[test]
    fn test_missing_field_is_null() {
        assert!(FilterExpr::eq("deleted_at", Value::Null).matches(&doc()));
        assert!(!FilterExpr::eq("deleted_at", json!(1)).matches(&doc()));
    }

    #[test]
    fn test_operator_serializes_lowercase() {
        let expr = FilterExpr::new("id", FilterOperator::Gte, json!(1));
        let value = serde_json::to_value(&expr).unwrap();
        assert_eq!(value["operator"], json!("gte"));
    }
}
