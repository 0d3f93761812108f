//! Filter expressions
//!
//! Filters use the GeoStyler array encoding:
//!
//! ```text
//! ["==", "id", "annotation-id"]
//! ["||", ["*=", "name", "d"], ["<=", "count", 10]]
//! ```
//!
//! Evaluation is a plain recursive walk over the closed expression tree.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layer::Feature;
use crate::style::value_to_string;
use crate::MapstyleError;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Gte,
    Lte,
    Lt,
    Gt,
    /// Substring containment
    Like,
}

/// Logical combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    Or,
    And,
}

/// Recursive filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum FilterExpression {
    Comparison {
        op: ComparisonOp,
        field: String,
        value: Value,
    },
    Logical {
        op: LogicalOp,
        children: Vec<FilterExpression>,
    },
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::NotEq => "!=",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Like => "*=",
        }
    }
}

impl FromStr for ComparisonOp {
    type Err = MapstyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(ComparisonOp::Eq),
            "!=" => Ok(ComparisonOp::NotEq),
            ">=" => Ok(ComparisonOp::Gte),
            "<=" => Ok(ComparisonOp::Lte),
            "<" => Ok(ComparisonOp::Lt),
            ">" => Ok(ComparisonOp::Gt),
            "*=" => Ok(ComparisonOp::Like),
            other => Err(MapstyleError::ParseError(format!(
                "Unknown comparison operator '{}'",
                other
            ))),
        }
    }
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::Or => "||",
            LogicalOp::And => "&&",
        }
    }
}

impl FromStr for LogicalOp {
    type Err = MapstyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "||" => Ok(LogicalOp::Or),
            "&&" => Ok(LogicalOp::And),
            other => Err(MapstyleError::ParseError(format!(
                "Unknown logical operator '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FilterExpression {
    pub fn comparison(op: ComparisonOp, field: impl Into<String>, value: Value) -> Self {
        FilterExpression::Comparison {
            op,
            field: field.into(),
            value,
        }
    }

    pub fn logical(op: LogicalOp, children: Vec<FilterExpression>) -> Self {
        FilterExpression::Logical { op, children }
    }

    /// Evaluate against a feature's properties
    pub fn evaluate(&self, feature: &Feature) -> bool {
        match self {
            FilterExpression::Comparison { op, field, value } => {
                compare(*op, feature.property(field), value)
            }
            FilterExpression::Logical { op, children } => {
                // Every child is evaluated before reducing
                let results: Vec<bool> = children.iter().map(|c| c.evaluate(feature)).collect();
                match op {
                    LogicalOp::Or => results.into_iter().any(|r| r),
                    LogicalOp::And => results.into_iter().all(|r| r),
                }
            }
        }
    }
}

/// Evaluate `filter` against `feature`
pub fn geostyler_style_filter(feature: &Feature, filter: &FilterExpression) -> bool {
    filter.evaluate(feature)
}

fn compare(op: ComparisonOp, property: Option<&Value>, value: &Value) -> bool {
    match op {
        ComparisonOp::Eq => property.is_some_and(|p| strict_equals(p, value)),
        ComparisonOp::NotEq => !property.is_some_and(|p| strict_equals(p, value)),
        ComparisonOp::Like => property
            .filter(|p| !p.is_null())
            .is_some_and(|p| value_to_string(p).contains(&value_to_string(value))),
        ComparisonOp::Gte | ComparisonOp::Lte | ComparisonOp::Lt | ComparisonOp::Gt => {
            let Some(ordering) = property.and_then(|p| partial_cmp(p, value)) else {
                return false;
            };
            match op {
                ComparisonOp::Gte => ordering.is_ge(),
                ComparisonOp::Lte => ordering.is_le(),
                ComparisonOp::Lt => ordering.is_lt(),
                _ => ordering.is_gt(),
            }
        }
    }
}

/// Strict equality; numbers compare by value so `10 == 10.0`
fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering for number/number and string/string pairs only
fn partial_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

impl TryFrom<Value> for FilterExpression {
    type Error = MapstyleError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Array(items) = value else {
            return Err(MapstyleError::ParseError(format!(
                "Filter must be an array, got {}",
                value
            )));
        };
        let mut items = items.into_iter();
        let op = match items.next() {
            Some(Value::String(op)) => op,
            _ => {
                return Err(MapstyleError::ParseError(
                    "Filter must start with an operator".to_string(),
                ))
            }
        };

        if let Ok(logical) = op.parse::<LogicalOp>() {
            let children = items
                .map(FilterExpression::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(FilterExpression::Logical {
                op: logical,
                children,
            });
        }

        let op: ComparisonOp = op.parse()?;
        let field = match items.next() {
            Some(Value::String(field)) => field,
            _ => {
                return Err(MapstyleError::ParseError(format!(
                    "Comparison '{}' requires a property name",
                    op
                )))
            }
        };
        let value = items.next().unwrap_or(Value::Null);
        if items.next().is_some() {
            return Err(MapstyleError::ParseError(format!(
                "Comparison '{}' takes exactly two operands",
                op
            )));
        }
        Ok(FilterExpression::Comparison { op, field, value })
    }
}

impl From<FilterExpression> for Value {
    fn from(expr: FilterExpression) -> Self {
        match expr {
            FilterExpression::Comparison { op, field, value } => {
                Value::Array(vec![Value::String(op.as_str().to_string()), Value::String(field), value])
            }
            FilterExpression::Logical { op, children } => {
                let mut items = vec![Value::String(op.as_str().to_string())];
                items.extend(children.into_iter().map(Value::from));
                Value::Array(items)
            }
        }
    }
}
