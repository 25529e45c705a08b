//! Row filters in the backend's `column=op.value` syntax

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
}

impl FilterOp {
    fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
        }
    }
}

/// Restricts a channel to rows whose column compares to a literal value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl RowFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn neq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Neq,
            value: value.into(),
        }
    }

    /// Evaluates the filter against a JSON row. Missing or null columns never match.
    pub fn matches(&self, record: &Value) -> bool {
        let actual = match record.get(&self.column) {
            None | Some(Value::Null) => return false,
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        match self.op {
            FilterOp::Eq => actual == self.value,
            FilterOp::Neq => actual != self.value,
        }
    }
}

impl FromStr for RowFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (column, rest) = s
            .split_once('=')
            .with_context(|| format!("filter '{s}' is missing '='"))?;
        let (op, value) = rest
            .split_once('.')
            .with_context(|| format!("filter '{s}' is missing an operator"))?;

        let column = column.trim();
        if column.is_empty() {
            bail!("filter '{s}' has an empty column name");
        }
        let op = match op {
            "eq" => FilterOp::Eq,
            "neq" => FilterOp::Neq,
            other => bail!("unsupported filter operator '{other}'"),
        };

        Ok(Self {
            column: column.to_string(),
            op,
            value: value.to_string(),
        })
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}.{}", self.column, self.op.as_str(), self.value)
    }
}
