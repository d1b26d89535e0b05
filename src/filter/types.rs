use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    /// Comparator tokens recognised inside `field[op]` keys
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "gte" => Some(FilterOp::Gte),
            "gt" => Some(FilterOp::Gt),
            "lte" => Some(FilterOp::Lte),
            "lt" => Some(FilterOp::Lt),
            _ => None,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }

    pub fn accepts(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            FilterOp::Eq => ordering == Equal,
            FilterOp::Gt => ordering == Greater,
            FilterOp::Gte => ordering != Less,
            FilterOp::Lt => ordering == Less,
            FilterOp::Lte => ordering != Greater,
        }
    }
}

/// One filter condition. The value is kept exactly as it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self { field: field.into(), op, value: value.into() }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Candidate operands a stored value is compared against.
    ///
    /// Literal numbers and booleans are tried in their JSON form first, then
    /// as the raw string, so `"30"` matches both `30` and `"30"`.
    pub fn operands(&self) -> Vec<Value> {
        let raw = Value::String(self.value.clone());
        match serde_json::from_str::<Value>(self.value.trim()) {
            Ok(v @ Value::Number(_)) | Ok(v @ Value::Bool(_)) => vec![v, raw],
            _ => vec![raw],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        // Missing fields sort as the lowest value in both directions
        match self {
            SortDirection::Asc => "ASC NULLS FIRST",
            SortDirection::Desc => "DESC NULLS LAST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }
}

/// Field projection. Never mixes inclusion and exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    Include(Vec<String>),
    Exclude(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// Items per page, always > 0
    pub limit: u32,
}

impl Pagination {
    pub fn skip(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.limit as u64
    }
}

/// Normalized filter/sort/projection/pagination intent for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub filters: Vec<FilterClause>,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub pagination: Pagination,
}

/// Bound parameter for generated SQL
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Json(Value),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cmp::Ordering;

    #[test]
    fn operands_coerce_literal_numbers_and_booleans() {
        assert_eq!(FilterClause::eq("age", "30").operands(), vec![json!(30), json!("30")]);
        assert_eq!(FilterClause::eq("active", "true").operands(), vec![json!(true), json!("true")]);
        assert_eq!(FilterClause::eq("name", "Ada").operands(), vec![json!("Ada")]);
        // leading zeros are not JSON numbers
        assert_eq!(FilterClause::eq("phone", "0123").operands(), vec![json!("0123")]);
    }

    #[test]
    fn op_accepts_orderings() {
        assert!(FilterOp::Gte.accepts(Ordering::Equal));
        assert!(FilterOp::Gte.accepts(Ordering::Greater));
        assert!(!FilterOp::Gt.accepts(Ordering::Equal));
        assert!(FilterOp::Lte.accepts(Ordering::Less));
        assert!(!FilterOp::Eq.accepts(Ordering::Less));
    }

    #[test]
    fn skip_is_zero_based() {
        assert_eq!(Pagination { page: 1, limit: 10 }.skip(), 0);
        assert_eq!(Pagination { page: 3, limit: 10 }.skip(), 20);
    }
}
