use super::types::{FilterClause, SqlParam};

/// Generates the WHERE predicate for document tables (`doc JSONB`).
///
/// Field names and values are always bound parameters. A comparison only
/// holds between values of the same JSON type, so `age >= 30` never matches
/// a string-typed `age`.
pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self { param_values: vec![], param_index: starting_param_index }
    }

    pub fn generate(clauses: &[FilterClause], starting_param_index: usize) -> (String, Vec<SqlParam>) {
        let mut filter_where = Self::new(starting_param_index);
        let conditions: Vec<String> = clauses.iter().map(|c| filter_where.build_sql_condition(c)).collect();
        let where_clause = if conditions.is_empty() { "1=1".to_string() } else { conditions.join(" AND ") };
        (where_clause, filter_where.param_values)
    }

    fn build_sql_condition(&mut self, clause: &FilterClause) -> String {
        let field = self.param(SqlParam::Text(clause.field.clone()));
        let alternatives: Vec<String> = clause
            .operands()
            .into_iter()
            .map(|operand| {
                let value = self.param(SqlParam::Json(operand));
                format!(
                    "(jsonb_typeof(doc -> {f}) = jsonb_typeof({v}) AND doc -> {f} {op} {v})",
                    f = field,
                    v = value,
                    op = clause.op.to_sql()
                )
            })
            .collect();
        format!("({})", alternatives.join(" OR "))
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::FilterOp;
    use serde_json::json;

    #[test]
    fn empty_clauses_match_everything() {
        let (sql, params) = FilterWhere::generate(&[], 0);
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn numeric_literal_tries_number_then_string() {
        let (sql, params) = FilterWhere::generate(&[FilterClause::new("age", FilterOp::Gte, "30")], 0);
        assert_eq!(
            sql,
            "((jsonb_typeof(doc -> $1) = jsonb_typeof($2) AND doc -> $1 >= $2) OR \
             (jsonb_typeof(doc -> $1) = jsonb_typeof($3) AND doc -> $1 >= $3))"
        );
        assert_eq!(
            params,
            vec![SqlParam::Text("age".into()), SqlParam::Json(json!(30)), SqlParam::Json(json!("30"))]
        );
    }

    #[test]
    fn clauses_are_joined_with_and_and_numbering_continues() {
        let clauses = [FilterClause::eq("role", "Doctor"), FilterClause::eq("name", "Ada")];
        let (sql, params) = FilterWhere::generate(&clauses, 4);
        assert!(sql.contains("doc -> $5 = $6"));
        assert!(sql.contains(") AND ("));
        assert!(sql.contains("doc -> $7 = $8"));
        assert_eq!(params.len(), 4);
    }
}
