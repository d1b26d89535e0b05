use crate::database::document::{CREATED_AT_FIELD, ID_FIELD};

use super::types::{SortKey, SqlParam};

pub struct FilterOrder;

impl FilterOrder {
    /// ORDER BY over document fields; `created_at` uses the indexed column.
    /// The primary key always closes the list so equal timestamps page the same way every time.
    pub fn generate(keys: &[SortKey], starting_param_index: usize) -> (String, Vec<SqlParam>) {
        if keys.is_empty() {
            return (String::new(), vec![]);
        }

        let mut params = Vec::new();
        let mut parts: Vec<String> = keys
            .iter()
            .map(|key| {
                let expr = if key.field == CREATED_AT_FIELD {
                    "\"created_at\"".to_string()
                } else {
                    params.push(SqlParam::Text(key.field.clone()));
                    format!("doc -> ${}", starting_param_index + params.len())
                };
                format!("{} {}", expr, key.direction.to_sql())
            })
            .collect();
        if !keys.iter().any(|key| key.field == ID_FIELD) {
            parts.push("\"id\" ASC".to_string());
        }

        (format!("ORDER BY {}", parts.join(", ")), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_keys_no_clause() {
        assert_eq!(FilterOrder::generate(&[], 0), (String::new(), vec![]));
    }

    #[test]
    fn binds_field_names_and_uses_column_for_created_at() {
        let keys = [SortKey::desc("age"), SortKey::asc("created_at")];
        let (sql, params) = FilterOrder::generate(&keys, 2);
        assert_eq!(
            sql,
            "ORDER BY doc -> $3 DESC NULLS LAST, \"created_at\" ASC NULLS FIRST, \"id\" ASC"
        );
        assert_eq!(params, vec![SqlParam::Text("age".into())]);
    }

    #[test]
    fn explicit_id_sort_needs_no_tiebreak() {
        let keys = [SortKey::desc("id"), SortKey::asc("created_at")];
        let (sql, params) = FilterOrder::generate(&keys, 0);
        assert_eq!(sql, "ORDER BY doc -> $1 DESC NULLS LAST, \"created_at\" ASC NULLS FIRST");
        assert_eq!(params, vec![SqlParam::Text("id".into())]);
    }
}
