use serde_json::Value;

use crate::database::document::Collection;
use crate::database::{DatabaseError, RecordStore};

use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterClause, Projection, SortKey, SqlResult};

/// "Fetch every record of a collection", optionally narrowed by fixed filters
#[derive(Debug, Clone)]
pub struct BaseQuery {
    collection: Collection,
    filters: Vec<FilterClause>,
}

impl BaseQuery {
    pub fn all(collection: Collection) -> Self {
        Self { collection, filters: vec![] }
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(FilterClause::eq(field, value));
        self
    }

    pub(crate) fn into_parts(self) -> (Collection, Vec<FilterClause>) {
        (self.collection, self.filters)
    }
}

/// A fully composed fetch. Nothing runs until [`ShapedQuery::execute`],
/// which consumes the query.
#[derive(Debug, Clone)]
pub struct ShapedQuery {
    pub collection: Collection,
    pub filters: Vec<FilterClause>,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub skip: u64,
    pub limit: u32,
}

impl ShapedQuery {
    pub async fn execute(self, store: &dyn RecordStore) -> Result<Vec<Value>, DatabaseError> {
        store.fetch(self).await
    }

    /// SELECT over the collection's document table
    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, mut params) = FilterWhere::generate(&self.filters, 0);
        let (order_clause, order_params) = FilterOrder::generate(&self.sort, params.len());
        params.extend(order_params);

        let query = [
            "SELECT doc".to_string(),
            format!("FROM \"{}\"", self.collection.table_name()),
            format!("WHERE {}", where_clause),
            order_clause,
            format!("LIMIT {} OFFSET {}", self.limit, self.skip),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }
}
