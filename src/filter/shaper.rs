use crate::config::QueryConfig;
use crate::database::document::{CREATED_AT_FIELD, ID_FIELD, INTERNAL_FIELD, SECRET_FIELDS};

use super::shaped::{BaseQuery, ShapedQuery};
use super::types::{FilterClause, FilterOp, Pagination, Projection, QueryRequest, SortKey};

const RESERVED_KEYS: [&str; 4] = ["sort", "fields", "page", "limit"];
const FALLBACK_LIMIT: u32 = 100;

/// Turns raw query-string parameters into a [`QueryRequest`] and composes it
/// onto a base collection fetch.
///
/// Malformed input never fails: bad numbers fall back to defaults and
/// unrecognised comparator tokens are filtered on literally.
#[derive(Debug, Clone, Copy)]
pub struct QueryShaper {
    default_limit: u32,
    max_limit: Option<u32>,
    debug_logging: bool,
}

impl Default for QueryShaper {
    fn default() -> Self {
        Self { default_limit: FALLBACK_LIMIT, max_limit: None, debug_logging: false }
    }
}

impl QueryShaper {
    pub fn new(default_limit: u32, max_limit: Option<u32>) -> Self {
        Self {
            default_limit: if default_limit == 0 { FALLBACK_LIMIT } else { default_limit },
            max_limit: max_limit.filter(|m| *m > 0),
            debug_logging: false,
        }
    }

    pub fn from_config(config: &QueryConfig) -> Self {
        Self { debug_logging: config.debug_logging, ..Self::new(config.default_limit, config.max_limit) }
    }

    pub fn parse<I, K, V>(&self, raw: I) -> QueryRequest
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params: Vec<(String, String)> = raw
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();
        // Query maps arrive unordered; keep the clause order deterministic
        params.sort();

        let lookup = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

        let filters = params
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| Self::parse_filter(k, v))
            .collect();

        QueryRequest {
            filters,
            sort: Self::parse_sort(lookup("sort")),
            projection: Self::parse_fields(lookup("fields")),
            pagination: self.parse_pagination(lookup("page"), lookup("limit")),
        }
    }

    /// Filter first, then sort, projection and pagination.
    ///
    /// Request filters and sort keys on secret fields are dropped: comparing
    /// against a hidden value would leak it through row counts and order.
    pub fn apply(&self, request: QueryRequest, base: BaseQuery) -> ShapedQuery {
        let (collection, mut filters) = base.into_parts();
        filters.extend(request.filters.into_iter().filter(|c| !is_secret(&c.field)));

        let mut sort: Vec<SortKey> = request.sort.into_iter().filter(|k| !is_secret(&k.field)).collect();
        if !sort.iter().any(|k| k.field == CREATED_AT_FIELD) {
            sort.push(SortKey::asc(CREATED_AT_FIELD));
        }

        let shaped = ShapedQuery {
            collection,
            filters,
            sort,
            projection: request.projection,
            skip: request.pagination.skip(),
            limit: request.pagination.limit,
        };

        if self.debug_logging {
            tracing::debug!(
                collection = %shaped.collection,
                filters = shaped.filters.len(),
                skip = shaped.skip,
                limit = shaped.limit,
                "shaped query"
            );
        }

        shaped
    }

    pub fn shape<I, K, V>(&self, raw: I, base: BaseQuery) -> ShapedQuery
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.apply(self.parse(raw), base)
    }

    fn parse_filter(key: &str, value: &str) -> FilterClause {
        if let Some((field, token)) = key.strip_suffix(']').and_then(|k| k.split_once('[')) {
            if let Some(op) = FilterOp::from_token(token) {
                if !field.is_empty() {
                    return FilterClause::new(field, op, value);
                }
            }
        }
        FilterClause::eq(key, value)
    }

    fn parse_sort(raw: Option<&str>) -> Vec<SortKey> {
        let Some(raw) = raw else { return vec![] };
        raw.split(',')
            .map(str::trim)
            .filter_map(|part| match part.strip_prefix('-') {
                Some(field) if !field.trim().is_empty() => Some(SortKey::desc(field.trim())),
                Some(_) => None,
                None if !part.is_empty() => Some(SortKey::asc(part)),
                None => None,
            })
            .collect()
    }

    fn parse_fields(raw: Option<&str>) -> Projection {
        let fields: Vec<&str> = raw
            .map(|r| r.split(',').map(str::trim).filter(|f| !f.is_empty()).collect())
            .unwrap_or_default();

        let (excluded, included): (Vec<&str>, Vec<&str>) = fields.into_iter().partition(|f| f.starts_with('-'));

        if !included.is_empty() {
            let mut keep = vec![ID_FIELD.to_string()];
            for field in included {
                if !keep.iter().any(|k| k == field) {
                    keep.push(field.to_string());
                }
            }
            return Projection::Include(keep);
        }

        let mut drop = vec![INTERNAL_FIELD.to_string()];
        for field in excluded.iter().map(|f| f.trim_start_matches('-')) {
            if !field.is_empty() && field != ID_FIELD && !drop.iter().any(|d| d == field) {
                drop.push(field.to_string());
            }
        }
        Projection::Exclude(drop)
    }

    fn parse_pagination(&self, page: Option<&str>, limit: Option<&str>) -> Pagination {
        let positive = |raw: Option<&str>| {
            raw.and_then(|s| s.trim().parse::<i64>().ok())
                .filter(|n| *n > 0)
                .map(|n| n.min(u32::MAX as i64) as u32)
        };

        let page = positive(page).unwrap_or(1);
        let mut limit = positive(limit).unwrap_or(self.default_limit);
        if let Some(max) = self.max_limit {
            if limit > max {
                if self.debug_logging {
                    tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max);
                }
                limit = max;
            }
        }

        Pagination { page, limit }
    }
}

fn is_secret(field: &str) -> bool {
    SECRET_FIELDS.contains(&field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::document::Collection;
    use crate::filter::types::SortDirection;

    fn shaper() -> QueryShaper {
        QueryShaper::new(100, Some(500))
    }

    #[test]
    fn bracketed_comparator_becomes_clause() {
        let request = shaper().parse([("age[gte]", "30")]);
        assert_eq!(request.filters, vec![FilterClause::new("age", FilterOp::Gte, "30")]);
    }

    #[test]
    fn plain_key_is_equality() {
        let request = shaper().parse([("age", "30")]);
        assert_eq!(request.filters, vec![FilterClause::eq("age", "30")]);
    }

    #[test]
    fn malformed_comparator_is_literal() {
        let request = shaper().parse([("age[gtx]", "30"), ("[gt]", "1")]);
        assert_eq!(
            request.filters,
            vec![FilterClause::eq("[gt]", "1"), FilterClause::eq("age[gtx]", "30")]
        );
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let request = shaper().parse([
            ("sort", "-age,name"),
            ("fields", "name,age"),
            ("page", "2"),
            ("limit", "10"),
            ("role", "Doctor"),
        ]);
        assert_eq!(request.filters, vec![FilterClause::eq("role", "Doctor")]);
        assert_eq!(request.sort, vec![SortKey::desc("age"), SortKey::asc("name")]);
        assert_eq!(
            request.projection,
            Projection::Include(vec!["id".into(), "name".into(), "age".into()])
        );
        assert_eq!(request.pagination, Pagination { page: 2, limit: 10 });
    }

    #[test]
    fn range_on_one_field_keeps_both_clauses() {
        let request = shaper().parse([("age[lte]", "60"), ("age[gte]", "30")]);
        assert_eq!(
            request.filters,
            vec![
                FilterClause::new("age", FilterOp::Gte, "30"),
                FilterClause::new("age", FilterOp::Lte, "60"),
            ]
        );
    }

    #[test]
    fn pagination_defaults_and_caps() {
        let defaults = shaper().parse(Vec::<(String, String)>::new());
        assert_eq!(defaults.pagination, Pagination { page: 1, limit: 100 });

        let bad = shaper().parse([("page", "0"), ("limit", "-5")]);
        assert_eq!(bad.pagination, Pagination { page: 1, limit: 100 });

        let junk = shaper().parse([("page", "two"), ("limit", "ten")]);
        assert_eq!(junk.pagination, Pagination { page: 1, limit: 100 });

        let capped = shaper().parse([("limit", "10000")]);
        assert_eq!(capped.pagination.limit, 500);
    }

    #[test]
    fn fields_default_drops_internal_field() {
        let request = shaper().parse(Vec::<(String, String)>::new());
        assert_eq!(request.projection, Projection::Exclude(vec!["__v".into()]));

        let excluding = shaper().parse([("fields", "-email")]);
        assert_eq!(excluding.projection, Projection::Exclude(vec!["__v".into(), "email".into()]));
    }

    #[test]
    fn sort_ignores_empty_parts() {
        let request = shaper().parse([("sort", " ,-, name ,")]);
        assert_eq!(request.sort, vec![SortKey::asc("name")]);
    }

    #[test]
    fn apply_puts_base_filters_first_and_adds_tiebreak() {
        let base = BaseQuery::all(Collection::Staff).with_filter("role", "Doctor");
        let shaped = shaper().shape([("name", "Ada"), ("page", "3"), ("limit", "10")], base);

        assert_eq!(shaped.collection, Collection::Staff);
        assert_eq!(shaped.filters[0], FilterClause::eq("role", "Doctor"));
        assert_eq!(shaped.filters[1], FilterClause::eq("name", "Ada"));
        assert_eq!(shaped.sort, vec![SortKey::asc("created_at")]);
        assert_eq!(shaped.skip, 20);
        assert_eq!(shaped.limit, 10);
    }

    #[test]
    fn secret_fields_cannot_be_filtered_or_sorted() {
        let shaped = shaper().shape(
            [
                ("password_hash[lt]", "$argon2id$v=20"),
                ("password_hash", "$argon2id$"),
                ("name", "Ada"),
                ("sort", "password_hash,-name"),
            ],
            BaseQuery::all(Collection::Patients),
        );

        assert_eq!(shaped.filters, vec![FilterClause::eq("name", "Ada")]);
        assert_eq!(shaped.sort, vec![SortKey::desc("name"), SortKey::asc("created_at")]);
    }

    #[test]
    fn explicit_created_at_sort_is_not_duplicated() {
        let shaped = shaper().shape([("sort", "-created_at")], BaseQuery::all(Collection::Patients));
        assert_eq!(shaped.sort.len(), 1);
        assert_eq!(shaped.sort[0].direction, SortDirection::Desc);
    }
}
