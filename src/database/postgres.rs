use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{Identity, NewIdentity, RoleCategory};
use crate::filter::types::{Projection, SqlParam, SqlResult};
use crate::filter::ShapedQuery;

use super::document::{self, Collection, INTERNAL_FIELD};
use super::manager::DatabaseError;
use super::repository::{IdentityStore, RecordStore};

/// Postgres-backed document store: one `(id, created_at, doc JSONB)` table per collection
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the document tables and the per-partition email indexes
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        for collection in Collection::ALL {
            let table = collection.table_name();
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (\
                    id UUID PRIMARY KEY, \
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
                    doc JSONB NOT NULL)"
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS \"{table}_created_at_idx\" ON \"{table}\" (created_at)"
            ))
            .execute(&self.pool)
            .await?;

            if collection.holds_identities() {
                sqlx::query(&format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS \"{table}_email_idx\" ON \"{table}\" (lower(doc->>'email'))"
                ))
                .execute(&self.pool)
                .await?;
            }
        }
        info!("document tables ready");
        Ok(())
    }

    async fn insert_document(&self, collection: Collection, document: Value) -> Result<Value, DatabaseError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let stamped = Value::Object(document::stamp(document, id, created_at)?);

        sqlx::query(&format!(
            "INSERT INTO \"{}\" (id, created_at, doc) VALUES ($1, $2, $3)",
            collection.table_name()
        ))
        .bind(id)
        .bind(created_at)
        .bind(&stamped)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, &format!("{} document", collection)))?;

        Ok(stamped)
    }

    async fn fetch_sql(&self, sql: SqlResult) -> Result<Vec<Value>, DatabaseError> {
        let mut q = sqlx::query_scalar::<_, Value>(&sql.query);
        for param in sql.params {
            q = match param {
                SqlParam::Text(text) => q.bind(text),
                SqlParam::Json(json) => q.bind(json),
            };
        }
        Ok(q.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DatabaseError> {
        for category in RoleCategory::PROBE_ORDER {
            let table = Collection::for_category(category).table_name();
            let row: Option<Value> = sqlx::query_scalar(&format!("SELECT doc FROM \"{}\" WHERE id = $1", table))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(doc) = row {
                return document::identity_from_document(doc).map(Some);
            }
        }
        Ok(None)
    }

    async fn find_by_email(&self, category: RoleCategory, email: &str) -> Result<Option<Identity>, DatabaseError> {
        let table = Collection::for_category(category).table_name();
        let row: Option<Value> = sqlx::query_scalar(&format!(
            "SELECT doc FROM \"{}\" WHERE lower(doc->>'email') = lower($1) LIMIT 1",
            table
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(document::identity_from_document).transpose()
    }

    async fn insert_identity(&self, identity: NewIdentity) -> Result<Identity, DatabaseError> {
        let collection = Collection::for_category(identity.role.category());
        let doc = document::identity_document(&identity)?;
        let stored = self
            .insert_document(collection, doc)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => DatabaseError::Conflict(format!("{} already exists", identity.email)),
                other => other,
            })?;
        document::identity_from_document(stored)
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<Identity, DatabaseError> {
        let patch = document::password_patch(password_hash, changed_at);

        for category in RoleCategory::PROBE_ORDER {
            let table = Collection::for_category(category).table_name();
            let row: Option<Value> = sqlx::query_scalar(&format!(
                "UPDATE \"{table}\" \
                 SET doc = jsonb_set(doc || $2, '{{{INTERNAL_FIELD}}}', to_jsonb(COALESCE((doc->>'{INTERNAL_FIELD}')::int, 0) + 1)) \
                 WHERE id = $1 RETURNING doc"
            ))
            .bind(id)
            .bind(&patch)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(doc) = row {
                debug!(%id, "password updated");
                return document::identity_from_document(doc);
            }
        }

        Err(DatabaseError::NotFound(format!("identity {}", id)))
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn fetch(&self, query: ShapedQuery) -> Result<Vec<Value>, DatabaseError> {
        let sql = query.to_sql();
        debug!(collection = %query.collection, sql = %sql.query, "fetch");

        let rows = self.fetch_sql(sql).await?;
        Ok(rows.into_iter().map(|doc| document::project(doc, &query.projection)).collect())
    }

    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, DatabaseError> {
        if collection.holds_identities() {
            return Err(DatabaseError::QueryError(format!(
                "{} documents are created through the identity store",
                collection
            )));
        }
        let stored = self.insert_document(collection, document).await?;
        Ok(document::project(stored, &Projection::Exclude(vec![INTERNAL_FIELD.to_string()])))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
