use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{Identity, NewIdentity, RoleCategory};
use crate::filter::ShapedQuery;

use super::document::Collection;
use super::manager::DatabaseError;

/// Identity persistence, partitioned internally by role category.
///
/// Callers never pick a collection: lookups by id probe every partition,
/// lookups by email stay inside the category they name.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DatabaseError>;

    async fn find_by_email(&self, category: RoleCategory, email: &str) -> Result<Option<Identity>, DatabaseError>;

    async fn insert_identity(&self, identity: NewIdentity) -> Result<Identity, DatabaseError>;

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<Identity, DatabaseError>;
}

/// Document persistence behind list and form endpoints
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run a shaped query: filter, sort, skip/limit, then projection
    async fn fetch(&self, query: ShapedQuery) -> Result<Vec<Value>, DatabaseError>;

    /// Store a new document; `id`, `created_at` and `__v` are assigned here
    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
