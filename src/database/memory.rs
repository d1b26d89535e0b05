use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{Identity, NewIdentity, RoleCategory};
use crate::filter::ShapedQuery;

use super::document::{self, Collection, INTERNAL_FIELD};
use super::manager::DatabaseError;
use super::repository::{IdentityStore, RecordStore};

/// Process-local document store. Documents are kept in insertion order,
/// which is also creation order.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: Collection) -> usize {
        self.collections.read().await.get(&collection).map(Vec::len).unwrap_or(0)
    }

    async fn push(&self, collection: Collection, document: Value) -> Result<Value, DatabaseError> {
        let stamped = Value::Object(document::stamp(document, Uuid::new_v4(), Utc::now())?);
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(stamped.clone());
        Ok(stamped)
    }

    fn email_of(document: &Value) -> Option<&str> {
        document.get("email").and_then(Value::as_str)
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, DatabaseError> {
        let key = id.to_string();
        let collections = self.collections.read().await;

        for category in RoleCategory::PROBE_ORDER {
            let found = collections
                .get(&Collection::for_category(category))
                .and_then(|docs| docs.iter().find(|d| d.get("id").and_then(Value::as_str) == Some(key.as_str())));
            if let Some(doc) = found {
                return document::identity_from_document(doc.clone()).map(Some);
            }
        }
        Ok(None)
    }

    async fn find_by_email(&self, category: RoleCategory, email: &str) -> Result<Option<Identity>, DatabaseError> {
        let collections = self.collections.read().await;
        let found = collections
            .get(&Collection::for_category(category))
            .and_then(|docs| {
                docs.iter()
                    .find(|d| Self::email_of(d).is_some_and(|e| e.eq_ignore_ascii_case(email)))
            });

        found.cloned().map(document::identity_from_document).transpose()
    }

    async fn insert_identity(&self, identity: NewIdentity) -> Result<Identity, DatabaseError> {
        let collection = Collection::for_category(identity.role.category());
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        if docs
            .iter()
            .any(|d| Self::email_of(d).is_some_and(|e| e.eq_ignore_ascii_case(&identity.email)))
        {
            return Err(DatabaseError::Conflict(format!("{} already exists", identity.email)));
        }

        let stamped = Value::Object(document::stamp(
            document::identity_document(&identity)?,
            Uuid::new_v4(),
            Utc::now(),
        )?);
        docs.push(stamped.clone());
        document::identity_from_document(stamped)
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<Identity, DatabaseError> {
        let key = id.to_string();
        let mut collections = self.collections.write().await;

        for category in RoleCategory::PROBE_ORDER {
            let Some(docs) = collections.get_mut(&Collection::for_category(category)) else {
                continue;
            };
            let Some(Value::Object(doc)) = docs
                .iter_mut()
                .find(|d| d.get("id").and_then(Value::as_str) == Some(key.as_str()))
            else {
                continue;
            };

            if let Value::Object(patch) = document::password_patch(password_hash, changed_at) {
                doc.extend(patch);
            }
            let version = doc.get(INTERNAL_FIELD).and_then(Value::as_i64).unwrap_or(0);
            doc.insert(INTERNAL_FIELD.to_string(), Value::from(version + 1));

            return document::identity_from_document(Value::Object(doc.clone()));
        }

        Err(DatabaseError::NotFound(format!("identity {}", id)))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch(&self, query: ShapedQuery) -> Result<Vec<Value>, DatabaseError> {
        let mut matched: Vec<Value> = {
            let collections = self.collections.read().await;
            collections
                .get(&query.collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|d| document::matches_all(d, &query.filters))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        // Stable sort: equal keys keep creation order
        matched.sort_by(|a, b| {
            query
                .sort
                .iter()
                .map(|key| {
                    let ordering = document::sort_order(a.get(&key.field), b.get(&key.field));
                    match key.direction {
                        crate::filter::SortDirection::Asc => ordering,
                        crate::filter::SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .skip(skip)
            .take(query.limit as usize)
            .map(|d| document::project(d, &query.projection))
            .collect())
    }

    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, DatabaseError> {
        if collection.holds_identities() {
            return Err(DatabaseError::QueryError(format!(
                "{} documents are created through the identity store",
                collection
            )));
        }
        let stored = self.push(collection, document).await?;
        Ok(document::project(stored, &crate::filter::Projection::Exclude(vec![INTERNAL_FIELD.to_string()])))
    }
}
