use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

use crate::auth::{Identity, NewIdentity, RoleCategory};
use crate::filter::types::{FilterClause, Projection};

use super::manager::DatabaseError;

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "created_at";
/// Store-maintained version counter, hidden from list output by default
pub const INTERNAL_FIELD: &str = "__v";
/// Never leaves the store through record fetches
pub const SECRET_FIELDS: [&str; 1] = ["password_hash"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Patients,
    Staff,
    Devices,
    Appointments,
    Complaints,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Patients,
        Collection::Staff,
        Collection::Devices,
        Collection::Appointments,
        Collection::Complaints,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Patients => "patients",
            Collection::Staff => "staff",
            Collection::Devices => "devices",
            Collection::Appointments => "appointments",
            Collection::Complaints => "complaints",
        }
    }

    pub fn for_category(category: RoleCategory) -> Self {
        match category {
            RoleCategory::Patient => Collection::Patients,
            RoleCategory::Staff => Collection::Staff,
        }
    }

    pub fn holds_identities(&self) -> bool {
        matches!(self, Collection::Patients | Collection::Staff)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Fill in the store-owned fields of a new document
pub fn stamp(document: Value, id: Uuid, created_at: DateTime<Utc>) -> Result<Map<String, Value>, DatabaseError> {
    let mut object = match document {
        Value::Object(object) => object,
        other => {
            return Err(DatabaseError::QueryError(format!(
                "documents must be JSON objects, got {}",
                other
            )))
        }
    };
    object.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    object.insert(CREATED_AT_FIELD.to_string(), Value::String(timestamp(created_at)));
    object.insert(INTERNAL_FIELD.to_string(), Value::from(0));
    Ok(object)
}

/// Stored shape of an identity, hash included
#[derive(Serialize)]
struct StoredIdentity<'a> {
    name: &'a str,
    email: &'a str,
    password_hash: &'a str,
    role: crate::auth::Role,
}

pub fn identity_document(new: &NewIdentity) -> Result<Value, DatabaseError> {
    Ok(serde_json::to_value(StoredIdentity {
        name: &new.name,
        email: &new.email,
        password_hash: &new.password_hash,
        role: new.role,
    })?)
}

pub fn identity_from_document(document: Value) -> Result<Identity, DatabaseError> {
    Ok(serde_json::from_value(document)?)
}

/// Patch applied to an identity document on password change
pub fn password_patch(password_hash: &str, changed_at: DateTime<Utc>) -> Value {
    serde_json::json!({
        "password_hash": password_hash,
        "password_changed_at": timestamp(changed_at),
    })
}

pub fn matches_all(document: &Value, clauses: &[FilterClause]) -> bool {
    clauses.iter().all(|clause| matches_clause(document, clause))
}

/// Same-type comparison only, mirroring `jsonb_typeof` in the SQL store
pub fn matches_clause(document: &Value, clause: &FilterClause) -> bool {
    let Some(stored) = document.get(&clause.field) else {
        return false;
    };
    clause
        .operands()
        .iter()
        .filter_map(|operand| compare_same_type(stored, operand))
        .any(|ordering| clause.op.accepts(ordering))
}

fn compare_same_type(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Total order for sorting: missing/null lowest, then jsonb's type order
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::String(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(x), Some(y)) => compare_same_type(x, y).unwrap_or_else(|| rank(a).cmp(&rank(b))),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Apply the projection and strip secret fields
pub fn project(document: Value, projection: &Projection) -> Value {
    let Value::Object(mut object) = document else {
        return document;
    };

    match projection {
        Projection::Include(fields) => {
            object.retain(|key, _| key == ID_FIELD || fields.iter().any(|f| f == key));
        }
        Projection::Exclude(fields) => {
            for field in fields {
                object.remove(field);
            }
        }
    }
    for secret in SECRET_FIELDS {
        object.remove(secret);
    }

    Value::Object(object)
}
