//! Entity Store
//!
//! Create / read / update / soft-delete of individual entity records.
//! Payloads are not validated beyond the presence and shape of the key
//! field; callers supply well-formed records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{Entity, Receipt};
use crate::error::{LedgerError, Result};
use crate::ledger::Transaction;

const TYPE_FIELD: &str = "type";

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize an entity with its `type` tag.
pub fn encode<T: Entity>(entity: &T) -> Result<Vec<u8>> {
    let mut value = serde_json::to_value(entity)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| LedgerError::Parse(format!("{} did not serialize to an object", T::KIND)))?;
    object.insert(TYPE_FIELD.to_string(), Value::String(T::KIND.as_str().to_string()));
    Ok(serde_json::to_vec(&value)?)
}

/// Parse raw bytes into a JSON object, without checking its type tag.
pub fn parse_object(key: &str, bytes: &[u8]) -> Result<Map<String, Value>> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(LedgerError::parse_at(
            key,
            format!("expected a JSON object, found {}", json_kind(&other)),
        )),
        Err(e) => Err(LedgerError::parse_at(key, e)),
    }
}

/// Type tag of a parsed record, if any.
pub fn type_tag(object: &Map<String, Value>) -> Option<&str> {
    object.get(TYPE_FIELD).and_then(Value::as_str)
}

/// Turn a parsed object carrying `T`'s tag into `T`.
pub fn from_object<T: Entity>(key: &str, mut object: Map<String, Value>) -> Result<T> {
    match type_tag(&object) {
        Some(tag) if tag == T::KIND.as_str() => {}
        Some(tag) => {
            return Err(LedgerError::parse_at(
                key,
                format!("expected type {}, found {}", T::KIND, tag),
            ))
        }
        None => return Err(LedgerError::parse_at(key, "record has no type tag")),
    }
    object.remove(TYPE_FIELD);
    serde_json::from_value(Value::Object(object)).map_err(|e| LedgerError::parse_at(key, e))
}

/// Deserialize stored bytes into `T`, checking the type tag.
pub fn decode<T: Entity>(key: &str, bytes: &[u8]) -> Result<T> {
    from_object(key, parse_object(key, bytes)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Persist `entity` without existence checks. Callers have already
/// established whether the key may be written.
pub(crate) fn put<T: Entity>(tx: &mut Transaction, id: &str, entity: &T) -> Result<()> {
    let key = T::KIND.storage_key(id)?;
    let bytes = encode(entity)?;
    tx.put_state(key, bytes);
    Ok(())
}

/// Fail with `DuplicateKey` if `T` already has a record under `id`.
pub(crate) async fn ensure_absent<T: Entity>(tx: &mut Transaction, id: &str) -> Result<String> {
    let key = T::KIND.storage_key(id)?;
    if let Some(existing) = tx.get_state(&key).await? {
        if !existing.is_empty() {
            return Err(LedgerError::DuplicateKey(key));
        }
    }
    Ok(key)
}

/// Create a new record. The second create on the same key fails and leaves
/// the first value untouched.
pub async fn create<T: Entity>(tx: &mut Transaction, mut entity: T) -> Result<Receipt> {
    let id = entity.require_id()?;
    let key = ensure_absent::<T>(tx, &id).await?;

    let now = format_timestamp(tx.timestamp());
    let meta = entity.meta_mut();
    meta.is_active = true;
    if meta.created_date.is_none() {
        meta.created_date = Some(now.clone());
    }
    if meta.updated_date.is_none() {
        meta.updated_date = Some(now);
    }

    put(tx, &id, &entity)?;
    info!("Created {} by {}", key, tx.performer());
    Ok(Receipt::new(format!("{} created successfully", T::KIND), id))
}

/// Load a record, failing `NotFound` if absent and `Parse` if unreadable.
pub async fn get<T: Entity>(tx: &mut Transaction, id: &str) -> Result<T> {
    let key = T::KIND.storage_key(id)?;
    let bytes = match tx.get_state(&key).await? {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(LedgerError::NotFound(key)),
    };
    debug!("Read {} ({} bytes)", key, bytes.len());
    decode(&key, &bytes)
}

/// Merge `patch` over the stored record. Patch fields win; the key field and
/// type tag cannot be changed.
pub async fn update<T: Entity>(
    tx: &mut Transaction,
    id: &str,
    patch: Map<String, Value>,
) -> Result<Receipt> {
    let current: T = get(tx, id).await?;
    let key = T::KIND.storage_key(id)?;

    let mut merged = match serde_json::to_value(&current)? {
        Value::Object(object) => object,
        _ => return Err(LedgerError::Parse(format!("{} did not serialize to an object", key))),
    };

    for (field, value) in patch {
        if field == TYPE_FIELD || field == T::KIND.key_field() {
            warn!("Ignoring patch to immutable field {} of {}", field, key);
            continue;
        }
        merged.insert(field, value);
    }

    let mut updated: T = serde_json::from_value(Value::Object(merged))
        .map_err(|e| LedgerError::Validation(format!("patch for {} rejected: {}", key, e)))?;
    updated.meta_mut().updated_date = Some(format_timestamp(tx.timestamp()));

    put(tx, id, &updated)?;
    info!("Updated {} by {}", key, tx.performer());
    Ok(Receipt::new(format!("{} updated successfully", T::KIND), id))
}

/// Soft delete: flip `isActive` and apply the entity's terminal status.
pub async fn deactivate<T: Entity>(tx: &mut Transaction, id: &str) -> Result<Receipt> {
    let mut entity: T = get(tx, id).await?;

    entity.meta_mut().is_active = false;
    entity.on_deactivate();
    entity.meta_mut().updated_date = Some(format_timestamp(tx.timestamp()));

    put(tx, id, &entity)?;
    info!("Deactivated {}:{} by {}", T::KIND, id, tx.performer());
    Ok(Receipt::new(format!("{} deactivated", T::KIND), id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerStore, MemoryLedger, WriteSet};
    use crate::records::{Lecturer, Student};
    use serde_json::json;
    use std::sync::Arc;

    fn student(id: &str, program: &str) -> Student {
        serde_json::from_value(json!({"studentId": id, "program": program, "enrollmentStatus": "ACTIVE"}))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_duplicate() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());

        let mut tx = Transaction::begin(store.clone(), "registrar");
        let receipt = create(&mut tx, student("102", "Computer engineering")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(receipt.key, "102");

        let mut tx = Transaction::begin(store.clone(), "registrar");
        let err = create(&mut tx, student("102", "Mathematics")).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateKey(ref k) if k == "student:102"));
        drop(tx);

        let mut tx = Transaction::begin(store.clone(), "registrar");
        let stored: Student = get(&mut tx, "102").await.unwrap();
        assert_eq!(stored.program.as_deref(), Some("Computer engineering"));
        assert!(stored.meta.is_active);
        assert!(stored.meta.created_date.is_some());
    }

    #[tokio::test]
    async fn test_same_id_in_different_namespaces() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let mut tx = Transaction::begin(store.clone(), "registrar");
        create(&mut tx, student("102", "Physics")).await.unwrap();
        let lecturer: Lecturer = serde_json::from_value(json!({"lecturerId": "102"})).unwrap();
        create(&mut tx, lecturer).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.get("student:102").await.unwrap().is_some());
        assert!(store.get("lecturer:102").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_missing_and_corrupt() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        store
            .commit(WriteSet::single("student:bad", b"{not json".to_vec()))
            .await
            .unwrap();

        let mut tx = Transaction::begin(store.clone(), "registrar");
        assert!(matches!(get::<Student>(&mut tx, "nope").await, Err(LedgerError::NotFound(_))));
        assert!(matches!(get::<Student>(&mut tx, "bad").await, Err(LedgerError::Parse(_))));
    }

    #[tokio::test]
    async fn test_get_rejects_foreign_type_tag() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        store
            .commit(WriteSet::single("student:7", br#"{"type":"course","courseId":"7"}"#.to_vec()))
            .await
            .unwrap();

        let mut tx = Transaction::begin(store.clone(), "registrar");
        assert!(matches!(get::<Student>(&mut tx, "7").await, Err(LedgerError::Parse(_))));
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let mut tx = Transaction::begin(store.clone(), "registrar");
        create(&mut tx, student("103", "Computer science")).await.unwrap();
        tx.commit().await.unwrap();

        let patch = json!({"program": "Data science", "studentId": "999", "nickname": "sj"});
        let mut tx = Transaction::begin(store.clone(), "registrar");
        update::<Student>(&mut tx, "103", patch.as_object().unwrap().clone())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = Transaction::begin(store.clone(), "registrar");
        let stored: Student = get(&mut tx, "103").await.unwrap();
        assert_eq!(stored.student_id, Some("103".into()));
        assert_eq!(stored.program.as_deref(), Some("Data science"));
        assert_eq!(stored.enrollment_status.as_deref(), Some("ACTIVE"));
        assert_eq!(stored.meta.extra.get("nickname"), Some(&json!("sj")));
    }

    #[tokio::test]
    async fn test_update_with_unusable_field_is_rejected() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let mut tx = Transaction::begin(store.clone(), "registrar");
        create(&mut tx, student("104", "Physics")).await.unwrap();
        tx.commit().await.unwrap();
        let before = store.get("student:104").await.unwrap().unwrap();

        let patch = json!({"yearOfStudy": "second", "program": "Chemistry"});
        let mut tx = Transaction::begin(store.clone(), "registrar");
        let err = update::<Student>(&mut tx, "104", patch.as_object().unwrap().clone())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        drop(tx);

        assert_eq!(store.get("student:104").await.unwrap().unwrap(), before);

        let patch = json!({"yearOfStudy": "2"});
        let mut tx = Transaction::begin(store.clone(), "registrar");
        update::<Student>(&mut tx, "104", patch.as_object().unwrap().clone())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = Transaction::begin(store, "registrar");
        let stored: Student = get(&mut tx, "104").await.unwrap();
        assert_eq!(stored.year_of_study, Some(2));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let mut tx = Transaction::begin(store, "registrar");
        let err = update::<Student>(&mut tx, "404", Map::new()).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_deactivate_is_soft_delete() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let mut tx = Transaction::begin(store.clone(), "registrar");
        create(&mut tx, student("105", "BSc Computer Science")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = Transaction::begin(store.clone(), "registrar");
        deactivate::<Student>(&mut tx, "105").await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = Transaction::begin(store.clone(), "registrar");
        let stored: Student = get(&mut tx, "105").await.unwrap();
        assert!(!stored.meta.is_active);
        assert_eq!(stored.enrollment_status.as_deref(), Some("WITHDRAWN"));
    }

    #[tokio::test]
    async fn test_create_requires_key_field() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
        let mut tx = Transaction::begin(store, "registrar");
        let err = create(&mut tx, Student::default()).await.unwrap_err();
        assert!(matches!(err, LedgerError::MissingKey(ref f) if f == "studentId"));
    }
}
