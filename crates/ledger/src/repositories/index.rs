//! Secondary index maintenance.
//!
//! Index keys are derived from a primary record and are written, deleted, and
//! committed in the same transaction as that record. They are never read as a
//! source of truth: a lookup returns identifiers that the caller then fetches
//! by primary key.

use exportflow_core::keys::{self, EXPORTER_INDEX, INDEX_MARKER, ORGANIZATION_INDEX};
use exportflow_core::workflow::{ExportCase, WorkflowError};
use exportflow_shared::CaseId;

use crate::store::{RecordStore, StoreError};
use crate::transaction::Transaction;

/// Owner-index keys of `case`: by exporter, then by creating organization.
pub fn owner_index_keys(case: &ExportCase) -> Result<[String; 2], StoreError> {
    let id = case.export_id.as_str();
    Ok([
        keys::composite_key(EXPORTER_INDEX, &[&case.exporter_id, id])?,
        keys::composite_key(ORGANIZATION_INDEX, &[&case.created_by, id])?,
    ])
}

/// Buffer both owner-index entries of `case`.
pub fn write_owner_indexes<S: RecordStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    case: &ExportCase,
) -> Result<(), StoreError> {
    for key in owner_index_keys(case)? {
        tx.put_state(&key, INDEX_MARKER.to_vec())?;
    }
    Ok(())
}

/// Buffer removal of both owner-index entries of `case`.
pub fn delete_owner_indexes<S: RecordStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    case: &ExportCase,
) -> Result<(), StoreError> {
    for key in owner_index_keys(case)? {
        tx.delete_state(&key)?;
    }
    Ok(())
}

/// Case identifiers indexed under `owner` in `namespace`. Order is unspecified.
pub fn owned_case_ids<S: RecordStore + ?Sized>(
    tx: &Transaction<'_, S>,
    namespace: &str,
    owner: &str,
) -> Result<Vec<CaseId>, StoreError> {
    tx.state_by_partial_composite_key(namespace, &[owner])?
        .into_iter()
        .map(|(key, _)| {
            let (_, parts) = keys::split_composite_key(&key)?;
            parts
                .last()
                .cloned()
                .map(CaseId::new)
                .ok_or(StoreError::Key(keys::KeyError::NotComposite { key }))
        })
        .collect()
}

/// Claim `value` in the uniqueness index `namespace` for `owner_id`.
///
/// The index key is read through the transaction, so two concurrent claims on
/// the same value conflict at commit.
///
/// # Errors
/// * `AlreadyExists` if the value is already claimed
pub fn claim_unique<S: RecordStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    namespace: &'static str,
    value: &str,
    owner_id: &str,
) -> Result<(), WorkflowError> {
    let key = keys::composite_key(namespace, &[value]).map_err(StoreError::from)?;
    if tx.get_state(&key)?.is_some() {
        return Err(WorkflowError::AlreadyExists {
            entity: namespace,
            id: value.to_string(),
        });
    }
    tx.put_state(&key, owner_id.as_bytes().to_vec())?;
    Ok(())
}

/// Owner identifier stored in the uniqueness index `namespace` for `value`.
pub fn lookup_unique<S: RecordStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    namespace: &str,
    value: &str,
) -> Result<Option<String>, WorkflowError> {
    let key = keys::composite_key(namespace, &[value]).map_err(StoreError::from)?;
    tx.get_state(&key)?
        .map(|bytes| {
            String::from_utf8(bytes).map_err(|e| WorkflowError::MalformedRecord {
                key: key.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
