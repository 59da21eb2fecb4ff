//! Case repository: the read-modify-write protocol for export cases.
//!
//! Every mutation reads the case through a fresh transaction, computes the
//! next value with the pure engine, and commits the single case key (plus any
//! index keys) in one batch. A failed computation commits nothing; a stale
//! read surfaces as `StoreConflict` and may be retried from the start.

use std::sync::Arc;

use exportflow_core::keys::{EXPORTER_INDEX, ORGANIZATION_INDEX};
use exportflow_core::validation;
use exportflow_core::workflow::{
    Attachment, Caller, CaseEvent, DocumentCategory, ExportCase, NewCase, Operation, Transition,
    TransitionPayload, WorkflowEngine, WorkflowError,
};
use tracing::info;

use super::index;
use crate::identity::IdentityProvider;
use crate::store::{RecordStore, StoreError};
use crate::transaction::Transaction;

/// Next value of a case computed by a mutation, plus whatever the mutation
/// wants to hand back to its caller.
#[derive(Debug, Clone)]
pub struct Mutation<R> {
    /// The case to store.
    pub case: ExportCase,
    /// Event to publish on commit.
    pub event: Option<CaseEvent>,
    /// Value returned to the caller after commit.
    pub output: R,
}

impl<R> Mutation<R> {
    /// A mutation without an event.
    pub fn quiet(case: ExportCase, output: R) -> Self {
        Self {
            case,
            event: None,
            output,
        }
    }
}

/// A computed case mutation waiting to be committed.
pub struct Staged<'a, S: RecordStore + ?Sized, R> {
    tx: Transaction<'a, S>,
    output: R,
}

impl<S: RecordStore + ?Sized, R> Staged<'_, S, R> {
    /// The value that `commit` will return.
    pub fn output(&self) -> &R {
        &self.output
    }

    /// Commit the staged write.
    ///
    /// # Errors
    /// * `StoreConflict` if the case changed since it was read
    pub fn commit(self) -> Result<R, WorkflowError> {
        self.tx.commit()?;
        Ok(self.output)
    }
}

/// Decode a stored case.
pub(crate) fn decode_case(key: &str, bytes: &[u8]) -> Result<ExportCase, WorkflowError> {
    serde_json::from_slice(bytes).map_err(|e| WorkflowError::MalformedRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn encode_case(case: &ExportCase) -> Result<Vec<u8>, WorkflowError> {
    serde_json::to_vec(case).map_err(|e| WorkflowError::Store(format!("case encoding failed: {e}")))
}

/// Read and decode a case inside `tx`.
fn load<S: RecordStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    case_id: &str,
) -> Result<ExportCase, WorkflowError> {
    validation::validate_case_id(case_id)?;
    let bytes = tx
        .get_state(case_id)?
        .ok_or_else(|| WorkflowError::case_not_found(case_id))?;
    decode_case(case_id, &bytes)
}

/// Repository for export cases.
pub struct CaseRepository<S: RecordStore + ?Sized> {
    store: Arc<S>,
    engine: WorkflowEngine,
}

impl<S: RecordStore + ?Sized> Clone for CaseRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            engine: self.engine.clone(),
        }
    }
}

impl<S: RecordStore + ?Sized> std::fmt::Debug for CaseRepository<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseRepository")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl<S: RecordStore + ?Sized> CaseRepository<S> {
    /// Creates a new case repository.
    #[must_use]
    pub fn new(store: Arc<S>, engine: WorkflowEngine) -> Self {
        Self { store, engine }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The workflow engine.
    #[must_use]
    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Creates a case in `DRAFT` together with its owner indexes.
    ///
    /// # Errors
    /// * `Configuration` if the invocation carries no identity
    /// * `Unauthorized` if the caller is not an exporter
    /// * `AlreadyExists` if the identifier is taken
    /// * `Validation` if any structural field is invalid
    pub fn create(
        &self,
        identity: &dyn IdentityProvider,
        input: NewCase,
    ) -> Result<ExportCase, WorkflowError> {
        let caller = identity.caller()?;
        let case_id = input.export_id.to_string();
        let mut tx = Transaction::begin(self.store.as_ref());

        self.engine.authorize_create(&caller)?;
        validation::validate_case_id(&case_id)?;
        if tx.get_state(&case_id)?.is_some() {
            return Err(WorkflowError::AlreadyExists {
                entity: "export",
                id: case_id,
            });
        }
        let (case, event) = self.engine.create_case(&caller, input)?;

        tx.put_state(&case_id, encode_case(&case)?)?;
        index::write_owner_indexes(&mut tx, &case)?;
        tx.set_case_event(&event)?;
        let receipt = tx.commit()?;

        info!(
            case_id = %case_id,
            organization = %caller.organization,
            tx_id = %receipt.tx_id,
            "Export case created"
        );
        Ok(case)
    }

    /// Fetches a case.
    ///
    /// # Errors
    /// * `NotFound` if the case does not exist
    /// * `MalformedRecord` if the stored value cannot be decoded
    pub fn get(&self, case_id: &str) -> Result<ExportCase, WorkflowError> {
        load(&mut Transaction::begin(self.store.as_ref()), case_id)
    }

    /// Returns true if a case with this identifier exists.
    pub fn exists(&self, case_id: &str) -> Result<bool, WorkflowError> {
        Ok(self.store.read(case_id)?.is_some())
    }

    /// Raw stored bytes of a case, if present.
    pub fn raw(&self, case_id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.store.read(case_id)?.map(|entry| entry.value))
    }

    /// Runs one read-modify-write cycle on a case.
    ///
    /// `compute` receives the committed case and the caller and returns the
    /// next value. Nothing is written if it fails.
    pub fn mutate<R>(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
        compute: impl FnOnce(&ExportCase, &Caller) -> Result<Mutation<R>, WorkflowError>,
    ) -> Result<R, WorkflowError> {
        self.stage(identity, case_id, compute)?.commit()
    }

    /// Reads a case and computes its next value without committing.
    ///
    /// The returned [`Staged`] holds the open transaction; committing it
    /// later fails with `StoreConflict` if the case changed in between.
    pub fn stage<R>(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
        compute: impl FnOnce(&ExportCase, &Caller) -> Result<Mutation<R>, WorkflowError>,
    ) -> Result<Staged<'_, S, R>, WorkflowError> {
        let caller = identity.caller()?;
        let mut tx = Transaction::begin(self.store.as_ref());
        let current = load(&mut tx, case_id)?;
        let mutation = compute(&current, &caller)?;

        tx.put_state(case_id, encode_case(&mutation.case)?)?;
        if let Some(event) = &mutation.event {
            tx.set_case_event(event)?;
        }
        Ok(Staged {
            tx,
            output: mutation.output,
        })
    }

    /// Stages a workflow operation without committing it.
    pub fn stage_transition(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
        operation: Operation,
        payload: &TransitionPayload,
    ) -> Result<Staged<'_, S, Transition>, WorkflowError> {
        self.stage(identity, case_id, |case, caller| {
            let transition = self.engine.apply(case, caller, operation, payload)?;
            Ok(Mutation {
                case: transition.case.clone(),
                event: Some(transition.event.clone()),
                output: transition,
            })
        })
    }

    /// Applies a workflow operation to a case.
    ///
    /// # Errors
    /// * `NotFound` if the case does not exist
    /// * `Unauthorized`, `InvalidTransition`, `Validation` from the engine
    /// * `StoreConflict` if the case changed concurrently
    pub fn transition(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
        operation: Operation,
        payload: &TransitionPayload,
    ) -> Result<Transition, WorkflowError> {
        let transition = self
            .stage_transition(identity, case_id, operation, payload)?
            .commit()?;

        info!(
            case_id = %case_id,
            organization = %transition.case.updated_by,
            operation = %operation,
            from = %transition.from,
            to = %transition.to,
            "Export case transitioned"
        );
        Ok(transition)
    }

    /// Appends a document version without changing status.
    pub fn attach_document(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
        category: DocumentCategory,
        reference: &str,
    ) -> Result<Attachment, WorkflowError> {
        let attachment = self.mutate(identity, case_id, |case, caller| {
            let attachment = self
                .engine
                .attach_document(case, caller, category, reference)?;
            Ok(Mutation::quiet(attachment.case.clone(), attachment))
        })?;

        info!(
            case_id = %case_id,
            category = %category,
            version = attachment.version,
            "Document attached"
        );
        Ok(attachment)
    }

    /// Marks a document version inactive.
    pub fn deactivate_document(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
        category: DocumentCategory,
        version: u32,
    ) -> Result<ExportCase, WorkflowError> {
        let case = self.mutate(identity, case_id, |case, caller| {
            let next = self
                .engine
                .deactivate_document(case, caller, category, version)?;
            Ok(Mutation::quiet(next.clone(), next))
        })?;

        info!(case_id = %case_id, category = %category, version, "Document deactivated");
        Ok(case)
    }

    /// Deletes a `DRAFT` case and both of its owner indexes.
    ///
    /// The record's history keeps a deletion entry.
    pub fn withdraw(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
    ) -> Result<(), WorkflowError> {
        let caller = identity.caller()?;
        let mut tx = Transaction::begin(self.store.as_ref());
        let case = load(&mut tx, case_id)?;
        let event = self.engine.withdraw(&case, &caller)?;

        tx.delete_state(case_id)?;
        index::delete_owner_indexes(&mut tx, &case)?;
        tx.set_case_event(&event)?;
        tx.commit()?;

        info!(case_id = %case_id, organization = %caller.organization, "Export case withdrawn");
        Ok(())
    }

    /// Cases indexed under an exporter identifier.
    pub fn list_by_exporter(&self, exporter_id: &str) -> Result<Vec<ExportCase>, WorkflowError> {
        self.list_by_owner(EXPORTER_INDEX, exporter_id)
    }

    /// Cases created by an organization.
    pub fn list_by_organization(&self, organization: &str) -> Result<Vec<ExportCase>, WorkflowError> {
        self.list_by_owner(ORGANIZATION_INDEX, organization)
    }

    fn list_by_owner(&self, namespace: &str, owner: &str) -> Result<Vec<ExportCase>, WorkflowError> {
        let mut tx = Transaction::begin(self.store.as_ref());
        let ids = index::owned_case_ids(&tx, namespace, owner)?;
        ids.iter()
            .map(|id| load(&mut tx, id.as_str()))
            .collect()
    }
}
