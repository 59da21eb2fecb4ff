//! User registry with username and email uniqueness.
//!
//! Users are stored under `user` composite keys; the `username` and `email`
//! indexes are claimed in the same transaction as the user record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use exportflow_core::clock::Clock;
use exportflow_core::keys::{self, EMAIL_INDEX, USER_NAMESPACE, USERNAME_INDEX};
use exportflow_core::validation;
use exportflow_core::workflow::WorkflowError;
use exportflow_shared::UserId;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::index;
use crate::store::{RecordStore, Selector, StoreError};
use crate::transaction::Transaction;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Organization the user belongs to.
    pub organization_id: String,
    /// Role within the organization.
    pub role: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// False once deactivated.
    pub is_active: bool,
}

/// Input for registering a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// User identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Organization.
    pub organization_id: String,
    /// Role.
    pub role: String,
}

impl NewUser {
    fn validate(&self) -> Result<(), WorkflowError> {
        validation::validate_reference_code("user id", self.id.as_str())?;
        validation::validate_username(&self.username)?;
        validation::validate_email(&self.email)?;
        validation::validate_reference_code("organization id", &self.organization_id)?;
        validation::validate_reference_code("role", &self.role)?;
        Ok(())
    }
}

fn user_key(id: &str) -> Result<String, StoreError> {
    Ok(keys::composite_key(USER_NAMESPACE, &[id])?)
}

fn decode_user(key: &str, bytes: &[u8]) -> Result<User, WorkflowError> {
    serde_json::from_slice(bytes).map_err(|e| WorkflowError::MalformedRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn encode_user(user: &User) -> Result<Vec<u8>, WorkflowError> {
    serde_json::to_vec(user).map_err(|e| WorkflowError::Store(format!("user encoding failed: {e}")))
}

/// Registry of users.
pub struct UserRegistry<S: RecordStore + ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: RecordStore + ?Sized> std::fmt::Debug for UserRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegistry").finish_non_exhaustive()
    }
}

impl<S: RecordStore + ?Sized> UserRegistry<S> {
    /// Creates a new user registry.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Registers a user.
    ///
    /// # Errors
    /// * `Validation` if any field is malformed
    /// * `AlreadyExists` if the id, username, or email is taken
    /// * `StoreConflict` if a concurrent registration claimed the same values
    pub fn register(&self, input: NewUser) -> Result<User, WorkflowError> {
        input.validate()?;
        let mut tx = Transaction::begin(self.store.as_ref());
        let key = user_key(input.id.as_str())?;
        if tx.get_state(&key)?.is_some() {
            return Err(WorkflowError::AlreadyExists {
                entity: "user",
                id: input.id.to_string(),
            });
        }
        index::claim_unique(&mut tx, USERNAME_INDEX, &input.username, input.id.as_str())?;
        index::claim_unique(&mut tx, EMAIL_INDEX, &input.email, input.id.as_str())?;

        let now = self.clock.now();
        let user = User {
            id: input.id,
            username: input.username,
            email: input.email,
            organization_id: input.organization_id,
            role: input.role,
            created_at: now,
            updated_at: now,
            is_active: true,
        };
        tx.put_state(&key, encode_user(&user)?)?;
        tx.commit()?;

        info!(user_id = %user.id, organization = %user.organization_id, "User registered");
        Ok(user)
    }

    /// Fetches a user by id.
    pub fn get(&self, id: &str) -> Result<User, WorkflowError> {
        let key = user_key(id)?;
        let entry = self.store.read(&key)?.ok_or_else(|| WorkflowError::NotFound {
            entity: "user",
            id: id.to_string(),
        })?;
        decode_user(&key, &entry.value)
    }

    /// Fetches a user by username.
    pub fn get_by_username(&self, username: &str) -> Result<User, WorkflowError> {
        self.get_by_index(USERNAME_INDEX, username)
    }

    /// Fetches a user by email.
    pub fn get_by_email(&self, email: &str) -> Result<User, WorkflowError> {
        self.get_by_index(EMAIL_INDEX, email)
    }

    fn get_by_index(&self, namespace: &'static str, value: &str) -> Result<User, WorkflowError> {
        let mut tx = Transaction::begin(self.store.as_ref());
        let id = index::lookup_unique(&mut tx, namespace, value)?.ok_or_else(|| {
            WorkflowError::NotFound {
                entity: namespace,
                id: value.to_string(),
            }
        })?;
        self.get(&id)
    }

    /// Users of an organization. Malformed records are skipped.
    pub fn list_by_organization(&self, organization_id: &str) -> Result<Vec<User>, WorkflowError> {
        let selector = Selector::field_equals("organizationId", organization_id);
        Ok(self
            .store
            .query(&selector)?
            .into_iter()
            .filter_map(|(key, bytes)| decode_user(&key, &bytes).ok())
            .collect())
    }

    /// Marks a user inactive.
    pub fn deactivate(&self, id: &str) -> Result<User, WorkflowError> {
        self.set_active(id, false)
    }

    /// Marks a user active.
    pub fn activate(&self, id: &str) -> Result<User, WorkflowError> {
        self.set_active(id, true)
    }

    fn set_active(&self, id: &str, active: bool) -> Result<User, WorkflowError> {
        let key = user_key(id)?;
        let mut tx = Transaction::begin(self.store.as_ref());
        let bytes = tx.get_state(&key)?.ok_or_else(|| WorkflowError::NotFound {
            entity: "user",
            id: id.to_string(),
        })?;
        let mut user = decode_user(&key, &bytes)?;
        user.is_active = active;
        user.updated_at = self.clock.now();
        tx.put_state(&key, encode_user(&user)?)?;
        tx.commit()?;

        info!(user_id = %user.id, active, "User activation changed");
        Ok(user)
    }
}
