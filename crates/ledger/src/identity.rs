//! Caller identity for each invocation.

use exportflow_core::workflow::{Caller, WorkflowError};

/// The invocation carried no usable identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// No organization label was supplied.
    #[error("caller organization is not available")]
    MissingOrganization,
    /// No client identity was supplied.
    #[error("caller identity is not available")]
    MissingIdentity,
}

impl IdentityError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingOrganization => "MISSING_ORGANIZATION",
            Self::MissingIdentity => "MISSING_IDENTITY",
        }
    }
}

impl From<IdentityError> for WorkflowError {
    fn from(err: IdentityError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Supplies the verified caller of the current invocation.
pub trait IdentityProvider: Send + Sync {
    /// The caller's organization label.
    fn caller_organization(&self) -> Result<String, IdentityError>;

    /// The caller's client identity within the organization.
    fn caller_identity(&self) -> Result<String, IdentityError>;

    /// Both labels as a [`Caller`].
    fn caller(&self) -> Result<Caller, IdentityError> {
        Ok(Caller::new(
            self.caller_organization()?,
            self.caller_identity()?,
        ))
    }
}

/// Fixed identity, as handed over by an authenticated transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    organization: Option<String>,
    identity: Option<String>,
}

impl StaticIdentity {
    /// Identity for `identity` within `organization`.
    #[must_use]
    pub fn new(organization: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            organization: Some(organization.into()),
            identity: Some(identity.into()),
        }
    }

    /// An invocation without identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl IdentityProvider for StaticIdentity {
    fn caller_organization(&self) -> Result<String, IdentityError> {
        self.organization
            .clone()
            .filter(|org| !org.is_empty())
            .ok_or(IdentityError::MissingOrganization)
    }

    fn caller_identity(&self) -> Result<String, IdentityError> {
        self.identity
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or(IdentityError::MissingIdentity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exportflow_shared::ErrorKind;

    #[test]
    fn test_static_identity() {
        let caller = StaticIdentity::new("ExporterMSP", "alice").caller().unwrap();
        assert_eq!(caller.organization, "ExporterMSP");
        assert_eq!(caller.identity, "alice");
    }

    #[test]
    fn test_missing_identity_is_configuration_error() {
        let err: WorkflowError = StaticIdentity::anonymous().caller().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            StaticIdentity::new("", "alice").caller_organization(),
            Err(IdentityError::MissingOrganization)
        );
    }
}
