//! Purchase ownership.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{OrganizationId, UserId, ValidationError};

/// Metadata key carrying an organization owner through a provider round-trip.
pub const ORGANIZATION_ID_KEY: &str = "organization_id";

/// Metadata key carrying a user owner through a provider round-trip.
pub const USER_ID_KEY: &str = "user_id";

/// The internal owner of a purchase: exactly one organization or one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum OwnerRef {
    Organization(OrganizationId),
    User(UserId),
}

impl OwnerRef {
    pub fn organization(id: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(OwnerRef::Organization(OrganizationId::new(id)?))
    }

    pub fn user(id: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(OwnerRef::User(UserId::new(id)?))
    }

    /// Resolves an owner from the pair of optional metadata values.
    ///
    /// Blank values count as absent. Returns `Ok(None)` when neither is set
    /// and an error when both are.
    pub fn from_metadata(
        organization_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Option<Self>, ValidationError> {
        let organization_id = organization_id.filter(|v| !v.trim().is_empty());
        let user_id = user_id.filter(|v| !v.trim().is_empty());

        match (organization_id, user_id) {
            (Some(_), Some(_)) => Err(ValidationError::invalid_format(
                "owner",
                "both organization_id and user_id are set",
            )),
            (Some(org), None) => Ok(Some(Self::organization(org)?)),
            (None, Some(user)) => Ok(Some(Self::user(user)?)),
            (None, None) => Ok(None),
        }
    }

    /// Storage discriminator: `organization` or `user`.
    pub fn kind(&self) -> &'static str {
        match self {
            OwnerRef::Organization(_) => "organization",
            OwnerRef::User(_) => "user",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            OwnerRef::Organization(id) => id.as_str(),
            OwnerRef::User(id) => id.as_str(),
        }
    }

    /// The metadata key this owner is written under when creating a checkout.
    pub fn metadata_key(&self) -> &'static str {
        match self {
            OwnerRef::Organization(_) => ORGANIZATION_ID_KEY,
            OwnerRef::User(_) => USER_ID_KEY,
        }
    }

    pub fn organization_id(&self) -> Option<&OrganizationId> {
        match self {
            OwnerRef::Organization(id) => Some(id),
            OwnerRef::User(_) => None,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            OwnerRef::User(id) => Some(id),
            OwnerRef::Organization(_) => None,
        }
    }

    /// Rebuilds an owner from its storage discriminator and id.
    pub fn from_parts(kind: &str, id: &str) -> Result<Self, ValidationError> {
        match kind {
            "organization" => Self::organization(id),
            "user" => Self::user(id),
            other => Err(ValidationError::invalid_format(
                "owner_kind",
                format!("unknown owner kind '{}'", other),
            )),
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}
