//! Remote identifier types.
//!
//! The control plane assigns identifiers (UUIDs for almost everything, the
//! name for SSH key pairs). They are kept as opaque strings here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{define_id, IdError, ResourceKind};

// =============================================================================
// Untyped Remote ID
// =============================================================================

/// An identifier assigned by the remote control plane.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Parses and validates a remote ID.
    ///
    /// Leading and trailing whitespace is trimmed; embedded whitespace is rejected.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(IdError::Whitespace(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the ID as a UUID, if it is one.
    #[must_use]
    pub fn as_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.0).ok()
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RemoteId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RemoteId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RemoteId> for String {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

impl AsRef<str> for RemoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Qualified Reference
// =============================================================================

/// A remote ID qualified with its kind, formatted as `kind:id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: RemoteId,
}

impl ResourceRef {
    #[must_use]
    pub const fn new(kind: ResourceKind, id: RemoteId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for ResourceRef {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((kind, id)) = s.split_once(':') else {
            return Err(IdError::MissingSeparator(s.to_string()));
        };
        Ok(Self {
            kind: kind.parse()?,
            id: id.parse()?,
        })
    }
}

// =============================================================================
// Identity and Tenancy
// =============================================================================

define_id!(DomainId, Domain);
define_id!(AccountId, Account);
define_id!(UserId, User);
define_id!(ProjectId, Project);

// =============================================================================
// Offerings and Templates
// =============================================================================

define_id!(ServiceOfferingId, ServiceOffering);
define_id!(DiskOfferingId, DiskOffering);
define_id!(NetworkOfferingId, NetworkOffering);
define_id!(VpcOfferingId, VpcOffering);
define_id!(TemplateId, Template);

// =============================================================================
// Networking
// =============================================================================

define_id!(NetworkId, Network);
define_id!(VpcId, Vpc);
define_id!(PublicIpAddressId, PublicIpAddress);
define_id!(SecurityGroupId, SecurityGroup);
define_id!(FirewallRuleId, FirewallRule);
define_id!(PortForwardingRuleId, PortForwardingRule);

// =============================================================================
// Compute and Storage
// =============================================================================

define_id!(VirtualMachineId, VirtualMachine);
define_id!(VolumeId, Volume);
define_id!(SnapshotId, Snapshot);

/// Zones are never created by tests, so they have no [`ResourceKind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(RemoteId);

impl ZoneId {
    pub fn parse(s: &str) -> Result<Self, IdError> {
        RemoteId::parse(s).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ZoneId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Tests
// =============================================================================
