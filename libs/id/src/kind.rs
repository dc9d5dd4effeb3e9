//! Kinds of remote resources the harness knows how to create and delete.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::IdError;

/// Kind of a remote resource.
///
/// The string form (`as_str`) is stable and is what appears in teardown
/// reports and on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Account,
    User,
    Domain,
    Project,
    Network,
    Vpc,
    NetworkOffering,
    VpcOffering,
    ServiceOffering,
    DiskOffering,
    VirtualMachine,
    Volume,
    Snapshot,
    Template,
    SecurityGroup,
    SshKeyPair,
    PublicIpAddress,
    FirewallRule,
    PortForwardingRule,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [ResourceKind; 19] = [
        ResourceKind::Account,
        ResourceKind::User,
        ResourceKind::Domain,
        ResourceKind::Project,
        ResourceKind::Network,
        ResourceKind::Vpc,
        ResourceKind::NetworkOffering,
        ResourceKind::VpcOffering,
        ResourceKind::ServiceOffering,
        ResourceKind::DiskOffering,
        ResourceKind::VirtualMachine,
        ResourceKind::Volume,
        ResourceKind::Snapshot,
        ResourceKind::Template,
        ResourceKind::SecurityGroup,
        ResourceKind::SshKeyPair,
        ResourceKind::PublicIpAddress,
        ResourceKind::FirewallRule,
        ResourceKind::PortForwardingRule,
    ];

    /// Stable snake_case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Account => "account",
            ResourceKind::User => "user",
            ResourceKind::Domain => "domain",
            ResourceKind::Project => "project",
            ResourceKind::Network => "network",
            ResourceKind::Vpc => "vpc",
            ResourceKind::NetworkOffering => "network_offering",
            ResourceKind::VpcOffering => "vpc_offering",
            ResourceKind::ServiceOffering => "service_offering",
            ResourceKind::DiskOffering => "disk_offering",
            ResourceKind::VirtualMachine => "virtual_machine",
            ResourceKind::Volume => "volume",
            ResourceKind::Snapshot => "snapshot",
            ResourceKind::Template => "template",
            ResourceKind::SecurityGroup => "security_group",
            ResourceKind::SshKeyPair => "ssh_key_pair",
            ResourceKind::PublicIpAddress => "public_ip_address",
            ResourceKind::FirewallRule => "firewall_rule",
            ResourceKind::PortForwardingRule => "port_forwarding_rule",
        }
    }

    /// Human-readable name for log lines and error messages.
    pub const fn description(self) -> &'static str {
        match self {
            ResourceKind::Account => "account",
            ResourceKind::User => "user",
            ResourceKind::Domain => "domain",
            ResourceKind::Project => "project",
            ResourceKind::Network => "network",
            ResourceKind::Vpc => "VPC",
            ResourceKind::NetworkOffering => "network offering",
            ResourceKind::VpcOffering => "VPC offering",
            ResourceKind::ServiceOffering => "service offering",
            ResourceKind::DiskOffering => "disk offering",
            ResourceKind::VirtualMachine => "virtual machine",
            ResourceKind::Volume => "volume",
            ResourceKind::Snapshot => "snapshot",
            ResourceKind::Template => "template",
            ResourceKind::SecurityGroup => "security group",
            ResourceKind::SshKeyPair => "SSH key pair",
            ResourceKind::PublicIpAddress => "public IP address",
            ResourceKind::FirewallRule => "firewall rule",
            ResourceKind::PortForwardingRule => "port forwarding rule",
        }
    }

    /// Whether deleting a resource of this kind removes its children remotely.
    ///
    /// A domain takes its accounts with it, an account its VMs and networks,
    /// a project its members' resources, a VPC its tiers.
    pub const fn cascades(self) -> bool {
        matches!(
            self,
            ResourceKind::Domain
                | ResourceKind::Account
                | ResourceKind::Project
                | ResourceKind::Vpc
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| IdError::UnknownKind(s.to_string()))
    }
}
