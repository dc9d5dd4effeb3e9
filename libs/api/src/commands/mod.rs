//! Typed command configs and response types, one module per area.

pub mod account;
pub mod compute;
pub mod network;
pub mod offering;
pub mod storage;

use rigger_id::{RemoteId, ResourceKind};
use rigger_lifecycle::DeleteAction;

pub use account::{
    Account, AccountType, CreateAccount, CreateDomain, CreateProject, Domain, Project, User,
};
pub use compute::{
    CreateSshKeyPair, DeployVirtualMachine, Nic, SshKeyPair, Template, VirtualMachine,
};
pub use network::{
    AssociateIpAddress, CreateFirewallRule, CreateNetwork, CreatePortForwardingRule,
    CreateSecurityGroup, CreateVpc, FirewallRule, IngressRule, Network, PortForwardingRule,
    PublicIpAddress, SecurityGroup, Vpc,
};
pub use offering::{
    CreateDiskOffering, CreateServiceOffering, DiskOffering, NetworkOffering, ServiceOffering,
    VpcOffering,
};
pub use storage::{CreateSnapshot, CreateVolume, Snapshot, UploadVolume, Volume};

/// List command and response key for a kind.
pub fn list_command(kind: ResourceKind) -> (&'static str, &'static str) {
    match kind {
        ResourceKind::Account => ("listAccounts", "account"),
        ResourceKind::User => ("listUsers", "user"),
        ResourceKind::Domain => ("listDomains", "domain"),
        ResourceKind::Project => ("listProjects", "project"),
        ResourceKind::Network => ("listNetworks", "network"),
        ResourceKind::Vpc => ("listVPCs", "vpc"),
        ResourceKind::NetworkOffering => ("listNetworkOfferings", "networkoffering"),
        ResourceKind::VpcOffering => ("listVPCOfferings", "vpcoffering"),
        ResourceKind::ServiceOffering => ("listServiceOfferings", "serviceoffering"),
        ResourceKind::DiskOffering => ("listDiskOfferings", "diskoffering"),
        ResourceKind::VirtualMachine => ("listVirtualMachines", "virtualmachine"),
        ResourceKind::Volume => ("listVolumes", "volume"),
        ResourceKind::Snapshot => ("listSnapshots", "snapshot"),
        ResourceKind::Template => ("listTemplates", "template"),
        ResourceKind::SecurityGroup => ("listSecurityGroups", "securitygroup"),
        ResourceKind::SshKeyPair => ("listSSHKeyPairs", "sshkeypair"),
        ResourceKind::PublicIpAddress => ("listPublicIpAddresses", "publicipaddress"),
        ResourceKind::FirewallRule => ("listFirewallRules", "firewallrule"),
        ResourceKind::PortForwardingRule => ("listPortForwardingRules", "portforwardingrule"),
    }
}

/// Remote ID of a key pair owned by `account` in `domain_id`.
///
/// Key pair names are only unique within an account, so the ID carries the
/// owner as `domain_id/account/name`.
pub fn key_pair_id(domain_id: &str, account: &str, name: &str) -> String {
    format!("{domain_id}/{account}/{name}")
}

fn key_pair_delete_action(id: &str) -> DeleteAction {
    let action = DeleteAction::new("deleteSSHKeyPair");
    match id.splitn(3, '/').collect::<Vec<_>>()[..] {
        [domain_id, account, name] => action
            .param("name", name)
            .param("account", account)
            .param("domainid", domain_id),
        _ => action.param("name", id),
    }
}

/// Delete action for a resource known only by kind and ID.
///
/// A key pair ID without an owner is deleted in the caller's own account.
pub fn delete_action(kind: ResourceKind, id: &RemoteId) -> DeleteAction {
    let id = id.as_str();
    match kind {
        ResourceKind::Account => DeleteAction::new("deleteAccount").param("id", id),
        ResourceKind::User => DeleteAction::new("deleteUser").param("id", id),
        ResourceKind::Domain => DeleteAction::new("deleteDomain")
            .param("id", id)
            .param("cleanup", "true"),
        ResourceKind::Project => DeleteAction::new("deleteProject").param("id", id),
        ResourceKind::Network => DeleteAction::new("deleteNetwork").param("id", id),
        ResourceKind::Vpc => DeleteAction::new("deleteVPC").param("id", id),
        ResourceKind::NetworkOffering => {
            DeleteAction::new("deleteNetworkOffering").param("id", id)
        }
        ResourceKind::VpcOffering => DeleteAction::new("deleteVPCOffering").param("id", id),
        ResourceKind::ServiceOffering => {
            DeleteAction::new("deleteServiceOffering").param("id", id)
        }
        ResourceKind::DiskOffering => DeleteAction::new("deleteDiskOffering").param("id", id),
        ResourceKind::VirtualMachine => DeleteAction::new("destroyVirtualMachine")
            .param("id", id)
            .param("expunge", "true"),
        ResourceKind::Volume => DeleteAction::new("deleteVolume").param("id", id),
        ResourceKind::Snapshot => DeleteAction::new("deleteSnapshot").param("id", id),
        ResourceKind::Template => DeleteAction::new("deleteTemplate").param("id", id),
        ResourceKind::SecurityGroup => DeleteAction::new("deleteSecurityGroup").param("id", id),
        ResourceKind::SshKeyPair => key_pair_delete_action(id),
        ResourceKind::PublicIpAddress => {
            DeleteAction::new("disassociateIpAddress").param("id", id)
        }
        ResourceKind::FirewallRule => DeleteAction::new("deleteFirewallRule").param("id", id),
        ResourceKind::PortForwardingRule => {
            DeleteAction::new("deletePortForwardingRule").param("id", id)
        }
    }
}
