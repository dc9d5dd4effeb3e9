//! Networks, VPCs, public IPs, rules and security groups.

use rigger_id::{
    DomainId, FirewallRuleId, NetworkId, NetworkOfferingId, PortForwardingRuleId,
    PublicIpAddressId, ResourceKind, ResourceRef, SecurityGroupId, VirtualMachineId, VpcId,
    VpcOfferingId, ZoneId,
};
use rigger_lifecycle::DeleteAction;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::account::Account;
use super::delete_action;
use crate::client::Client;
use crate::de::{lenient_bool, opt_number};
use crate::error::ApiError;
use crate::resource::{CreateSpec, Params, RemoteResource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: NetworkId,
    pub name: String,
    #[serde(default, rename = "displaytext")]
    pub display_text: Option<String>,
    #[serde(default, rename = "zoneid")]
    pub zone_id: Option<String>,
    #[serde(default, rename = "networkofferingid")]
    pub network_offering_id: Option<NetworkOfferingId>,
    #[serde(default, rename = "vpcid")]
    pub vpc_id: Option<VpcId>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default, rename = "domainid")]
    pub domain_id: Option<DomainId>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub cidr: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
}

impl RemoteResource for Network {
    const KIND: ResourceKind = ResourceKind::Network;
    const RESPONSE_KEY: &'static str = "network";
    const LIST_COMMAND: &'static str = "listNetworks";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn parent(&self) -> Option<ResourceRef> {
        self.vpc_id.as_ref().map(VpcId::to_ref)
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `createNetwork`.
#[derive(Debug, Clone)]
pub struct CreateNetwork {
    pub name: String,
    pub display_text: String,
    pub network_offering_id: NetworkOfferingId,
    pub zone_id: ZoneId,
    pub account: Option<String>,
    pub domain_id: Option<DomainId>,
    pub vpc_id: Option<VpcId>,
    pub gateway: Option<String>,
    pub netmask: Option<String>,
    pub acl_id: Option<String>,
}

impl CreateNetwork {
    pub fn new(name: impl Into<String>, offering: &NetworkOfferingId, zone: &ZoneId) -> Self {
        let name = name.into();
        Self {
            display_text: name.clone(),
            name,
            network_offering_id: offering.clone(),
            zone_id: zone.clone(),
            account: None,
            domain_id: None,
            vpc_id: None,
            gateway: None,
            netmask: None,
            acl_id: None,
        }
    }

    #[must_use]
    pub fn owned_by(mut self, account: &Account) -> Self {
        self.account = Some(account.name.clone());
        self.domain_id = Some(account.domain_id.clone());
        self
    }

    /// Place the network as a tier inside a VPC.
    #[must_use]
    pub fn in_vpc(mut self, vpc: &VpcId, gateway: &str, netmask: &str) -> Self {
        self.vpc_id = Some(vpc.clone());
        self.gateway = Some(gateway.to_string());
        self.netmask = Some(netmask.to_string());
        self
    }
}

impl CreateSpec for CreateNetwork {
    type Output = Network;
    const COMMAND: &'static str = "createNetwork";

    fn params(&self) -> Params {
        Params::new()
            .set("name", &self.name)
            .set("displaytext", &self.display_text)
            .set("networkofferingid", &self.network_offering_id)
            .set("zoneid", &self.zone_id)
            .opt("account", self.account.as_ref())
            .opt("domainid", self.domain_id.as_ref())
            .opt("vpcid", self.vpc_id.as_ref())
            .opt("gateway", self.gateway.as_ref())
            .opt("netmask", self.netmask.as_ref())
            .opt("aclid", self.acl_id.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub id: VpcId,
    pub name: String,
    #[serde(default, rename = "displaytext")]
    pub display_text: Option<String>,
    #[serde(default, rename = "zoneid")]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub cidr: Option<String>,
    #[serde(default, rename = "vpcofferingid")]
    pub vpc_offering_id: Option<VpcOfferingId>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default, rename = "domainid")]
    pub domain_id: Option<DomainId>,
    #[serde(default)]
    pub state: Option<String>,
}

impl RemoteResource for Vpc {
    const KIND: ResourceKind = ResourceKind::Vpc;
    const RESPONSE_KEY: &'static str = "vpc";
    const LIST_COMMAND: &'static str = "listVPCs";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `createVPC`.
#[derive(Debug, Clone)]
pub struct CreateVpc {
    pub name: String,
    pub display_text: String,
    pub vpc_offering_id: VpcOfferingId,
    pub zone_id: ZoneId,
    pub cidr: String,
    pub account: Option<String>,
    pub domain_id: Option<DomainId>,
}

impl CreateVpc {
    pub fn new(
        name: impl Into<String>,
        offering: &VpcOfferingId,
        zone: &ZoneId,
        cidr: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            display_text: name.clone(),
            name,
            vpc_offering_id: offering.clone(),
            zone_id: zone.clone(),
            cidr: cidr.into(),
            account: None,
            domain_id: None,
        }
    }

    #[must_use]
    pub fn owned_by(mut self, account: &Account) -> Self {
        self.account = Some(account.name.clone());
        self.domain_id = Some(account.domain_id.clone());
        self
    }
}

impl CreateSpec for CreateVpc {
    type Output = Vpc;
    const COMMAND: &'static str = "createVPC";

    fn params(&self) -> Params {
        Params::new()
            .set("name", &self.name)
            .set("displaytext", &self.display_text)
            .set("vpcofferingid", &self.vpc_offering_id)
            .set("zoneid", &self.zone_id)
            .set("cidr", &self.cidr)
            .opt("account", self.account.as_ref())
            .opt("domainid", self.domain_id.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIpAddress {
    pub id: PublicIpAddressId,
    #[serde(rename = "ipaddress")]
    pub ip_address: String,
    #[serde(default, rename = "zoneid")]
    pub zone_id: Option<String>,
    #[serde(default, rename = "associatednetworkid")]
    pub network_id: Option<NetworkId>,
    #[serde(default, rename = "vpcid")]
    pub vpc_id: Option<VpcId>,
    #[serde(default, rename = "isstaticnat", deserialize_with = "lenient_bool")]
    pub is_static_nat: bool,
    #[serde(default, rename = "virtualmachineid")]
    pub virtual_machine_id: Option<VirtualMachineId>,
    #[serde(default)]
    pub state: Option<String>,
}

impl RemoteResource for PublicIpAddress {
    const KIND: ResourceKind = ResourceKind::PublicIpAddress;
    const RESPONSE_KEY: &'static str = "publicipaddress";
    const CREATE_KEY: &'static str = "ipaddress";
    const LIST_COMMAND: &'static str = "listPublicIpAddresses";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.ip_address)
    }

    fn parent(&self) -> Option<ResourceRef> {
        self.network_id
            .as_ref()
            .map(NetworkId::to_ref)
            .or_else(|| self.vpc_id.as_ref().map(VpcId::to_ref))
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `associateIpAddress`: acquire a public IP for a network or VPC.
#[derive(Debug, Clone, Default)]
pub struct AssociateIpAddress {
    pub zone_id: Option<ZoneId>,
    pub network_id: Option<NetworkId>,
    pub vpc_id: Option<VpcId>,
    pub account: Option<String>,
    pub domain_id: Option<DomainId>,
}

impl AssociateIpAddress {
    pub fn for_network(network: &NetworkId) -> Self {
        Self {
            network_id: Some(network.clone()),
            ..Self::default()
        }
    }

    pub fn for_vpc(vpc: &VpcId) -> Self {
        Self {
            vpc_id: Some(vpc.clone()),
            ..Self::default()
        }
    }
}

impl CreateSpec for AssociateIpAddress {
    type Output = PublicIpAddress;
    const COMMAND: &'static str = "associateIpAddress";

    fn params(&self) -> Params {
        Params::new()
            .opt("zoneid", self.zone_id.as_ref())
            .opt("networkid", self.network_id.as_ref())
            .opt("vpcid", self.vpc_id.as_ref())
            .opt("account", self.account.as_ref())
            .opt("domainid", self.domain_id.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: FirewallRuleId,
    #[serde(rename = "ipaddressid")]
    pub ip_address_id: PublicIpAddressId,
    pub protocol: String,
    #[serde(default, rename = "startport", deserialize_with = "opt_number")]
    pub start_port: Option<u16>,
    #[serde(default, rename = "endport", deserialize_with = "opt_number")]
    pub end_port: Option<u16>,
    #[serde(default, rename = "cidrlist")]
    pub cidr_list: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl RemoteResource for FirewallRule {
    const KIND: ResourceKind = ResourceKind::FirewallRule;
    const RESPONSE_KEY: &'static str = "firewallrule";
    const LIST_COMMAND: &'static str = "listFirewallRules";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn parent(&self) -> Option<ResourceRef> {
        Some(self.ip_address_id.to_ref())
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `createFirewallRule`.
#[derive(Debug, Clone)]
pub struct CreateFirewallRule {
    pub ip_address_id: PublicIpAddressId,
    pub protocol: String,
    pub cidr_list: Vec<String>,
    pub start_port: Option<u16>,
    pub end_port: Option<u16>,
}

impl CreateFirewallRule {
    /// TCP rule for a single port, open to the world.
    pub fn tcp(ip: &PublicIpAddressId, port: u16) -> Self {
        Self {
            ip_address_id: ip.clone(),
            protocol: "TCP".to_string(),
            cidr_list: vec!["0.0.0.0/0".to_string()],
            start_port: Some(port),
            end_port: Some(port),
        }
    }
}

impl CreateSpec for CreateFirewallRule {
    type Output = FirewallRule;
    const COMMAND: &'static str = "createFirewallRule";

    fn params(&self) -> Params {
        Params::new()
            .set("ipaddressid", &self.ip_address_id)
            .set("protocol", &self.protocol)
            .list("cidrlist", &self.cidr_list)
            .opt("startport", self.start_port)
            .opt("endport", self.end_port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortForwardingRule {
    pub id: PortForwardingRuleId,
    #[serde(rename = "ipaddressid")]
    pub ip_address_id: PublicIpAddressId,
    #[serde(rename = "virtualmachineid")]
    pub virtual_machine_id: VirtualMachineId,
    pub protocol: String,
    #[serde(default, rename = "publicport", deserialize_with = "opt_number")]
    pub public_port: Option<u16>,
    #[serde(default, rename = "privateport", deserialize_with = "opt_number")]
    pub private_port: Option<u16>,
    #[serde(default)]
    pub state: Option<String>,
}

impl RemoteResource for PortForwardingRule {
    const KIND: ResourceKind = ResourceKind::PortForwardingRule;
    const RESPONSE_KEY: &'static str = "portforwardingrule";
    const LIST_COMMAND: &'static str = "listPortForwardingRules";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn parent(&self) -> Option<ResourceRef> {
        Some(self.ip_address_id.to_ref())
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `createPortForwardingRule`.
#[derive(Debug, Clone)]
pub struct CreatePortForwardingRule {
    pub ip_address_id: PublicIpAddressId,
    pub virtual_machine_id: VirtualMachineId,
    pub protocol: String,
    pub public_port: u16,
    pub private_port: u16,
}

impl CreatePortForwardingRule {
    pub fn tcp(
        ip: &PublicIpAddressId,
        vm: &VirtualMachineId,
        public_port: u16,
        private_port: u16,
    ) -> Self {
        Self {
            ip_address_id: ip.clone(),
            virtual_machine_id: vm.clone(),
            protocol: "TCP".to_string(),
            public_port,
            private_port,
        }
    }
}

impl CreateSpec for CreatePortForwardingRule {
    type Output = PortForwardingRule;
    const COMMAND: &'static str = "createPortForwardingRule";

    fn params(&self) -> Params {
        Params::new()
            .set("ipaddressid", &self.ip_address_id)
            .set("virtualmachineid", &self.virtual_machine_id)
            .set("protocol", &self.protocol)
            .set("publicport", self.public_port)
            .set("privateport", self.private_port)
    }
}

/// One ingress permission of a security group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    #[serde(default, rename = "ruleid")]
    pub rule_id: Option<String>,
    pub protocol: String,
    #[serde(default, rename = "startport", deserialize_with = "opt_number")]
    pub start_port: Option<u16>,
    #[serde(default, rename = "endport", deserialize_with = "opt_number")]
    pub end_port: Option<u16>,
    #[serde(default)]
    pub cidr: Option<String>,
}

impl IngressRule {
    pub fn tcp(port: u16, cidr: impl Into<String>) -> Self {
        Self {
            rule_id: None,
            protocol: "TCP".to_string(),
            start_port: Some(port),
            end_port: Some(port),
            cidr: Some(cidr.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: SecurityGroupId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default, rename = "domainid")]
    pub domain_id: Option<DomainId>,
    #[serde(default, rename = "ingressrule")]
    pub ingress_rules: Vec<IngressRule>,
}

impl RemoteResource for SecurityGroup {
    const KIND: ResourceKind = ResourceKind::SecurityGroup;
    const RESPONSE_KEY: &'static str = "securitygroup";
    const LIST_COMMAND: &'static str = "listSecurityGroups";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `createSecurityGroup`.
#[derive(Debug, Clone, Default)]
pub struct CreateSecurityGroup {
    pub name: String,
    pub description: Option<String>,
    pub account: Option<String>,
    pub domain_id: Option<DomainId>,
}

impl CreateSecurityGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn owned_by(mut self, account: &Account) -> Self {
        self.account = Some(account.name.clone());
        self.domain_id = Some(account.domain_id.clone());
        self
    }
}

impl CreateSpec for CreateSecurityGroup {
    type Output = SecurityGroup;
    const COMMAND: &'static str = "createSecurityGroup";

    fn params(&self) -> Params {
        Params::new()
            .set("name", &self.name)
            .opt("description", self.description.as_ref())
            .opt("account", self.account.as_ref())
            .opt("domainid", self.domain_id.as_ref())
    }
}

impl Client {
    /// `enableStaticNat`: map a public IP one-to-one onto a VM.
    pub async fn enable_static_nat(
        &self,
        ip: &PublicIpAddressId,
        vm: &VirtualMachineId,
        network: Option<&NetworkId>,
    ) -> Result<(), ApiError> {
        self.execute_success(
            "enableStaticNat",
            Params::new()
                .set("ipaddressid", ip)
                .set("virtualmachineid", vm)
                .opt("networkid", network),
        )
        .await?;
        info!(ip = %ip, vm = %vm, "Enabled static NAT");
        Ok(())
    }

    /// `disableStaticNat`.
    pub async fn disable_static_nat(&self, ip: &PublicIpAddressId) -> Result<(), ApiError> {
        self.execute_success("disableStaticNat", Params::new().set("ipaddressid", ip))
            .await?;
        info!(ip = %ip, "Disabled static NAT");
        Ok(())
    }

    /// `authorizeSecurityGroupIngress`.
    pub async fn authorize_ingress(
        &self,
        group: &SecurityGroupId,
        rule: &IngressRule,
    ) -> Result<SecurityGroup, ApiError> {
        self.execute_into(
            "authorizeSecurityGroupIngress",
            Params::new()
                .set("securitygroupid", group)
                .set("protocol", &rule.protocol)
                .opt("startport", rule.start_port)
                .opt("endport", rule.end_port)
                .opt("cidrlist", rule.cidr.as_ref()),
            "securitygroup",
        )
        .await
    }
}
