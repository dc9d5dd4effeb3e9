//! Compute, disk, network and VPC offerings.

use rigger_id::{
    DiskOfferingId, NetworkOfferingId, ResourceKind, ServiceOfferingId, VpcOfferingId,
};
use rigger_lifecycle::DeleteAction;
use serde::{Deserialize, Serialize};

use super::delete_action;
use crate::de::{lenient_bool, opt_number};
use crate::resource::{CreateSpec, Params, RemoteResource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: ServiceOfferingId,
    pub name: String,
    #[serde(default, rename = "displaytext")]
    pub display_text: Option<String>,
    #[serde(default, rename = "cpunumber", deserialize_with = "opt_number")]
    pub cpu_number: Option<u32>,
    #[serde(default, rename = "cpuspeed", deserialize_with = "opt_number")]
    pub cpu_speed: Option<u32>,
    #[serde(default, deserialize_with = "opt_number")]
    pub memory: Option<u32>,
    #[serde(default, rename = "storagetype")]
    pub storage_type: Option<String>,
    #[serde(default, rename = "offerha", deserialize_with = "lenient_bool")]
    pub offer_ha: bool,
}

impl RemoteResource for ServiceOffering {
    const KIND: ResourceKind = ResourceKind::ServiceOffering;
    const RESPONSE_KEY: &'static str = "serviceoffering";
    const LIST_COMMAND: &'static str = "listServiceOfferings";

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

/// `createServiceOffering`.
#[derive(Debug, Clone)]
pub struct CreateServiceOffering {
    pub name: String,
    pub display_text: String,
    pub cpu_number: u32,
    /// MHz.
    pub cpu_speed: u32,
    /// MiB.
    pub memory: u32,
    /// `shared` or `local`.
    pub storage_type: Option<String>,
    pub offer_ha: bool,
    pub limit_cpu_use: bool,
}

impl CreateServiceOffering {
    pub fn new(name: impl Into<String>, cpu_number: u32, cpu_speed: u32, memory: u32) -> Self {
        let name = name.into();
        Self {
            display_text: name.clone(),
            name,
            cpu_number,
            cpu_speed,
            memory,
            storage_type: None,
            offer_ha: false,
            limit_cpu_use: false,
        }
    }
}

impl CreateSpec for CreateServiceOffering {
    type Output = ServiceOffering;
    const COMMAND: &'static str = "createServiceOffering";

    fn params(&self) -> Params {
        Params::new()
            .set("name", &self.name)
            .set("displaytext", &self.display_text)
            .set("cpunumber", self.cpu_number)
            .set("cpuspeed", self.cpu_speed)
            .set("memory", self.memory)
            .opt("storagetype", self.storage_type.as_ref())
            .set("offerha", self.offer_ha)
            .set("limitcpuuse", self.limit_cpu_use)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskOffering {
    pub id: DiskOfferingId,
    pub name: String,
    #[serde(default, rename = "displaytext")]
    pub display_text: Option<String>,
    /// GiB.
    #[serde(default, rename = "disksize", deserialize_with = "opt_number")]
    pub disk_size: Option<u64>,
    #[serde(default, rename = "iscustomized", deserialize_with = "lenient_bool")]
    pub customized: bool,
}

impl RemoteResource for DiskOffering {
    const KIND: ResourceKind = ResourceKind::DiskOffering;
    const RESPONSE_KEY: &'static str = "diskoffering";
    const LIST_COMMAND: &'static str = "listDiskOfferings";

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

/// `createDiskOffering`. Either a fixed size or customized at volume creation.
#[derive(Debug, Clone)]
pub struct CreateDiskOffering {
    pub name: String,
    pub display_text: String,
    pub disk_size: Option<u64>,
    pub customized: bool,
}

impl CreateDiskOffering {
    pub fn fixed(name: impl Into<String>, disk_size_gb: u64) -> Self {
        let name = name.into();
        Self {
            display_text: name.clone(),
            name,
            disk_size: Some(disk_size_gb),
            customized: false,
        }
    }

    pub fn customized(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_text: name.clone(),
            name,
            disk_size: None,
            customized: true,
        }
    }
}

impl CreateSpec for CreateDiskOffering {
    type Output = DiskOffering;
    const COMMAND: &'static str = "createDiskOffering";

    fn params(&self) -> Params {
        let params = Params::new()
            .set("name", &self.name)
            .set("displaytext", &self.display_text)
            .opt("disksize", self.disk_size);
        if self.customized {
            params.set("customized", true)
        } else {
            params
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkOffering {
    pub id: NetworkOfferingId,
    pub name: String,
    #[serde(default, rename = "guestiptype")]
    pub guest_ip_type: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "forvpc", deserialize_with = "lenient_bool")]
    pub for_vpc: bool,
}

impl RemoteResource for NetworkOffering {
    const KIND: ResourceKind = ResourceKind::NetworkOffering;
    const RESPONSE_KEY: &'static str = "networkoffering";
    const LIST_COMMAND: &'static str = "listNetworkOfferings";

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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcOffering {
    pub id: VpcOfferingId,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl RemoteResource for VpcOffering {
    const KIND: ResourceKind = ResourceKind::VpcOffering;
    const RESPONSE_KEY: &'static str = "vpcoffering";
    const LIST_COMMAND: &'static str = "listVPCOfferings";

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

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_service_offering_params() {
        let params = CreateServiceOffering::new("tiny", 1, 100, 128).params();
        assert_eq!(params.get("cpunumber"), Some("1"));
        assert_eq!(params.get("memory"), Some("128"));
        assert_eq!(params.get("offerha"), Some("false"));
        assert_eq!(params.get("displaytext"), Some("tiny"));
    }

    #[test]
    fn test_disk_offering_variants() {
        let fixed = CreateDiskOffering::fixed("small", 1).params();
        assert_eq!(fixed.get("disksize"), Some("1"));
        assert_eq!(fixed.get("customized"), None);

        let custom = CreateDiskOffering::customized("custom").params();
        assert_eq!(custom.get("disksize"), None);
        assert_eq!(custom.get("customized"), Some("true"));
    }

    #[test]
    fn test_decode_string_numbers() {
        let offering: ServiceOffering = serde_json::from_value(json!({
            "id": "so-1",
            "name": "tiny",
            "cpunumber": "1",
            "memory": 128,
            "offerha": "false"
        }))
        .unwrap();
        assert_eq!(offering.cpu_number, Some(1));
        assert_eq!(offering.memory, Some(128));
        assert!(!offering.offer_ha);
    }
}
