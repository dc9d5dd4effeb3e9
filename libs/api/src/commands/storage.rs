//! Volumes and snapshots.

use rigger_id::{
    DiskOfferingId, DomainId, ResourceKind, SnapshotId, VirtualMachineId, VolumeId, ZoneId,
};
use rigger_lifecycle::{wait_until, DeleteAction, WaitConfig, WaitError};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::account::Account;
use super::delete_action;
use crate::client::Client;
use crate::de::opt_number;
use crate::error::ApiError;
use crate::resource::{CreateSpec, Params, RemoteResource};

/// Volume states that end an upload or creation unsuccessfully.
const VOLUME_FAILED_STATES: &[&str] = &["UploadError", "UploadAbandoned", "Error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: VolumeId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: String,
    /// Bytes.
    #[serde(default, deserialize_with = "opt_number")]
    pub size: Option<u64>,
    /// `ROOT` or `DATADISK`.
    #[serde(default, rename = "type")]
    pub volume_type: Option<String>,
    #[serde(default, rename = "zoneid")]
    pub zone_id: Option<String>,
    #[serde(default, rename = "virtualmachineid")]
    pub virtual_machine_id: Option<VirtualMachineId>,
    #[serde(default, rename = "diskofferingid")]
    pub disk_offering_id: Option<DiskOfferingId>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default, rename = "domainid")]
    pub domain_id: Option<DomainId>,
}

impl Volume {
    pub fn is_attached(&self) -> bool {
        self.virtual_machine_id.is_some()
    }
}

impl RemoteResource for Volume {
    const KIND: ResourceKind = ResourceKind::Volume;
    const RESPONSE_KEY: &'static str = "volume";
    const LIST_COMMAND: &'static str = "listVolumes";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `createVolume`: an empty data disk.
#[derive(Debug, Clone)]
pub struct CreateVolume {
    pub name: String,
    pub disk_offering_id: DiskOfferingId,
    pub zone_id: ZoneId,
    pub account: Option<String>,
    pub domain_id: Option<DomainId>,
    /// GiB, only for customized offerings.
    pub size: Option<u64>,
}

impl CreateVolume {
    pub fn new(name: impl Into<String>, offering: &DiskOfferingId, zone: &ZoneId) -> Self {
        Self {
            name: name.into(),
            disk_offering_id: offering.clone(),
            zone_id: zone.clone(),
            account: None,
            domain_id: None,
            size: None,
        }
    }

    #[must_use]
    pub fn owned_by(mut self, account: &Account) -> Self {
        self.account = Some(account.name.clone());
        self.domain_id = Some(account.domain_id.clone());
        self
    }

    #[must_use]
    pub fn size_gb(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

impl CreateSpec for CreateVolume {
    type Output = Volume;
    const COMMAND: &'static str = "createVolume";

    fn params(&self) -> Params {
        Params::new()
            .set("name", &self.name)
            .set("diskofferingid", &self.disk_offering_id)
            .set("zoneid", &self.zone_id)
            .opt("account", self.account.as_ref())
            .opt("domainid", self.domain_id.as_ref())
            .opt("size", self.size)
    }
}

/// `uploadVolume`: import a disk image from a URL.
///
/// The volume is returned while the image is still downloading; wait for
/// the `Uploaded` state before attaching it.
#[derive(Debug, Clone)]
pub struct UploadVolume {
    pub name: String,
    pub url: String,
    /// `VHD`, `QCOW2`, `OVA`, `RAW`.
    pub format: String,
    pub zone_id: ZoneId,
    pub account: Option<String>,
    pub domain_id: Option<DomainId>,
    pub checksum: Option<String>,
}

impl UploadVolume {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        format: impl Into<String>,
        zone: &ZoneId,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            format: format.into(),
            zone_id: zone.clone(),
            account: None,
            domain_id: None,
            checksum: None,
        }
    }

    #[must_use]
    pub fn owned_by(mut self, account: &Account) -> Self {
        self.account = Some(account.name.clone());
        self.domain_id = Some(account.domain_id.clone());
        self
    }
}

impl CreateSpec for UploadVolume {
    type Output = Volume;
    const COMMAND: &'static str = "uploadVolume";

    fn params(&self) -> Params {
        Params::new()
            .set("name", &self.name)
            .set("url", &self.url)
            .set("format", &self.format)
            .set("zoneid", &self.zone_id)
            .opt("account", self.account.as_ref())
            .opt("domainid", self.domain_id.as_ref())
            .opt("checksum", self.checksum.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "volumeid")]
    pub volume_id: Option<VolumeId>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "snapshottype")]
    pub snapshot_type: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default, rename = "domainid")]
    pub domain_id: Option<DomainId>,
}

impl RemoteResource for Snapshot {
    const KIND: ResourceKind = ResourceKind::Snapshot;
    const RESPONSE_KEY: &'static str = "snapshot";
    const LIST_COMMAND: &'static str = "listSnapshots";

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn delete_action(&self) -> DeleteAction {
        delete_action(Self::KIND, self.id.as_remote())
    }
}

/// `createSnapshot` of one volume.
#[derive(Debug, Clone)]
pub struct CreateSnapshot {
    pub volume_id: VolumeId,
    pub account: Option<String>,
    pub domain_id: Option<DomainId>,
}

impl CreateSnapshot {
    pub fn of(volume: &VolumeId) -> Self {
        Self {
            volume_id: volume.clone(),
            account: None,
            domain_id: None,
        }
    }
}

impl CreateSpec for CreateSnapshot {
    type Output = Snapshot;
    const COMMAND: &'static str = "createSnapshot";

    fn params(&self) -> Params {
        Params::new()
            .set("volumeid", &self.volume_id)
            .opt("account", self.account.as_ref())
            .opt("domainid", self.domain_id.as_ref())
    }
}

impl Client {
    /// `attachVolume`.
    pub async fn attach_volume(
        &self,
        volume: &VolumeId,
        vm: &VirtualMachineId,
    ) -> Result<Volume, ApiError> {
        let attached: Volume = self
            .execute_into(
                "attachVolume",
                Params::new().set("id", volume).set("virtualmachineid", vm),
                "volume",
            )
            .await?;
        info!(volume = %volume, vm = %vm, "Attached volume");
        Ok(attached)
    }

    /// `detachVolume`.
    pub async fn detach_volume(&self, volume: &VolumeId) -> Result<Volume, ApiError> {
        let detached: Volume = self
            .execute_into("detachVolume", Params::new().set("id", volume), "volume")
            .await?;
        info!(volume = %volume, "Detached volume");
        Ok(detached)
    }

    /// Poll until the volume reports `state`.
    ///
    /// Upload and error states other than `state` abort the wait.
    pub async fn wait_for_volume_state(
        &self,
        volume: &VolumeId,
        state: &str,
        config: &WaitConfig,
    ) -> Result<Volume, ApiError> {
        let what = format!("volume {volume} to be {state}");
        let client = self;

        wait_until(config, &what, move || async move {
            let current = client
                .find::<Volume>(volume.as_str())
                .await?
                .ok_or_else(|| ApiError::Api {
                    command: Volume::LIST_COMMAND.to_string(),
                    status: 404,
                    cs_error_code: None,
                    message: format!("volume {volume} does not exist"),
                })?;

            if current.state.eq_ignore_ascii_case(state) {
                Ok(Some(current))
            } else if VOLUME_FAILED_STATES
                .iter()
                .any(|s| current.state.eq_ignore_ascii_case(s))
            {
                Err(ApiError::decode(
                    Volume::LIST_COMMAND,
                    format!("volume {volume} entered {} state", current.state),
                ))
            } else {
                Ok(None)
            }
        })
        .await
        .map_err(|e| match e {
            WaitError::Timeout { what, elapsed, .. } => ApiError::WaitTimeout { what, elapsed },
            WaitError::Check(e) => e,
        })
    }
}
