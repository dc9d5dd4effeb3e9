//! Stateful fake of the management API.
//!
//! [`FakeCloud`] runs a wiremock server whose single responder keeps an
//! in-memory control plane. It verifies request signatures, runs async
//! jobs, cascades account and domain deletes, and refuses deletes that a
//! real cloud would refuse (a network with VMs on it, an attached volume).
//! Scenario tests use it to exercise teardown ordering end to end without
//! a live environment.

mod state;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use rigger_api::{Client, ClientConfig, Principal};
use rigger_id::{
    DiskOfferingId, DomainId, IdError, NetworkOfferingId, RemoteId, ResourceKind,
    ServiceOfferingId, TemplateId, VpcOfferingId, ZoneId,
};
use rigger_lifecycle::CascadePolicy;
use serde_json::{json, Value};
use tracing::debug;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::environment::TestEnvironment;
use state::{CloudState, KeyOwner, ROOT_DOMAIN};

pub use state::{FailureRule, RecordedCall};

const API_PATH: &str = "/client/api";
const ADMIN_KEY: &str = "fake-admin-key";
const ADMIN_SECRET: &str = "fake-admin-secret";

struct CloudResponder {
    state: Arc<Mutex<CloudState>>,
}

impl Respond for CloudResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let params: BTreeMap<String, String> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let (command, (status, body)) = lock(&self.state).handle(params);
        debug!(command = %command, status, "Fake cloud answered");

        let envelope = format!("{}response", command.to_lowercase());
        ResponseTemplate::new(status).set_body_json(json!({ envelope: body }))
    }
}

fn lock(state: &Mutex<CloudState>) -> MutexGuard<'_, CloudState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// IDs of the objects every fake starts with.
#[derive(Debug, Clone)]
pub struct Fixtures {
    pub zone_id: ZoneId,
    pub root_domain_id: DomainId,
    pub template_id: TemplateId,
    pub service_offering_id: ServiceOfferingId,
    pub disk_offering_id: DiskOfferingId,
    pub network_offering_id: NetworkOfferingId,
    pub vpc_offering_id: VpcOfferingId,
}

impl Fixtures {
    fn seeded() -> Result<Self, IdError> {
        Ok(Self {
            zone_id: ZoneId::parse("zone-1")?,
            root_domain_id: DomainId::parse(ROOT_DOMAIN)?,
            template_id: TemplateId::parse("tmpl-builtin")?,
            service_offering_id: ServiceOfferingId::parse("so-small")?,
            disk_offering_id: DiskOfferingId::parse("do-small")?,
            network_offering_id: NetworkOfferingId::parse("no-isolated")?,
            vpc_offering_id: VpcOfferingId::parse("vo-default")?,
        })
    }
}

/// In-memory cloud behind a local HTTP endpoint.
pub struct FakeCloud {
    server: MockServer,
    state: Arc<Mutex<CloudState>>,
    fixtures: Fixtures,
}

impl FakeCloud {
    pub async fn start() -> Result<Self> {
        let fixtures = Fixtures::seeded().context("Invalid fixture ID")?;
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(CloudState::new(ADMIN_KEY, ADMIN_SECRET)));

        Mock::given(method("GET"))
            .and(path(API_PATH))
            .respond_with(CloudResponder {
                state: Arc::clone(&state),
            })
            .mount(&server)
            .await;

        Ok(Self {
            server,
            state,
            fixtures,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{API_PATH}", self.server.uri())
    }

    pub fn admin(&self) -> Principal {
        Principal::new(ADMIN_KEY, ADMIN_SECRET).named("admin")
    }

    /// Admin client with fast job polling.
    pub fn client(&self) -> Result<Client> {
        let config = ClientConfig::new(&self.endpoint(), self.admin())?
            .with_async_polling(Duration::from_millis(5), Duration::from_secs(10));
        Client::new(config).context("Failed to build client for fake cloud")
    }

    pub fn fixtures(&self) -> &Fixtures {
        &self.fixtures
    }

    /// Environment pointing at this fake, with its seeded fixtures.
    pub fn environment(&self, policy: CascadePolicy) -> TestEnvironment {
        let f = &self.fixtures;
        TestEnvironment {
            endpoint: self.endpoint(),
            api_key: ADMIN_KEY.to_string(),
            secret_key: ADMIN_SECRET.to_string(),
            zone_id: f.zone_id.clone(),
            template_id: f.template_id.clone(),
            service_offering_id: f.service_offering_id.clone(),
            network_offering_id: f.network_offering_id.clone(),
            vpc_offering_id: Some(f.vpc_offering_id.clone()),
            disk_offering_id: Some(f.disk_offering_id.clone()),
            cascade_policy: policy,
            report_dir: None,
            async_poll_ms: 5,
            async_timeout_secs: 10,
        }
    }

    /// Number of `queryAsyncJobResult` polls that report a job as pending.
    pub fn set_job_polls(&self, polls: u32) {
        lock(&self.state).job_polls = polls;
    }

    pub fn set_verify_signatures(&self, verify: bool) {
        lock(&self.state).verify_signatures = verify;
    }

    /// Fail every delete of `id` with a server error.
    pub fn fail_delete(&self, id: &str, message: &str) {
        let mut state = lock(&self.state);
        let (Some(object), Ok(remote)) = (state.objects.get(id), RemoteId::parse(id)) else {
            return;
        };
        let action = rigger_api::commands::delete_action(object.kind, &remote);
        let target = action
            .params
            .get("id")
            .or_else(|| action.params.get("name"))
            .cloned()
            .unwrap_or_else(|| id.to_string());
        state.failures.push(FailureRule {
            command: action.command,
            target: Some(target),
            status: 530,
            message: message.to_string(),
            remaining: None,
        });
    }

    /// Fail the next call of `command`.
    pub fn fail_next(&self, command: &str, status: u16, message: &str) {
        lock(&self.state).failures.push(FailureRule {
            command: command.to_string(),
            target: None,
            status,
            message: message.to_string(),
            remaining: Some(1),
        });
    }

    pub fn add_failure(&self, rule: FailureRule) {
        lock(&self.state).failures.push(rule);
    }

    pub fn clear_failures(&self) {
        lock(&self.state).failures.clear();
    }

    /// Delete an object without going through the API, as another actor would.
    pub fn remove_behind_back(&self, id: &str) -> bool {
        lock(&self.state).remove(id).is_some()
    }

    /// Register an API key for `account` in `domain`.
    pub fn add_user_key(&self, api_key: &str, secret: &str, account: &str, domain: &DomainId) {
        lock(&self.state).insert_key(
            api_key.to_string(),
            KeyOwner {
                secret: secret.to_string(),
                account: Some((account.to_string(), domain.as_str().to_string())),
            },
        );
    }

    pub fn exists(&self, id: &str) -> bool {
        lock(&self.state).objects.contains_key(id)
    }

    /// Number of live objects of `kind`, seeded fixtures included.
    pub fn count(&self, kind: ResourceKind) -> usize {
        lock(&self.state)
            .objects
            .values()
            .filter(|o| o.kind == kind)
            .count()
    }

    /// Stored attributes of an object.
    pub fn object(&self, id: &str) -> Option<Value> {
        lock(&self.state)
            .objects
            .get(id)
            .map(|o| Value::Object(o.attrs.clone()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state).calls.clone()
    }

    /// Targets of every delete command received, in arrival order.
    pub fn delete_calls(&self) -> Vec<String> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.is_delete())
            .filter_map(|c| c.target().map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rigger_api::commands::{CreateAccount, Domain, VirtualMachine};
    use rigger_api::{ApiError, ListQuery};

    use super::*;

    #[tokio::test]
    async fn test_signed_client_round_trip() {
        let cloud = FakeCloud::start().await.unwrap();
        let client = cloud.client().unwrap();

        let domains: Vec<Domain> = client.list(&ListQuery::new().list_all()).await.unwrap();
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].name, "ROOT");

        let vms: Vec<VirtualMachine> = client.list(&ListQuery::new()).await.unwrap();
        assert!(vms.is_empty());
    }

    #[tokio::test]
    async fn test_bad_signature_is_rejected() {
        let cloud = FakeCloud::start().await.unwrap();
        let forged = cloud
            .client()
            .unwrap()
            .acting_as(&Principal::new(ADMIN_KEY, "wrong-secret"));

        let err = forged.list::<Domain>(&ListQuery::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let cloud = FakeCloud::start().await.unwrap();
        let client = cloud.client().unwrap();
        cloud.fail_next("createAccount", 530, "management server busy");

        let err = client
            .create(&CreateAccount::user("carol", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 530, .. }));

        let created = client.create(&CreateAccount::user("carol", "pw")).await.unwrap();
        assert!(cloud.exists(created.resource.id.as_str()));
        assert_eq!(cloud.count(ResourceKind::User), 1);
    }
}
