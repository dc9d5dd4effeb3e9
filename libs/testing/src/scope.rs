//! One registry plus its teardown policy.

use anyhow::{Context, Result};
use rigger_api::{Client, CreateSpec, Created};
use rigger_id::{RemoteId, ResourceRef};
use rigger_lifecycle::{
    CascadePolicy, RegistryError, Registry, ResourceHandle, TeardownError, TeardownReport,
    TeardownSequencer,
};
use tracing::{debug, warn};

/// Tracks everything created within one test (or one suite class) and
/// deletes it newest-first at the end.
#[derive(Debug)]
pub struct TestScope {
    registry: Registry,
    sequencer: TeardownSequencer,
}

impl TestScope {
    pub fn new(label: impl Into<String>, policy: CascadePolicy) -> Self {
        Self {
            registry: Registry::new(label),
            sequencer: TeardownSequencer::new(policy),
        }
    }

    pub fn label(&self) -> &str {
        self.registry.label()
    }

    pub fn policy(&self) -> CascadePolicy {
        self.sequencer.policy()
    }

    /// Change how teardown treats not-found answers. Registered handles stay.
    pub fn set_policy(&mut self, policy: CascadePolicy) {
        self.sequencer = TeardownSequencer::new(policy);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Create a resource and register it for teardown.
    ///
    /// The handle is registered before this returns, so a later failure in
    /// the test still cleans it up. A failed create registers nothing,
    /// unless the resource exists despite the error.
    pub async fn create<S: CreateSpec>(&mut self, client: &Client, spec: &S) -> Result<S::Output> {
        self.create_with_parent(client, spec, None).await
    }

    /// Like [`create`](TestScope::create), recording `parent` as the
    /// resource the new one lives inside.
    pub async fn create_under<S: CreateSpec>(
        &mut self,
        client: &Client,
        spec: &S,
        parent: &ResourceRef,
    ) -> Result<S::Output> {
        self.create_with_parent(client, spec, Some(parent)).await
    }

    async fn create_with_parent<S: CreateSpec>(
        &mut self,
        client: &Client,
        spec: &S,
        parent: Option<&ResourceRef>,
    ) -> Result<S::Output> {
        let with_parent = |handle: ResourceHandle| match parent {
            Some(parent) => handle.with_parent(parent.clone()),
            None => handle,
        };

        let created = match client.create(spec).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(handle) = e.leaked_handle() {
                    self.register(client, with_parent(handle.clone())).await?;
                }
                return Err(e)
                    .with_context(|| format!("{} failed in '{}'", S::COMMAND, self.label()));
            }
        };

        let Created { resource, handle } = created;
        self.register(client, with_parent(handle)).await?;
        Ok(resource)
    }

    /// Append a freshly created handle. A handle the registry refuses is
    /// deleted right away so the resource does not outlive the scope.
    async fn register(&mut self, client: &Client, mut handle: ResourceHandle) -> Result<()> {
        let Some(existing) = self.registry.get(handle.remote_id()) else {
            return self
                .registry
                .append(handle)
                .context("Created resource could not be registered");
        };

        warn!(
            scope = %self.label(),
            resource = %handle.reference(),
            existing = %existing.reference(),
            "Created resource clashes with a registered one, deleting it now"
        );
        if let Err(e) = handle.delete(client).await {
            warn!(
                scope = %self.label(),
                resource = %handle.reference(),
                error = %e,
                "Unregistered resource could not be deleted and may leak"
            );
        }
        self.registry
            .append(handle)
            .context("Created resource could not be registered")
    }

    /// Register a handle built elsewhere.
    pub fn track(&mut self, handle: ResourceHandle) -> Result<(), RegistryError> {
        self.registry.append(handle)
    }

    /// Stop tracking a resource the test deleted itself.
    pub fn forget(&mut self, id: &RemoteId) -> Option<ResourceHandle> {
        let forgotten = self.registry.forget(id);
        if let Some(handle) = &forgotten {
            debug!(scope = %self.label(), resource = %handle.reference(), "Forgot resource");
        }
        forgotten
    }

    /// Delete everything this scope created, newest first.
    pub async fn teardown(&mut self, client: &Client) -> Result<TeardownReport, TeardownError> {
        self.sequencer.run(&mut self.registry, client).await
    }
}
