//! Traits tying typed command configs and response DTOs to the lifecycle layer.

use rigger_id::{IdError, RemoteId, ResourceKind, ResourceRef};
use rigger_lifecycle::{DeleteAction, ResourceHandle};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Ordered request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing an earlier value for the same key.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.insert(key, value.to_string());
        self
    }

    /// Set a parameter when the value is present.
    #[must_use]
    pub fn opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    /// Set a comma separated list parameter when the list is not empty.
    #[must_use]
    pub fn list<V: ToString>(self, key: &str, values: &[V]) -> Self {
        if values.is_empty() {
            return self;
        }
        let joined = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.set(key, joined)
    }

    pub fn insert(&mut self, key: &str, value: String) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

impl From<&DeleteAction> for Params {
    fn from(action: &DeleteAction) -> Self {
        Self(
            action
                .params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// A resource DTO as returned by create and list calls.
pub trait RemoteResource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ResourceKind;

    /// Key holding the object array inside list responses.
    const RESPONSE_KEY: &'static str;

    /// Key holding the object in create results, when it differs.
    const CREATE_KEY: &'static str = Self::RESPONSE_KEY;

    const LIST_COMMAND: &'static str;

    /// Raw remote identifier.
    fn id(&self) -> &str;

    fn name(&self) -> Option<&str> {
        None
    }

    /// Resource this one lives inside, when the DTO names it.
    fn parent(&self) -> Option<ResourceRef> {
        None
    }

    /// Command that removes this resource.
    fn delete_action(&self) -> DeleteAction;

    fn remote_id(&self) -> Result<RemoteId, IdError> {
        RemoteId::parse(self.id())
    }

    fn to_ref(&self) -> Result<ResourceRef, IdError> {
        Ok(ResourceRef::new(Self::KIND, self.remote_id()?))
    }
}

/// Typed config for a create command.
pub trait CreateSpec: Send + Sync {
    type Output: RemoteResource;

    const COMMAND: &'static str;

    fn params(&self) -> Params;
}

/// A freshly created resource: the decoded DTO and its teardown handle.
#[derive(Debug, Clone)]
pub struct Created<T> {
    pub resource: T,
    pub handle: ResourceHandle,
}

impl<T: RemoteResource> Created<T> {
    /// Build the handle for `resource`, snapshotting its attributes.
    pub fn new(resource: T, attributes: serde_json::Value) -> Result<Self, IdError> {
        let mut handle =
            ResourceHandle::new(T::KIND, resource.remote_id()?, resource.delete_action())
                .with_attributes(attributes);
        if let Some(name) = resource.name() {
            handle = handle.with_name(name);
        }
        if let Some(parent) = resource.parent() {
            handle = handle.with_parent(parent);
        }
        Ok(Self { resource, handle })
    }
}

/// Filters for list calls.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub id: Option<String>,
    pub name: Option<String>,
    pub account: Option<String>,
    pub domain_id: Option<String>,
    pub zone_id: Option<String>,
    pub state: Option<String>,
    pub keyword: Option<String>,
    /// Include resources of every account the caller can see.
    pub list_all: bool,
    pub extra: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn account(mut self, account: impl Into<String>, domain_id: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self.domain_id = Some(domain_id.into());
        self
    }

    #[must_use]
    pub fn zone(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    #[must_use]
    pub fn list_all(mut self) -> Self {
        self.list_all = true;
        self
    }

    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    pub fn params(&self) -> Params {
        let mut params = Params::new()
            .opt("id", self.id.as_ref())
            .opt("name", self.name.as_ref())
            .opt("account", self.account.as_ref())
            .opt("domainid", self.domain_id.as_ref())
            .opt("zoneid", self.zone_id.as_ref())
            .opt("state", self.state.as_ref())
            .opt("keyword", self.keyword.as_ref());
        if self.list_all {
            params = params.set("listall", true);
        }
        for (k, v) in &self.extra {
            params.insert(k, v.clone());
        }
        params
    }
}
