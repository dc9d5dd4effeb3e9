//! Ordered registry of handles for one test scope.

use rigger_id::RemoteId;
use tracing::debug;

use crate::error::RegistryError;
use crate::handle::ResourceHandle;

/// Ordered collection of handles, oldest first.
///
/// Append-only while the scope is alive; [`drain`](Registry::drain) hands the
/// handles out newest-first and leaves the registry empty.
#[derive(Debug, Default)]
pub struct Registry {
    label: String,
    handles: Vec<ResourceHandle>,
}

impl Registry {
    /// Create an empty registry. The label names the scope in logs.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            handles: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Register a handle at the end of the registry.
    ///
    /// Rejects a second handle with the same remote ID.
    pub fn append(&mut self, handle: ResourceHandle) -> Result<(), RegistryError> {
        if let Some(existing) = self.get(handle.remote_id()) {
            return Err(RegistryError::Duplicate {
                label: self.label.clone(),
                existing: existing.reference().clone(),
                rejected: handle.reference().clone(),
            });
        }

        debug!(
            scope = %self.label,
            resource = %handle.reference(),
            order = handle.creation_order(),
            "Registered resource"
        );
        self.handles.push(handle);
        Ok(())
    }

    /// Take every handle out, newest first.
    pub fn drain(&mut self) -> Vec<ResourceHandle> {
        let mut drained = std::mem::take(&mut self.handles);
        drained.reverse();
        drained
    }

    /// Stop tracking a resource the test already deleted itself.
    pub fn forget(&mut self, remote_id: &RemoteId) -> Option<ResourceHandle> {
        let pos = self
            .handles
            .iter()
            .position(|h| h.remote_id() == remote_id)?;
        Some(self.handles.remove(pos))
    }

    pub fn get(&self, remote_id: &RemoteId) -> Option<&ResourceHandle> {
        self.handles.iter().find(|h| h.remote_id() == remote_id)
    }

    pub fn contains(&self, remote_id: &RemoteId) -> bool {
        self.get(remote_id).is_some()
    }

    /// Iterate in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceHandle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rigger_id::ResourceKind;

    use super::*;
    use crate::handle::tests::handle;

    #[test]
    fn test_drain_reverses_creation_order() {
        let mut registry = Registry::new("test");
        registry.append(handle(ResourceKind::Account, "a")).unwrap();
        registry.append(handle(ResourceKind::Network, "n")).unwrap();
        registry
            .append(handle(ResourceKind::VirtualMachine, "v"))
            .unwrap();

        let ids: Vec<_> = registry
            .drain()
            .iter()
            .map(|h| h.remote_id().to_string())
            .collect();
        assert_eq!(ids, vec!["v", "n", "a"]);
    }

    #[test]
    fn test_redrain_is_empty() {
        let mut registry = Registry::new("test");
        registry.append(handle(ResourceKind::Volume, "vol")).unwrap();

        assert_eq!(registry.drain().len(), 1);
        assert!(registry.drain().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_remote_id_rejected() {
        let mut registry = Registry::new("class");
        registry.append(handle(ResourceKind::Account, "same")).unwrap();

        let err = registry
            .append(handle(ResourceKind::Account, "same"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_forget_removes_handle() {
        let mut registry = Registry::new("test");
        registry.append(handle(ResourceKind::Snapshot, "s1")).unwrap();
        registry.append(handle(ResourceKind::Snapshot, "s2")).unwrap();

        let id = RemoteId::parse("s1").unwrap();
        assert!(registry.forget(&id).is_some());
        assert!(!registry.contains(&id));
        assert!(registry.forget(&id).is_none());
        assert_eq!(registry.len(), 1);
    }

    proptest! {
        #[test]
        fn drain_is_exact_reverse(n in 0usize..40) {
            let mut registry = Registry::new("prop");
            let mut orders = Vec::new();
            for i in 0..n {
                let h = handle(ResourceKind::Volume, &format!("vol-{i}"));
                orders.push(h.creation_order());
                registry.append(h).unwrap();
            }

            let drained: Vec<u64> = registry.drain().iter().map(|h| h.creation_order()).collect();
            orders.reverse();
            prop_assert_eq!(drained, orders);
            prop_assert!(registry.drain().is_empty());
        }
    }
}
