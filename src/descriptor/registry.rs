//! Operation id → descriptor lookup.

use std::collections::HashMap;
use std::sync::Arc;

use super::error::DescriptorError;
use super::manifest::ApiManifest;
use super::model::RequestDescriptor;

/// Read-only after initialization; concurrent lookups need no locking.
#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    descriptors: HashMap<String, Arc<RequestDescriptor>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from every operation in a manifest.
    pub fn from_manifest(manifest: &ApiManifest) -> Result<Self, DescriptorError> {
        let mut registry = Self::new();
        for descriptor in manifest.descriptors()? {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Register a descriptor. Registering the same operation id twice fails.
    pub fn register(&mut self, descriptor: RequestDescriptor) -> Result<(), DescriptorError> {
        if self.descriptors.contains_key(&descriptor.operation) {
            return Err(DescriptorError::DuplicateOperation {
                id: descriptor.operation,
            });
        }
        self.descriptors
            .insert(descriptor.operation.clone(), Arc::new(descriptor));
        Ok(())
    }

    pub fn with(mut self, descriptor: RequestDescriptor) -> Result<Self, DescriptorError> {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Merge another registry into this one; duplicate ids are rejected.
    pub fn extend(&mut self, other: DescriptorRegistry) -> Result<(), DescriptorError> {
        for (id, descriptor) in other.descriptors {
            if self.descriptors.contains_key(&id) {
                return Err(DescriptorError::DuplicateOperation { id });
            }
            self.descriptors.insert(id, descriptor);
        }
        Ok(())
    }

    pub fn describe(&self, operation: &str) -> Result<Arc<RequestDescriptor>, DescriptorError> {
        self.descriptors.get(operation).cloned().ok_or_else(|| {
            let err = DescriptorError::UnknownOperation {
                id: operation.to_string(),
                hint: None,
            };
            match self.closest(operation) {
                Some(near) => err.with_hint(format!("did you mean '{}'?", near)),
                None => err,
            }
        })
    }

    pub fn operations(&self) -> impl Iterator<Item = &RequestDescriptor> {
        self.descriptors.values().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    // Same-prefix suggestion for typos like "drives.lst".
    fn closest(&self, operation: &str) -> Option<&str> {
        let prefix = operation.split('.').next().unwrap_or(operation);
        let mut candidates: Vec<&str> = self
            .descriptors
            .keys()
            .map(String::as_str)
            .filter(|id| id.starts_with(prefix) && id.len().abs_diff(operation.len()) <= 2)
            .collect();
        candidates.sort_unstable();
        candidates.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn descriptor(id: &str) -> RequestDescriptor {
        RequestDescriptor::builder(id, Method::GET)
            .path("/drives/list")
            .build()
            .unwrap()
    }

    #[test]
    fn test_describe_registered() {
        let registry = DescriptorRegistry::new()
            .with(descriptor("drives.list"))
            .unwrap();
        let d = registry.describe("drives.list").unwrap();
        assert_eq!(d.path.as_str(), "/drives/list");
        // shared, not copied
        assert!(Arc::ptr_eq(&d, &registry.describe("drives.list").unwrap()));
    }

    #[test]
    fn test_unknown_operation_fails_fast() {
        let registry = DescriptorRegistry::new()
            .with(descriptor("drives.list"))
            .unwrap();
        let err = registry.describe("drives.lst").unwrap_err();
        assert!(matches!(err, DescriptorError::UnknownOperation { .. }));
        assert!(err.to_string().contains("did you mean 'drives.list'"));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = DescriptorRegistry::new();
        registry.register(descriptor("drives.list")).unwrap();
        assert!(matches!(
            registry.register(descriptor("drives.list")),
            Err(DescriptorError::DuplicateOperation { .. })
        ));
    }
}
