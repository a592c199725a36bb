//! Named component registry shared by parsers, exception mappers, filters
//! and payload serializers.
//!
//! Descriptors refer to these components by stable string ids. A registry is
//! filled once while a client is assembled and then only read.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::DescriptorError;

pub struct ComponentRegistry<T: ?Sized> {
    kind: &'static str,
    entries: HashMap<String, Arc<T>>,
}

impl<T: ?Sized> ComponentRegistry<T> {
    /// `kind` names the component family in error messages ("parser", "filter", ...).
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Register a component, replacing any previous one with the same id.
    pub fn register(&mut self, id: impl Into<String>, component: Arc<T>) -> &mut Self {
        self.entries.insert(id.into(), component);
        self
    }

    pub fn with(mut self, id: impl Into<String>, component: Arc<T>) -> Self {
        self.register(id, component);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Look up `id` on behalf of `operation`.
    pub fn resolve(&self, id: &str, operation: &str) -> Result<Arc<T>, DescriptorError> {
        self.entries.get(id).cloned().ok_or_else(|| {
            let mut known: Vec<&str> = self.entries.keys().map(String::as_str).collect();
            known.sort_unstable();
            DescriptorError::UnknownComponent {
                kind: self.kind,
                id: id.to_string(),
                operation: operation.to_string(),
                hint: None,
            }
            .with_hint(format!("registered {}s: {}", self.kind, known.join(", ")))
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl<T: ?Sized> Clone for ComponentRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            entries: self.entries.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ComponentRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.ids().collect();
        ids.sort_unstable();
        f.debug_struct("ComponentRegistry")
            .field("kind", &self.kind)
            .field("ids", &ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Hello;
    impl Greeter for Hello {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn test_resolve_registered() {
        let registry =
            ComponentRegistry::<dyn Greeter>::new("greeter").with("hello", Arc::new(Hello));
        assert_eq!(registry.resolve("hello", "op").unwrap().greet(), "hello");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_component_names_operation_and_kind() {
        let registry =
            ComponentRegistry::<dyn Greeter>::new("greeter").with("hello", Arc::new(Hello));
        let err = registry.resolve("bye", "servers.list").err().unwrap();
        let text = err.to_string();
        assert!(text.contains("Unknown greeter 'bye'"));
        assert!(text.contains("servers.list"));
        assert!(text.contains("registered greeters: hello"));
    }
}
