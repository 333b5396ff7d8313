// Factory table creating services from the ids used in route files

use std::collections::HashMap;
use std::fmt;

use crate::error::RegistryError;

type Generator<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Maps a generator id to a function producing a fresh service.
///
/// Populated at startup; route files refer to services by id.
pub struct GeneratorRegistry<T> {
    generators: HashMap<String, Generator<T>>,
}

impl<T> GeneratorRegistry<T> {
    pub fn new() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Register `generator` under `id`, replacing any previous one.
    pub fn register<F>(&mut self, id: impl Into<String>, generator: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.generators.insert(id.into(), Box::new(generator));
    }

    pub fn with<F>(mut self, id: impl Into<String>, generator: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(id, generator);
        self
    }

    pub fn create(&self, id: &str) -> Result<T, RegistryError> {
        self.generators
            .get(id)
            .map(|generate| generate())
            .ok_or_else(|| RegistryError::UnknownGenerator(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.generators.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl<T> Default for GeneratorRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for GeneratorRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create() {
        let generators = GeneratorRegistry::new()
            .with("users", || "users".to_string())
            .with("groups", || "groups".to_string());

        assert_eq!(generators.create("users").unwrap(), "users");
        assert!(generators.contains("groups"));
        assert_eq!(generators.ids(), vec!["groups", "users"]);
    }

    #[test]
    fn test_unknown_id() {
        let generators: GeneratorRegistry<u8> = GeneratorRegistry::new();
        assert!(matches!(
            generators.create("missing"),
            Err(RegistryError::UnknownGenerator(id)) if id == "missing"
        ));
    }
}
