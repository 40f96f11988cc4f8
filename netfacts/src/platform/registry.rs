//! Global platform registry for looking up platform definitions.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};

static REGISTRY: Lazy<RwLock<PlatformRegistry>> = Lazy::new(|| {
    let mut registry = PlatformRegistry::new();
    registry.register_builtin_platforms();
    RwLock::new(registry)
});

/// Registry for platform definitions.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// The process-wide registry, holding the built-in platforms.
    pub fn global() -> &'static RwLock<PlatformRegistry> {
        &REGISTRY
    }

    /// Look up `name` in the global registry.
    pub fn lookup(name: &str) -> Result<PlatformDefinition> {
        let registry = REGISTRY.read().map_err(|_| PlatformError::InvalidDefinition {
            message: "platform registry lock poisoned".into(),
        })?;
        registry.get(name).cloned().ok_or_else(|| {
            PlatformError::UnknownPlatform {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn register_builtin_platforms(&mut self) {
        let ocnos = vendors::ocnos::platform();
        self.platforms.insert(ocnos.name.clone(), ocnos);
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::AlreadyRegistered {
                name: platform.name.clone(),
            }
            .into());
        }
        platform.validate()?;
        self.platforms.insert(platform.name.clone(), platform);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    /// List all registered platform names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.platforms.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_global_has_ocnos() {
        let platform = PlatformRegistry::lookup("ocnos").unwrap();
        assert_eq!(platform.default_privilege, "privileged");
        assert!(PlatformRegistry::global().read().unwrap().contains("ocnos"));
    }

    #[test]
    fn test_unknown_platform() {
        let err = PlatformRegistry::lookup("junos").unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::UnknownPlatform { name }) if name == "junos"
        ));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = PlatformRegistry::new();
        registry.register(vendors::ocnos::platform()).unwrap();
        assert!(registry.register(vendors::ocnos::platform()).is_err());
        assert_eq!(registry.names().count(), 1);
    }

    #[test]
    fn test_register_validates() {
        let mut registry = PlatformRegistry::new();
        assert!(registry.register(PlatformDefinition::new("bare")).is_err());
        assert!(!registry.contains("bare"));
    }
}
