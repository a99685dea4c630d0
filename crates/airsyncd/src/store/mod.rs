//! Persistent config store boundary.
//!
//! The agent only ever sees sections and typed options; the on-disk
//! encoding stays behind the [`ConfigStore`] trait. The store has explicit
//! load/unload scoping and must never be held across a netlink wait.

pub mod mem;
pub mod uci_file;

use crate::error::Result;
use std::collections::BTreeMap;

pub use mem::MemStore;
pub use uci_file::UciFileStore;

/// Immutable view of one config section, discarded after translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSnapshot {
    pub name: String,
    pub stype: String,
    options: BTreeMap<String, String>,
}

impl SectionSnapshot {
    pub fn new(name: &str, stype: &str) -> Self {
        Self {
            name: name.to_string(),
            stype: stype.to_string(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.options.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// UCI truthiness: 1/true/yes/on.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)
            .map(|v| matches!(v, "1" | "true" | "yes" | "on"))
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Section/option key-value store grouped by section type.
pub trait ConfigStore: Send {
    /// Acquires the store contents. Must be balanced by [`unload`].
    ///
    /// [`unload`]: ConfigStore::unload
    fn load(&mut self) -> Result<()>;

    /// Looks up one section by name.
    fn section(&self, name: &str) -> Option<SectionSnapshot>;

    /// All sections of the given type, in file order.
    fn sections_of_type(&self, stype: &str) -> Vec<SectionSnapshot>;

    /// Stages option values on an existing section.
    fn set_options(&mut self, section: &str, options: &[(String, String)]) -> Result<()>;

    /// Persists staged changes.
    fn commit(&mut self) -> Result<()>;

    /// Releases the store contents, discarding anything uncommitted.
    fn unload(&mut self);
}

// Lets a caller keep a handle on the store it hands the agent.
impl<S: ConfigStore> ConfigStore for std::sync::Arc<std::sync::Mutex<S>> {
    fn load(&mut self) -> Result<()> {
        self.lock()
            .map_err(|_| crate::error::AgentError::Store("store lock poisoned".to_string()))?
            .load()
    }

    fn section(&self, name: &str) -> Option<SectionSnapshot> {
        self.lock().ok().and_then(|s| s.section(name))
    }

    fn sections_of_type(&self, stype: &str) -> Vec<SectionSnapshot> {
        self.lock()
            .map(|s| s.sections_of_type(stype))
            .unwrap_or_default()
    }

    fn set_options(&mut self, section: &str, options: &[(String, String)]) -> Result<()> {
        self.lock()
            .map_err(|_| crate::error::AgentError::Store("store lock poisoned".to_string()))?
            .set_options(section, options)
    }

    fn commit(&mut self) -> Result<()> {
        self.lock()
            .map_err(|_| crate::error::AgentError::Store("store lock poisoned".to_string()))?
            .commit()
    }

    fn unload(&mut self) {
        if let Ok(mut s) = self.lock() {
            s.unload();
        }
    }
}
