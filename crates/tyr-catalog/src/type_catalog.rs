use std::collections::HashMap;

use smol_str::SmolStr;
use tyr_common::{TyrError, TyrResult};
use tyr_udt::UdtRef;

/// Registered user-defined types of a session, by name.
///
/// Used to resolve descriptor names persisted with a dataset back into
/// descriptors when the dataset is read.
#[derive(Clone, Debug, Default)]
pub struct TypeCatalog {
    types: HashMap<SmolStr, UdtRef>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor.
    ///
    /// Registering the same type again is a no-op. A different type under an
    /// existing name is rejected.
    pub fn register(&mut self, udt: UdtRef) -> TyrResult<()> {
        if let Some(existing) = self.types.get(udt.name()) {
            if existing.sql_type() == udt.sql_type()
                && existing.contains_null() == udt.contains_null()
                && existing.host_type_id() == udt.host_type_id()
            {
                return Ok(());
            }
            return Err(TyrError::Schema(format!(
                "user-defined type '{}' is already registered as {} (host {})",
                udt.name(),
                existing.sql_type(),
                existing.host_class()
            )));
        }
        self.types.insert(SmolStr::new(udt.name()), udt);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&UdtRef> {
        self.types.get(name)
    }

    /// Look up a descriptor, or fail with a schema mismatch naming it.
    pub fn resolve(&self, name: &str) -> TyrResult<UdtRef> {
        self.types.get(name).cloned().ok_or_else(|| {
            TyrError::SchemaMismatch(format!("unknown user-defined type '{name}'"))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(SmolStr::as_str).collect();
        names.sort_unstable();
        names
    }
}
