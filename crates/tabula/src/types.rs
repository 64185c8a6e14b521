//! Native type resolution overrides.

use crate::value::ValueKind;
use std::collections::HashMap;
use std::sync::RwLock;

/// Resolved host-side type of a column or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClrType {
    pub kind: ValueKind,
    pub nullable: bool,
}

impl ClrType {
    pub fn new(kind: ValueKind, nullable: bool) -> Self {
        Self { kind, nullable }
    }
}

/// Runtime overrides from native type name to [`ValueKind`].
///
/// Consulted by [`SchemaCache::to_value_kind`](crate::SchemaCache::to_value_kind)
/// before the dialect's built-in table. Keys are case-insensitive.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: RwLock<HashMap<String, ValueKind>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an override. Returns the previous kind, if any.
    pub fn register(&self, native_type: &str, kind: ValueKind) -> Option<ValueKind> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(native_type.to_lowercase(), kind)
    }

    /// Remove an override. Returns the removed kind, if any.
    pub fn unregister(&self, native_type: &str) -> Option<ValueKind> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(&native_type.to_lowercase())
    }

    pub fn get(&self, native_type: &str) -> Option<ValueKind> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&native_type.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister_are_case_insensitive() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.register("CITEXT", ValueKind::String), None);
        assert_eq!(reg.get("citext"), Some(ValueKind::String));
        assert_eq!(reg.register("citext", ValueKind::Json), Some(ValueKind::String));
        assert_eq!(reg.unregister("Citext"), Some(ValueKind::Json));
        assert!(reg.is_empty());
    }
}
