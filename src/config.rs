//! Generator configuration.
//!
//! All run-wide knobs live here: the allow-lists that decide which
//! declarations participate, the registered-base field table, the classifier
//! mode, key-validation policy, and the fuzzy-matching parameters used by the
//! size-field resolver.

use indexmap::{IndexMap, IndexSet};

use crate::similarity::{similarity_ratio, SimilarityFn};
use crate::types::FieldDescriptor;

/// How interface-pattern pointer fields are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierMode {
    /// Interface pointers get their own kind and go through the dispatch
    /// registry.
    Interface,
    /// Interface pointers are excluded from the schema entirely.
    PointerOnly,
}

/// Run-wide configuration consumed by every pipeline stage.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Struct names the generator emits codecs for. Names not listed are
    /// treated as opaque.
    pub structs: IndexSet<String>,
    /// Enum names the generator emits label tables for.
    pub enums: IndexSet<String>,
    /// Base structs that may appear in `#[extends(...)]` without being
    /// declared in the scanned sources. Each contributes one injected field
    /// to its deriving structs.
    pub base_fields: IndexMap<String, FieldDescriptor>,
    pub mode: ClassifierMode,
    /// Emit subset-of-known-keys validation into decode procedures.
    pub strict_keys: bool,
    /// Keys accepted by strict validation beyond a struct's own fields.
    pub extra_allowed_keys: IndexMap<String, Vec<String>>,
    /// Minimum similarity ratio for a pointer/count pairing.
    pub similarity_floor: f64,
    pub similarity: SimilarityFn,
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self {
            structs: IndexSet::new(),
            enums: IndexSet::new(),
            base_fields: IndexMap::new(),
            mode: ClassifierMode::PointerOnly,
            strict_keys: true,
            extra_allowed_keys: IndexMap::new(),
            similarity_floor: 0.6,
            similarity: similarity_ratio,
        }
    }

    pub fn register_struct(&mut self, name: impl Into<String>) -> &mut Self {
        self.structs.insert(name.into());
        self
    }

    pub fn register_enum(&mut self, name: impl Into<String>) -> &mut Self {
        self.enums.insert(name.into());
        self
    }

    /// Register a base struct that is configured rather than declared.
    pub fn register_base(
        &mut self,
        name: impl Into<String>,
        injected: FieldDescriptor,
    ) -> &mut Self {
        self.base_fields.insert(name.into(), injected);
        self
    }

    /// Accept an extra key during strict validation of `type_name` objects.
    pub fn allow_extra_key(
        &mut self,
        type_name: impl Into<String>,
        key: impl Into<String>,
    ) -> &mut Self {
        self.extra_allowed_keys
            .entry(type_name.into())
            .or_default()
            .push(key.into());
        self
    }

    pub fn is_registered_struct(&self, name: &str) -> bool {
        self.structs.contains(name)
    }

    pub fn is_registered_enum(&self, name: &str) -> bool {
        self.enums.contains(name)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new()
    }
}
