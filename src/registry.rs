//! Declaration registry.
//!
//! The registry is the queryable index of everything extraction produced for
//! one declaration file: classified structs, enums with derived labels, the
//! bitwise-enum set, and the per-struct size-field maps. Insertion order is
//! declaration order, and emission iterates it directly.

use indexmap::{IndexMap, IndexSet};

use crate::sizemap::SizeFieldMap;
use crate::types::{EnumDecl, StructDecl};

#[derive(Debug, Clone, Default)]
pub struct DeclarationRegistry {
    structs: IndexMap<String, StructDecl>,
    enums: IndexMap<String, EnumDecl>,
    bitwise: IndexSet<String>,
    size_maps: IndexMap<String, SizeFieldMap>,
}

impl DeclarationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_struct(&mut self, decl: StructDecl) {
        self.structs.insert(decl.name.clone(), decl);
    }

    pub fn register_enum(&mut self, decl: EnumDecl) {
        self.enums.insert(decl.name.clone(), decl);
    }

    pub fn get_struct(&self, name: &str) -> Option<&StructDecl> {
        self.structs.get(name)
    }

    pub fn get_enum(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.get(name)
    }

    pub fn contains_struct(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    pub fn contains_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    /// Structs in declaration order.
    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.structs.values()
    }

    /// Enums in declaration order.
    pub fn enums(&self) -> impl Iterator<Item = &EnumDecl> {
        self.enums.values()
    }

    pub fn mark_bitwise(&mut self, name: impl Into<String>) {
        self.bitwise.insert(name.into());
    }

    pub fn is_bitwise(&self, name: &str) -> bool {
        self.bitwise.contains(name)
    }

    pub fn bitwise_enums(&self) -> impl Iterator<Item = &str> {
        self.bitwise.iter().map(String::as_str)
    }

    /// Store a size-field map for `name`. Empty maps are dropped.
    pub fn set_size_map(&mut self, name: impl Into<String>, map: SizeFieldMap) {
        if !map.is_empty() {
            self.size_maps.insert(name.into(), map);
        }
    }

    pub fn size_map(&self, name: &str) -> Option<&SizeFieldMap> {
        self.size_maps.get(name)
    }
}
