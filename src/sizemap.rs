//! Size-field resolver.
//!
//! Counted-array pointer fields do not carry their element count; a sibling
//! integer field does. The pairing is recovered by fuzzy name matching:
//! for each pointer-kind field the closest non-pointer sibling above the
//! similarity floor becomes its count field. A count field backs at most one
//! pointer field (first match wins), and a struct with no pairings gets no
//! map at all.

use indexmap::IndexMap;
use log::{debug, trace};

use crate::config::GeneratorConfig;
use crate::similarity::closest_match;
use crate::types::{FieldKind, StructDecl};

/// Pointer-to-count pairings for one struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeFieldMap {
    /// pointer field name -> count field name
    pub forward: IndexMap<String, String>,
    /// count field name -> pointer field name
    pub inverse: IndexMap<String, String>,
}

impl SizeFieldMap {
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Count field paired with `pointer_field`, if any.
    pub fn count_for(&self, pointer_field: &str) -> Option<&str> {
        self.forward.get(pointer_field).map(String::as_str)
    }

    /// True when `field` is a count field owned by some pointer field.
    pub fn is_count_field(&self, field: &str) -> bool {
        self.inverse.contains_key(field)
    }
}

/// Resolve pointer/count pairings for `decl`.
///
/// Candidates are the non-pointer fields in declaration order; pointer fields
/// are visited in declaration order too, so earlier pointers claim contested
/// count fields first.
pub fn resolve_size_fields(decl: &StructDecl, config: &GeneratorConfig) -> SizeFieldMap {
    let mut map = SizeFieldMap::default();

    for field in &decl.fields {
        if field.kind != FieldKind::Pointer {
            continue;
        }
        let candidates: Vec<&str> = decl
            .fields
            .iter()
            .filter(|f| f.kind != FieldKind::Pointer)
            .map(|f| f.name.as_str())
            .filter(|name| !map.inverse.contains_key(*name))
            .collect();

        let found = closest_match(
            &field.name,
            candidates,
            config.similarity_floor,
            config.similarity,
        );
        match found {
            Some(count) => {
                debug!(
                    "{}: paired pointer field '{}' with count field '{}'",
                    decl.name, field.name, count
                );
                map.forward.insert(field.name.clone(), count.to_string());
                map.inverse.insert(count.to_string(), field.name.clone());
            }
            None => {
                trace!(
                    "{}: pointer field '{}' has no count field, using single-object path",
                    decl.name,
                    field.name
                );
            }
        }
    }

    map
}
