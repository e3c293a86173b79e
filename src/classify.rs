//! Field classifier.
//!
//! Assigns every struct field exactly one [`FieldKind`], with a strict rule
//! precedence: string, interface, union flattening, fixed array, bitwise,
//! pointer, registered struct, plain. The classifier is a pure function of
//! the lowered field plus the registered-name sets and the bitwise-enum set;
//! it never consults the document format or the emitter.

use indexmap::{IndexMap, IndexSet};

use crate::config::{ClassifierMode, GeneratorConfig};
use crate::types::{FieldDescriptor, FieldKind};

/// A field as lowered from `syn`, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub ty: RawType,
}

/// Shape of a lowered field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawType {
    /// `*const T` / `*mut T`; `pointee` is the full inner spelling, which may
    /// itself be a pointer (`*const c_char` for `ppNames`).
    Pointer { is_const: bool, pointee: String },
    /// `[T; N]`.
    Array { elem: String, len: usize },
    /// A bare type name.
    Named { name: String },
}

impl RawType {
    pub fn spelling(&self) -> String {
        match self {
            RawType::Pointer { is_const, pointee } => {
                if *is_const {
                    format!("*const {pointee}")
                } else {
                    format!("*mut {pointee}")
                }
            }
            RawType::Array { elem, len } => format!("[{elem}; {len}]"),
            RawType::Named { name } => name.clone(),
        }
    }

    /// Innermost type name, with pointer sigils stripped.
    fn base_name(&self) -> &str {
        match self {
            RawType::Pointer { pointee, .. } => {
                let mut s = pointee.as_str();
                while let Some(rest) = s
                    .strip_prefix("*const ")
                    .or_else(|| s.strip_prefix("*mut "))
                {
                    s = rest.trim();
                }
                s
            }
            RawType::Array { elem, .. } => elem,
            RawType::Named { name } => name,
        }
    }
}

/// Everything classification needs besides the field itself.
pub struct ClassifyContext<'a> {
    pub config: &'a GeneratorConfig,
    /// Enums observed as bit-flag accumulators in function signatures.
    pub bitwise: &'a IndexSet<String>,
    /// Unions declared in the same file, with their lowered members.
    pub unions: &'a IndexMap<String, Vec<RawField>>,
}

/// Engine-object interface naming pattern: `I` followed by an uppercase
/// letter, with at least one lowercase letter after it.
pub fn is_interface_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I')
        && chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.any(|c| c.is_ascii_lowercase())
}

/// Classify one field.
///
/// Returns no descriptors when the field is excluded from the schema, one for
/// the common case, and one per member when the field is a union aggregate
/// that gets flattened into the parent.
pub fn classify_field(field: &RawField, ctx: &ClassifyContext<'_>) -> Vec<FieldDescriptor> {
    let spelling = field.ty.spelling();

    if let RawType::Pointer { is_const, pointee } = &field.ty {
        if *is_const && matches!(pointee.as_str(), "c_char" | "i8") {
            return vec![FieldDescriptor::new(&field.name, spelling, FieldKind::String)];
        }
        if is_interface_name(field.ty.base_name()) && pointee_is_direct(pointee) {
            return match ctx.config.mode {
                ClassifierMode::Interface => {
                    vec![FieldDescriptor::new(
                        &field.name,
                        spelling,
                        FieldKind::Interface,
                    )]
                }
                ClassifierMode::PointerOnly => vec![],
            };
        }
    }

    if let RawType::Named { name } = &field.ty {
        if let Some(members) = ctx.unions.get(name) {
            return members
                .iter()
                .map(|member| {
                    FieldDescriptor::new(
                        &member.name,
                        member.ty.spelling(),
                        FieldKind::Union,
                    )
                    .with_access(format!("{}.{}", field.name, member.name))
                })
                .collect();
        }
    }

    let kind = match &field.ty {
        RawType::Array { .. } => FieldKind::ConstArray,
        RawType::Named { name }
            if ctx.bitwise.contains(name) && ctx.config.is_registered_enum(name) =>
        {
            FieldKind::Bitwise
        }
        RawType::Pointer { .. } => FieldKind::Pointer,
        RawType::Named { name } if ctx.config.is_registered_struct(name) => FieldKind::Struct,
        RawType::Named { .. } => FieldKind::Plain,
    };

    vec![FieldDescriptor::new(&field.name, spelling, kind)]
}

/// True when the pointee is the named type itself, not another pointer.
fn pointee_is_direct(pointee: &str) -> bool {
    !pointee.starts_with('*')
}
