//! Data model for classified declarations.
//!
//! The extractor lowers `syn` items into these types once, and every later
//! stage (size-field resolution, label derivation, emission) reads them
//! without mutation. Field order is declaration order everywhere.

use std::fmt;

/// Classification of a struct field. Every field gets exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Scalar, registered enum, or anything with no special handling.
    Plain,
    /// `*const c_char` string.
    String,
    /// Pointer to data (single object, or a counted array when paired with a
    /// size field).
    Pointer,
    /// Pointer to a reference-counted engine object, dispatched by type tag.
    Interface,
    /// Registered enum used as a bit-flag accumulator.
    Bitwise,
    /// Fixed-size inline array `[T; N]`.
    ConstArray,
    /// Member flattened out of an in-file `union` aggregate.
    Union,
    /// Inline value of another registered struct.
    Struct,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Plain => "plain",
            FieldKind::String => "string",
            FieldKind::Pointer => "pointer",
            FieldKind::Interface => "interface",
            FieldKind::Bitwise => "bitwise",
            FieldKind::ConstArray => "const_array",
            FieldKind::Union => "union",
            FieldKind::Struct => "struct",
        };
        f.write_str(name)
    }
}

/// One classified struct field.
///
/// `name` is the document key. `access` is the Rust expression path used in
/// emitted code; it differs from `name` only for union members, which are
/// reached through their owning union field (`"u.Stride"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_spelling: String,
    pub kind: FieldKind,
    pub access: String,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        type_spelling: impl Into<String>,
        kind: FieldKind,
    ) -> Self {
        let name = name.into();
        let access = name.clone();
        Self {
            name,
            type_spelling: type_spelling.into(),
            kind,
            access,
        }
    }

    /// Override the access path (union members only).
    pub fn with_access(mut self, access: impl Into<String>) -> Self {
        self.access = access.into();
        self
    }

    /// Spelling behind one level of pointer indirection, if this is a pointer.
    pub fn pointee(&self) -> Option<&str> {
        strip_pointer(&self.type_spelling)
    }

    /// Element spelling and length for a `[T; N]` field.
    pub fn array_parts(&self) -> Option<(&str, usize)> {
        array_parts(&self.type_spelling)
    }

    /// Type name with all pointer sigils and array brackets stripped.
    pub fn base_type(&self) -> &str {
        let mut s = self.type_spelling.as_str();
        while let Some(inner) = strip_pointer(s) {
            s = inner;
        }
        if let Some((elem, _)) = array_parts(s) {
            s = elem;
        }
        s
    }
}

fn strip_pointer(spelling: &str) -> Option<&str> {
    spelling
        .strip_prefix("*const ")
        .or_else(|| spelling.strip_prefix("*mut "))
        .map(str::trim)
}

fn array_parts(spelling: &str) -> Option<(&str, usize)> {
    let inner = spelling.strip_prefix('[')?.strip_suffix(']')?;
    let (elem, len) = inner.rsplit_once(';')?;
    let len = len.trim().parse().ok()?;
    Some((elem.trim(), len))
}

/// One enum constant with its derived document label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub raw_name: String,
    pub label: String,
    pub value: u32,
}

/// A registered C-style enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub constants: Vec<EnumConstant>,
}

impl EnumDecl {
    pub fn value_of(&self, raw_name: &str) -> Option<u32> {
        self.constants
            .iter()
            .find(|c| c.raw_name == raw_name)
            .map(|c| c.value)
    }
}

/// A registered struct with classified fields and declared bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub bases: Vec<String>,
}

impl StructDecl {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}
