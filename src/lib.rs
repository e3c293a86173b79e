//! # ffi-json-codegen
//!
//! JSON serialization code generator for C-style FFI type declarations. The
//! generator parses declaration sources (structs, enums, unions spelled in
//! Rust FFI syntax), classifies every field, and emits deterministic
//! serialize/deserialize procedures over `serde_json::Value` documents,
//! backed by the crate's own [`runtime`] module.
//!
//! ## Pipeline
//!
//! 1. **Extraction** — `syn` parses the declaration source; registered enums
//!    get evaluated discriminants and derived labels, registered structs get
//!    classified fields.
//! 2. **Classification** — every field is assigned exactly one kind: plain,
//!    string, pointer, interface, bitwise, const array, union member, or
//!    nested struct.
//! 3. **Size-field resolution** — counted-array pointers are paired with
//!    their count fields by fuzzy name matching.
//! 4. **Emission** — per-type codecs with default-value elision, optional
//!    strict key validation, and enum label tables.
//!
//! ## Quick Start
//!
//! ```rust
//! use ffi_json_codegen::CodeGenerator;
//!
//! let mut generator = CodeGenerator::new();
//! generator
//!     .register_struct("SamplerDesc")
//!     .register_enum("FILTER_TYPE");
//!
//! let code = generator
//!     .generate_str(
//!         "sampler",
//!         r#"
//!         #[repr(u32)]
//!         pub enum FILTER_TYPE {
//!             FILTER_TYPE_UNKNOWN = 0,
//!             FILTER_TYPE_POINT,
//!         }
//!
//!         #[repr(C)]
//!         pub struct SamplerDesc {
//!             pub MinFilter: FILTER_TYPE,
//!             pub MipLODBias: f32,
//!         }
//!         "#,
//!     )
//!     .unwrap();
//! assert!(code.contains("pub fn serialize_sampler_desc"));
//! ```
//!
//! Generated units target [`runtime`]: decoded documents allocate their
//! out-of-line data from a [`runtime::DocArena`], and polymorphic interface
//! fields go through the arena's [`runtime::DispatchRegistry`].

pub mod classify;
pub mod config;
mod emit;
pub mod errors;
mod extractor;
pub mod labels;
pub mod registry;
pub mod runtime;
pub mod similarity;
pub mod sizemap;
pub mod types;

mod generator;

pub use config::{ClassifierMode, GeneratorConfig};
pub use extractor::extract;
pub use errors::{CodecError, GenError, GenResult};
pub use generator::CodeGenerator;
pub use types::{EnumConstant, EnumDecl, FieldDescriptor, FieldKind, StructDecl};
