//! Code emission.
//!
//! Turns a populated [`DeclarationRegistry`] into Rust source text: one label
//! table and codec wrapper pair per enum, one serialize/deserialize pair per
//! struct, plus the shared common unit. Output is deterministic: declaration
//! order in, identical text out.

use crate::config::GeneratorConfig;
use crate::errors::{GenError, GenResult};
use crate::registry::DeclarationRegistry;
use crate::sizemap::SizeFieldMap;
use crate::types::{EnumDecl, FieldDescriptor, FieldKind, StructDecl};

const DEFAULT_HEADER: &str = "Auto-generated by ffi-json-codegen\nDO NOT EDIT MANUALLY";

/// Indentation-tracking text sink for emitted source.
pub(crate) struct SourceWriter {
    buf: String,
    indent: usize,
}

impl SourceWriter {
    pub(crate) fn new() -> Self {
        Self {
            buf: String::new(),
            indent: 0,
        }
    }

    pub(crate) fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.buf.push_str("    ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Write a line and indent the following ones.
    pub(crate) fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    /// Dedent and write a closing line.
    pub(crate) fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    pub(crate) fn finish(mut self) -> String {
        while self.buf.ends_with("\n\n") {
            self.buf.pop();
        }
        self.buf
    }
}

/// PascalCase or SCREAMING_SNAKE name to snake_case.
pub(crate) fn to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_uppercase() {
            out.push(c);
            continue;
        }
        let boundary = match chars.get(i.wrapping_sub(1)) {
            Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
            Some(p) if p.is_ascii_uppercase() => {
                chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase())
            }
            _ => false,
        };
        if boundary {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Emit the codec unit for one declaration module.
pub(crate) fn emit_unit(
    module: &str,
    registry: &DeclarationRegistry,
    config: &GeneratorConfig,
    header: Option<&str>,
) -> GenResult<String> {
    let mut w = SourceWriter::new();
    emit_header(&mut w, header);
    w.line("use super::common_codec::*;");
    w.line(&format!("use super::{module}::*;"));
    w.blank();

    for decl in registry.enums() {
        emit_enum(&mut w, decl);
        w.blank();
    }
    for decl in registry.structs() {
        emit_struct(&mut w, decl, registry, config)?;
        w.blank();
    }

    Ok(w.finish())
}

/// Emit the shared common unit the generated modules import from.
pub(crate) fn emit_common(header: Option<&str>) -> String {
    let mut w = SourceWriter::new();
    emit_header(&mut w, header);
    w.line("pub use ffi_json_codegen::runtime::*;");
    w.line("pub use serde_json::Value;");
    w.finish()
}

fn emit_header(w: &mut SourceWriter, header: Option<&str>) {
    for line in header.unwrap_or(DEFAULT_HEADER).lines() {
        if line.is_empty() {
            w.line("//");
        } else {
            w.line(&format!("// {line}"));
        }
    }
    w.blank();
}

// ---------------------------------------------------------------------------
// Enums

fn table_name(enum_name: &str) -> String {
    format!("{enum_name}_LABELS")
}

fn emit_enum(w: &mut SourceWriter, decl: &EnumDecl) {
    let table = table_name(&decl.name);
    w.open(&format!(
        "pub const {table}: &[(u32, &str)] = &["
    ));
    for constant in &decl.constants {
        w.line(&format!("({}, \"{}\"),", constant.value, constant.label));
    }
    w.close("];");
    w.blank();

    let snake = to_snake(&decl.name);
    let name = &decl.name;
    w.open(&format!(
        "pub fn serialize_{snake}(json: &mut Value, value: &{name}) -> Result<(), CodecError> {{"
    ));
    w.line(&format!(
        "*json = enum_to_json({table}, *value as u32, \"{name}\")?;"
    ));
    w.line("Ok(())");
    w.close("}");
    w.blank();

    w.open(&format!(
        "pub fn deserialize_{snake}(json: &Value, value: &mut {name}, path: &str) -> Result<(), CodecError> {{"
    ));
    w.line(&format!(
        "*value = unsafe {{ std::mem::transmute::<u32, {name}>(enum_from_json({table}, json, path)?) }};"
    ));
    w.line("Ok(())");
    w.close("}");
}

// ---------------------------------------------------------------------------
// Structs

/// What a pointer field points at, for codec selection.
enum PointeeClass {
    StrArray,
    Blob,
    Struct(String),
    Enum(String),
    Scalar(String),
}

fn is_scalar_type(name: &str) -> bool {
    matches!(
        name,
        "bool"
            | "u8"
            | "i8"
            | "u16"
            | "i16"
            | "u32"
            | "i32"
            | "u64"
            | "i64"
            | "f32"
            | "f64"
            | "usize"
            | "isize"
            | "c_int"
            | "c_uint"
            | "c_float"
            | "c_double"
    )
}

/// `Ok(None)` means the field has no document representation and is omitted
/// from the emitted codecs: a `c_void` pointer with no size sibling carries
/// no decodable byte count.
fn classify_pointee(
    decl: &StructDecl,
    field: &FieldDescriptor,
    paired: bool,
    registry: &DeclarationRegistry,
) -> GenResult<Option<PointeeClass>> {
    let pointee = field.pointee().unwrap_or_default();
    let base = field.base_type().to_string();

    if paired {
        if pointee.starts_with('*') && matches!(base.as_str(), "c_char" | "i8") {
            return Ok(Some(PointeeClass::StrArray));
        }
        if base == "c_void" {
            return Ok(Some(PointeeClass::Blob));
        }
    } else if base == "c_void" {
        return Ok(None);
    }
    if registry.contains_struct(&base) {
        return Ok(Some(PointeeClass::Struct(base)));
    }
    if registry.contains_enum(&base) {
        return Ok(Some(PointeeClass::Enum(base)));
    }
    if is_scalar_type(&base) {
        return Ok(Some(PointeeClass::Scalar(base)));
    }

    Err(GenError::UnknownPointeeType {
        type_name: decl.name.clone(),
        field: field.name.clone(),
        pointee: pointee.to_string(),
    })
}

/// Known keys for strict validation: base keys first, then own fields, then
/// configured extras. Count fields and omitted pointer fields never appear as
/// document keys, so they are excluded and strict mode flags stray ones.
fn known_keys(
    decl: &StructDecl,
    registry: &DeclarationRegistry,
    config: &GeneratorConfig,
) -> GenResult<Vec<String>> {
    let empty = SizeFieldMap::default();
    let size_map = registry.size_map(&decl.name).unwrap_or(&empty);
    let mut keys = Vec::new();
    for base in &decl.bases {
        if let Some(base_decl) = registry.get_struct(base) {
            keys.extend(known_keys(base_decl, registry, config)?);
        }
    }
    for field in &decl.fields {
        if size_map.is_count_field(&field.name) {
            continue;
        }
        if field.kind == FieldKind::Pointer {
            let paired = size_map.count_for(&field.name).is_some();
            if classify_pointee(decl, field, paired, registry)?.is_none() {
                continue;
            }
        }
        keys.push(field.name.clone());
    }
    if let Some(extra) = config.extra_allowed_keys.get(&decl.name) {
        keys.extend(extra.iter().cloned());
    }
    Ok(keys)
}

fn keys_const_name(struct_name: &str) -> String {
    format!("{}_KEYS", to_snake(struct_name).to_ascii_uppercase())
}

fn emit_struct(
    w: &mut SourceWriter,
    decl: &StructDecl,
    registry: &DeclarationRegistry,
    config: &GeneratorConfig,
) -> GenResult<()> {
    let empty = SizeFieldMap::default();
    let size_map = registry.size_map(&decl.name).unwrap_or(&empty);

    if config.strict_keys {
        let keys = known_keys(decl, registry, config)?;
        let quoted: Vec<String> = keys.iter().map(|k| format!("\"{k}\"")).collect();
        w.line(&format!(
            "pub const {}: &[&str] = &[{}];",
            keys_const_name(&decl.name),
            quoted.join(", ")
        ));
        w.blank();
    }

    emit_struct_serialize(w, decl, size_map, registry)?;
    w.blank();
    emit_struct_deserialize(w, decl, size_map, registry, config)?;
    Ok(())
}

/// Does any field's encode rule compare against a default instance.
fn uses_defaults(decl: &StructDecl, size_map: &SizeFieldMap) -> bool {
    decl.fields.iter().any(|f| {
        !size_map.is_count_field(&f.name)
            && !matches!(f.kind, FieldKind::Pointer | FieldKind::Interface)
    })
}

fn emit_struct_serialize(
    w: &mut SourceWriter,
    decl: &StructDecl,
    size_map: &SizeFieldMap,
    registry: &DeclarationRegistry,
) -> GenResult<()> {
    let name = &decl.name;
    let snake = to_snake(name);
    w.open(&format!(
        "pub fn serialize_{snake}(json: &mut Value, value: &{name}, alloc: &DocArena) -> Result<(), CodecError> {{"
    ));
    if uses_defaults(decl, size_map) {
        w.line(&format!("let defaults = {name}::default();"));
    }
    for base in &decl.bases {
        w.line(&format!(
            "serialize_{}(json, unsafe {{ &*(value as *const {name}).cast::<{base}>() }}, alloc)?;",
            to_snake(base)
        ));
    }
    for field in &decl.fields {
        if size_map.is_count_field(&field.name) {
            continue;
        }
        emit_serialize_field(w, decl, field, size_map, registry)?;
    }
    w.line("Ok(())");
    w.close("}");
    Ok(())
}

fn emit_serialize_field(
    w: &mut SourceWriter,
    decl: &StructDecl,
    field: &FieldDescriptor,
    size_map: &SizeFieldMap,
    registry: &DeclarationRegistry,
) -> GenResult<()> {
    let key = &field.name;
    let access = format!("value.{}", field.access);
    let default = format!("defaults.{}", field.access);
    let base = field.base_type();

    match field.kind {
        FieldKind::String => {
            w.open(&format!(
                "if unsafe {{ !str_eq({access}, {default}) }} {{"
            ));
            w.line(&format!(
                "unsafe {{ write_str(&mut json[\"{key}\"], {access}) }};"
            ));
            w.close("}");
        }
        FieldKind::Plain | FieldKind::Union => {
            let unsafe_access = field.kind == FieldKind::Union;
            if registry.is_bitwise(base) {
                // Union-flattened member of a bitwise enum; plain fields of
                // bitwise type classify as Bitwise and never reach here.
                emit_bitwise_serialize(w, key, &access, &default, base, unsafe_access);
            } else {
                if registry.contains_enum(base) {
                    let enum_snake = to_snake(base);
                    if unsafe_access {
                        w.open(&format!(
                            "if unsafe {{ {access} as u32 != {default} as u32 }} {{"
                        ));
                        w.line(&format!(
                            "serialize_{enum_snake}(&mut json[\"{key}\"], unsafe {{ &{access} }})?;"
                        ));
                    } else {
                        w.open(&format!("if {access} as u32 != {default} as u32 {{"));
                        w.line(&format!(
                            "serialize_{enum_snake}(&mut json[\"{key}\"], &{access})?;"
                        ));
                    }
                } else if unsafe_access {
                    w.open(&format!("if unsafe {{ {access} != {default} }} {{"));
                    w.line(&format!(
                        "write_scalar(&mut json[\"{key}\"], unsafe {{ &{access} }});"
                    ));
                } else {
                    w.open(&format!("if {access} != {default} {{"));
                    w.line(&format!("write_scalar(&mut json[\"{key}\"], &{access});"));
                }
                w.close("}");
            }
        }
        FieldKind::Bitwise => {
            emit_bitwise_serialize(w, key, &access, &default, base, false);
        }
        FieldKind::Struct => {
            let inner = to_snake(base);
            w.open(&format!("if {access} != {default} {{"));
            w.line(&format!(
                "serialize_{inner}(&mut json[\"{key}\"], &{access}, alloc)?;"
            ));
            w.close("}");
        }
        FieldKind::ConstArray => {
            let elem = base;
            w.open(&format!("if {access} != {default} {{"));
            if matches!(elem, "c_char" | "i8") {
                w.line(&format!(
                    "serialize_char_array(&mut json[\"{key}\"], &{access});"
                ));
            } else if registry.contains_struct(elem) {
                w.line(&format!(
                    "serialize_struct_slice(&mut json[\"{key}\"], &{access}, alloc, serialize_{})?;",
                    to_snake(elem)
                ));
            } else if registry.contains_enum(elem) {
                w.line(&format!(
                    "serialize_struct_slice(&mut json[\"{key}\"], &{access}, alloc, |slot, item, _| serialize_{}(slot, item))?;",
                    to_snake(elem)
                ));
            } else {
                w.line(&format!(
                    "serialize_scalar_array(&mut json[\"{key}\"], &{access});"
                ));
            }
            w.close("}");
        }
        FieldKind::Pointer => {
            let paired = size_map.count_for(&field.name);
            let Some(class) = classify_pointee(decl, field, paired.is_some(), registry)? else {
                return Ok(());
            };
            w.open(&format!("if !{access}.is_null() {{"));
            match (&class, paired) {
                (PointeeClass::StrArray, Some(count)) => {
                    w.line(&format!(
                        "unsafe {{ serialize_str_array(&mut json[\"{key}\"], {access}, value.{count} as usize) }};"
                    ));
                }
                (PointeeClass::Blob, Some(count)) => {
                    w.line(&format!(
                        "unsafe {{ serialize_blob(&mut json[\"{key}\"], {access}, value.{count} as usize) }};"
                    ));
                }
                (PointeeClass::Struct(inner), Some(count)) => {
                    w.line(&format!(
                        "unsafe {{ serialize_ptr_array(&mut json[\"{key}\"], {access}, value.{count} as usize, alloc, serialize_{})? }};",
                        to_snake(inner)
                    ));
                }
                (PointeeClass::Enum(inner), Some(count)) => {
                    w.line(&format!(
                        "unsafe {{ serialize_ptr_array(&mut json[\"{key}\"], {access}, value.{count} as usize, alloc, |slot, item, _| serialize_{}(slot, item))? }};",
                        to_snake(inner)
                    ));
                }
                (PointeeClass::Scalar(_), Some(count)) => {
                    w.open(&format!(
                        "unsafe {{ serialize_ptr_array(&mut json[\"{key}\"], {access}, value.{count} as usize, alloc, |slot, item, _| {{"
                    ));
                    w.line("write_scalar(slot, item);");
                    w.line("Ok(())");
                    w.close("})? };");
                }
                (PointeeClass::Struct(inner), None) => {
                    w.line(&format!(
                        "unsafe {{ serialize_ptr(&mut json[\"{key}\"], {access}, alloc, serialize_{})? }};",
                        to_snake(inner)
                    ));
                }
                (PointeeClass::Enum(inner), None) => {
                    w.line(&format!(
                        "unsafe {{ serialize_ptr(&mut json[\"{key}\"], {access}, alloc, |slot, item, _| serialize_{}(slot, item))? }};",
                        to_snake(inner)
                    ));
                }
                (PointeeClass::Scalar(_), None) => {
                    w.open(&format!(
                        "unsafe {{ serialize_ptr(&mut json[\"{key}\"], {access}, alloc, |slot, item, _| {{"
                    ));
                    w.line("write_scalar(slot, item);");
                    w.line("Ok(())");
                    w.close("})? };");
                }
                _ => unreachable!("classify_pointee rejected this shape"),
            }
            w.close("}");
        }
        FieldKind::Interface => {
            let tag = base;
            w.open(&format!(
                "if !{access}.is_null() && alloc.has_dispatch(\"{tag}\") {{"
            ));
            w.line(&format!(
                "unsafe {{ alloc.dispatch_serialize(\"{tag}\", &mut json[\"{key}\"], {access} as *const ())? }};"
            ));
            w.close("}");
        }
    }
    Ok(())
}

/// Bitwise fields move through their `u32` representation with raw pointer
/// reads and writes: an OR-folded union of bits need not match any declared
/// constant, so the emitted code never materializes it as an enum value.
fn emit_bitwise_serialize(
    w: &mut SourceWriter,
    key: &str,
    access: &str,
    default: &str,
    base: &str,
    union_access: bool,
) {
    let table = table_name(base);
    w.line(&format!(
        "let raw = unsafe {{ std::ptr::read(&{access} as *const {base} as *const u32) }};"
    ));
    if union_access {
        w.line(&format!(
            "let raw_default = unsafe {{ std::ptr::read(&{default} as *const {base} as *const u32) }};"
        ));
        w.open("if raw != raw_default {");
    } else {
        w.open(&format!("if raw != {default} as u32 {{"));
    }
    w.line(&format!(
        "pack_bits(&mut json[\"{key}\"], raw, |bits| enum_to_json({table}, bits, \"{base}\"))?;"
    ));
    w.close("}");
}

fn emit_bitwise_deserialize(w: &mut SourceWriter, access: &str, path: &str, base: &str) {
    let table = table_name(base);
    w.line(&format!(
        "let bits = unpack_bits(v, \"{path}\", |label| enum_from_json({table}, label, \"{path}\"))?;"
    ));
    w.line(&format!(
        "unsafe {{ std::ptr::write(&mut {access} as *mut {base} as *mut u32, bits) }};"
    ));
}

fn emit_struct_deserialize(
    w: &mut SourceWriter,
    decl: &StructDecl,
    size_map: &SizeFieldMap,
    registry: &DeclarationRegistry,
    config: &GeneratorConfig,
) -> GenResult<()> {
    let name = &decl.name;
    let snake = to_snake(name);

    if config.strict_keys {
        // The public entry validates; the fields procedure is what base
        // delegation calls, so derived-only keys never fail a base check.
        w.open(&format!(
            "pub fn deserialize_{snake}(json: &Value, value: &mut {name}, alloc: &DocArena) -> Result<(), CodecError> {{"
        ));
        w.line(&format!(
            "validate_keys(json, {}, \"{name}\")?;",
            keys_const_name(name)
        ));
        w.line(&format!("deserialize_{snake}_fields(json, value, alloc)"));
        w.close("}");
        w.blank();
        w.open(&format!(
            "pub fn deserialize_{snake}_fields(json: &Value, value: &mut {name}, alloc: &DocArena) -> Result<(), CodecError> {{"
        ));
        for base in &decl.bases {
            w.line(&format!(
                "deserialize_{}_fields(json, unsafe {{ &mut *(value as *mut {name}).cast::<{base}>() }}, alloc)?;",
                to_snake(base)
            ));
        }
    } else {
        w.open(&format!(
            "pub fn deserialize_{snake}(json: &Value, value: &mut {name}, alloc: &DocArena) -> Result<(), CodecError> {{"
        ));
        for base in &decl.bases {
            w.line(&format!(
                "deserialize_{}(json, unsafe {{ &mut *(value as *mut {name}).cast::<{base}>() }}, alloc)?;",
                to_snake(base)
            ));
        }
    }

    for field in &decl.fields {
        if size_map.is_count_field(&field.name) {
            continue;
        }
        emit_deserialize_field(w, decl, field, size_map, registry)?;
    }
    w.line("Ok(())");
    w.close("}");
    Ok(())
}

fn emit_deserialize_field(
    w: &mut SourceWriter,
    decl: &StructDecl,
    field: &FieldDescriptor,
    size_map: &SizeFieldMap,
    registry: &DeclarationRegistry,
) -> GenResult<()> {
    let key = &field.name;
    let access = format!("value.{}", field.access);
    let path = format!("{}.{}", decl.name, field.name);
    let base = field.base_type();

    if field.kind == FieldKind::Pointer {
        let paired = size_map.count_for(&field.name).is_some();
        if classify_pointee(decl, field, paired, registry)?.is_none() {
            return Ok(());
        }
    }

    w.open(&format!("if let Some(v) = json.get(\"{key}\") {{"));
    match field.kind {
        FieldKind::String => {
            w.line(&format!("{access} = parse_str(v, \"{path}\", alloc)?;"));
        }
        FieldKind::Plain | FieldKind::Union => {
            if registry.is_bitwise(base) {
                emit_bitwise_deserialize(w, &access, &path, base);
            } else if registry.contains_enum(base) {
                let enum_snake = to_snake(base);
                if field.kind == FieldKind::Union {
                    w.line(&format!(
                        "deserialize_{enum_snake}(v, unsafe {{ &mut {access} }}, \"{path}\")?;"
                    ));
                } else {
                    w.line(&format!(
                        "deserialize_{enum_snake}(v, &mut {access}, \"{path}\")?;"
                    ));
                }
            } else {
                w.line(&format!("{access} = parse_scalar(v, \"{path}\")?;"));
            }
        }
        FieldKind::Bitwise => {
            emit_bitwise_deserialize(w, &access, &path, base);
        }
        FieldKind::Struct => {
            w.line(&format!(
                "deserialize_{}(v, &mut {access}, alloc)?;",
                to_snake(base)
            ));
        }
        FieldKind::ConstArray => {
            let elem = base;
            if matches!(elem, "c_char" | "i8") {
                w.line(&format!(
                    "deserialize_char_array(v, \"{path}\", &mut {access})?;"
                ));
            } else if registry.contains_struct(elem) {
                w.line(&format!(
                    "deserialize_struct_slice(v, \"{path}\", &mut {access}, alloc, |j, item, a| deserialize_{}(j, item, a))?;",
                    to_snake(elem)
                ));
            } else if registry.contains_enum(elem) {
                w.line(&format!(
                    "deserialize_struct_slice(v, \"{path}\", &mut {access}, alloc, |j, item, _| deserialize_{}(j, item, \"{path}\"))?;",
                    to_snake(elem)
                ));
            } else {
                w.line(&format!(
                    "deserialize_scalar_array(v, \"{path}\", &mut {access})?;"
                ));
            }
        }
        FieldKind::Pointer => {
            let paired = size_map.count_for(&field.name);
            let Some(class) = classify_pointee(decl, field, paired.is_some(), registry)? else {
                return Ok(());
            };
            match (&class, paired) {
                (PointeeClass::StrArray, Some(count)) => {
                    w.line(&format!(
                        "let (data, count) = deserialize_str_array(v, \"{path}\", alloc)?;"
                    ));
                    w.line(&format!("{access} = data;"));
                    w.line(&format!("value.{count} = count as _;"));
                }
                (PointeeClass::Blob, Some(count)) => {
                    w.line(&format!(
                        "let (data, size) = deserialize_blob(v, \"{path}\", alloc)?;"
                    ));
                    w.line(&format!("{access} = data;"));
                    w.line(&format!("value.{count} = size as _;"));
                }
                (PointeeClass::Struct(inner), Some(count)) => {
                    w.line(&format!(
                        "let (data, count) = deserialize_ptr_array(v, \"{path}\", alloc, |j, item, a| deserialize_{}(j, item, a))?;",
                        to_snake(inner)
                    ));
                    w.line(&format!("{access} = data;"));
                    w.line(&format!("value.{count} = count as _;"));
                }
                (PointeeClass::Enum(inner), Some(count)) => {
                    w.line(&format!(
                        "let (data, count) = deserialize_ptr_array(v, \"{path}\", alloc, |j, item, _| deserialize_{}(j, item, \"{path}\"))?;",
                        to_snake(inner)
                    ));
                    w.line(&format!("{access} = data;"));
                    w.line(&format!("value.{count} = count as _;"));
                }
                (PointeeClass::Scalar(_), Some(count)) => {
                    w.open(&format!(
                        "let (data, count) = deserialize_ptr_array(v, \"{path}\", alloc, |j, item, _| {{"
                    ));
                    w.line(&format!("*item = parse_scalar(j, \"{path}\")?;"));
                    w.line("Ok(())");
                    w.close("})?;");
                    w.line(&format!("{access} = data;"));
                    w.line(&format!("value.{count} = count as _;"));
                }
                (PointeeClass::Struct(inner), None) => {
                    w.line(&format!(
                        "{access} = deserialize_ptr(v, alloc, |j, item, a| deserialize_{}(j, item, a))?;",
                        to_snake(inner)
                    ));
                }
                (PointeeClass::Enum(inner), None) => {
                    w.line(&format!(
                        "{access} = deserialize_ptr(v, alloc, |j, item, _| deserialize_{}(j, item, \"{path}\"))?;",
                        to_snake(inner)
                    ));
                }
                (PointeeClass::Scalar(_), None) => {
                    w.open(&format!("{access} = deserialize_ptr(v, alloc, |j, item, _| {{"));
                    w.line(&format!("*item = parse_scalar(j, \"{path}\")?;"));
                    w.line("Ok(())");
                    w.close("})?;");
                }
                _ => unreachable!("classify_pointee rejected this shape"),
            }
        }
        FieldKind::Interface => {
            let tag = base;
            w.line(&format!(
                "{access} = alloc.dispatch_deserialize(\"{tag}\", v)?.cast();"
            ));
        }
    }
    w.close("}");
    Ok(())
}
