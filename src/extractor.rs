//! Declaration extraction.
//!
//! Parses a declaration source with `syn` and lowers it into a
//! [`DeclarationRegistry`]: registered enums with evaluated discriminants and
//! derived labels, registered structs with classified fields and resolved
//! bases, the bitwise-enum set discovered from function signatures, and the
//! per-struct size-field maps.
//!
//! Declarations are C-style types spelled in Rust FFI syntax:
//!
//! - strings are `*const c_char` fields;
//! - fixed arrays are `[T; N]`;
//! - enums carry C discriminant semantics (implicit values continue from the
//!   previous constant; small constant expressions are evaluated);
//! - inheritance is spelled `#[extends(Base)]`;
//! - an enum is bit-flag capable when some function in the same file takes it
//!   as a parameter.

use indexmap::{IndexMap, IndexSet};
use log::debug;
use syn::punctuated::Punctuated;
use syn::{Expr, Fields, FnArg, Ident, Item, Lit, Token, Type};

use crate::classify::{classify_field, ClassifyContext, RawField, RawType};
use crate::config::GeneratorConfig;
use crate::errors::{GenError, GenResult};
use crate::labels::derive_labels;
use crate::registry::DeclarationRegistry;
use crate::sizemap::resolve_size_fields;
use crate::types::{EnumConstant, EnumDecl, StructDecl};

/// Extract all registered declarations from one source file.
pub fn extract(source: &str, config: &GeneratorConfig) -> GenResult<DeclarationRegistry> {
    let file = syn::parse_file(source)?;

    let mut unions: IndexMap<String, Vec<RawField>> = IndexMap::new();
    let mut enums: Vec<EnumDecl> = Vec::new();
    let mut raw_structs: Vec<(String, Vec<RawField>, Vec<String>)> = Vec::new();
    let mut bitwise: IndexSet<String> = IndexSet::new();

    for item in &file.items {
        match item {
            Item::Union(item_union) => {
                let members = item_union
                    .fields
                    .named
                    .iter()
                    .filter_map(lower_field)
                    .collect();
                unions.insert(item_union.ident.to_string(), members);
            }
            Item::Enum(item_enum) => {
                let name = item_enum.ident.to_string();
                if !config.is_registered_enum(&name) {
                    continue;
                }
                enums.push(lower_enum(&name, item_enum)?);
            }
            Item::Struct(item_struct) => {
                let name = item_struct.ident.to_string();
                if !config.is_registered_struct(&name) {
                    continue;
                }
                let fields = match &item_struct.fields {
                    Fields::Named(named) => {
                        named.named.iter().filter_map(lower_field).collect()
                    }
                    _ => Vec::new(),
                };
                let bases = extends_bases(&item_struct.attrs)?;
                raw_structs.push((name, fields, bases));
            }
            Item::Fn(item_fn) => {
                scan_signature(&item_fn.sig, config, &mut bitwise);
            }
            Item::ForeignMod(foreign) => {
                for foreign_item in &foreign.items {
                    if let syn::ForeignItem::Fn(f) = foreign_item {
                        scan_signature(&f.sig, config, &mut bitwise);
                    }
                }
            }
            _ => {}
        }
    }

    debug!(
        "extracted {} structs, {} enums, {} unions; bitwise: {:?}",
        raw_structs.len(),
        enums.len(),
        unions.len(),
        bitwise
    );

    let mut registry = DeclarationRegistry::new();
    for decl in enums {
        registry.register_enum(decl);
    }
    for name in &bitwise {
        registry.mark_bitwise(name.clone());
    }

    let ctx = ClassifyContext {
        config,
        bitwise: &bitwise,
        unions: &unions,
    };
    for (name, raw_fields, bases) in raw_structs {
        let mut fields = Vec::new();
        for raw in &raw_fields {
            fields.extend(classify_field(raw, &ctx));
        }
        registry.register_struct(StructDecl {
            name,
            fields,
            bases,
        });
    }

    resolve_bases(&mut registry, config)?;

    let structs: Vec<StructDecl> = registry.structs().cloned().collect();
    for decl in structs {
        registry.set_size_map(&decl.name, resolve_size_fields(&decl, config));
    }

    Ok(registry)
}

/// Check every declared base and flatten the configured-only ones.
///
/// A base that is declared in the file stays in `bases` and gets delegated
/// to at emission time. A base that exists only in the configuration table
/// contributes its injected field, in front of the struct's own fields.
fn resolve_bases(registry: &mut DeclarationRegistry, config: &GeneratorConfig) -> GenResult<()> {
    let names: Vec<String> = registry.structs().map(|s| s.name.clone()).collect();
    for name in names {
        let Some(decl) = registry.get_struct(&name) else {
            continue;
        };
        let mut kept_bases = Vec::new();
        let mut injected = Vec::new();
        for base in &decl.bases {
            if registry.contains_struct(base) {
                kept_bases.push(base.clone());
            } else if let Some(field) = config.base_fields.get(base) {
                injected.push(field.clone());
            } else {
                return Err(GenError::UnknownBaseType {
                    type_name: name.clone(),
                    base: base.clone(),
                });
            }
        }
        if !injected.is_empty() || kept_bases.len() != decl.bases.len() {
            let mut decl = decl.clone();
            decl.bases = kept_bases;
            injected.extend(decl.fields);
            decl.fields = injected;
            registry.register_struct(decl);
        }
    }
    Ok(())
}

/// Lower one named field. Fields with unsupported type shapes are dropped.
fn lower_field(field: &syn::Field) -> Option<RawField> {
    let name = field.ident.as_ref()?.to_string();
    let ty = lower_type(&field.ty)?;
    Some(RawField { name, ty })
}

fn lower_type(ty: &Type) -> Option<RawType> {
    match ty {
        Type::Ptr(ptr) => {
            let pointee = lower_type(&ptr.elem)?;
            Some(RawType::Pointer {
                is_const: ptr.const_token.is_some(),
                pointee: pointee.spelling(),
            })
        }
        Type::Array(array) => {
            let elem = lower_type(&array.elem)?;
            let len = match &array.len {
                Expr::Lit(lit) => match &lit.lit {
                    Lit::Int(int) => int.base10_parse().ok()?,
                    _ => return None,
                },
                _ => return None,
            };
            Some(RawType::Array {
                elem: elem.spelling(),
                len,
            })
        }
        Type::Path(path) => {
            let name = path.path.segments.last()?.ident.to_string();
            Some(RawType::Named { name })
        }
        _ => None,
    }
}

/// Bases listed in `#[extends(Base1, Base2)]`, in declaration order.
fn extends_bases(attrs: &[syn::Attribute]) -> GenResult<Vec<String>> {
    for attr in attrs {
        if attr.path().is_ident("extends") {
            let idents = attr
                .parse_args_with(Punctuated::<Ident, Token![,]>::parse_terminated)?;
            return Ok(idents.iter().map(Ident::to_string).collect());
        }
    }
    Ok(Vec::new())
}

/// Mark every registered enum appearing as a parameter type as bitwise.
fn scan_signature(
    sig: &syn::Signature,
    config: &GeneratorConfig,
    bitwise: &mut IndexSet<String>,
) {
    for input in &sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Some(raw) = lower_type(&pat_type.ty) else {
            continue;
        };
        if let RawType::Named { name } = raw {
            if config.is_registered_enum(&name) {
                bitwise.insert(name);
            }
        }
    }
}

/// Lower a C-style enum: evaluate discriminants, derive labels.
fn lower_enum(name: &str, item: &syn::ItemEnum) -> GenResult<EnumDecl> {
    let mut values: IndexMap<String, u32> = IndexMap::new();
    let mut next = 0u32;
    for variant in &item.variants {
        let constant = variant.ident.to_string();
        let value = match &variant.discriminant {
            Some((_, expr)) => {
                eval_discriminant(expr, &values).ok_or_else(|| GenError::BadDiscriminant {
                    type_name: name.to_string(),
                    constant: constant.clone(),
                })?
            }
            None => next,
        };
        next = value.wrapping_add(1);
        values.insert(constant, value);
    }

    let raw_names: Vec<&str> = values.keys().map(String::as_str).collect();
    let labels = derive_labels(&raw_names);
    let constants = values
        .iter()
        .zip(labels)
        .map(|((raw_name, &value), label)| EnumConstant {
            raw_name: raw_name.clone(),
            label,
            value,
        })
        .collect();

    Ok(EnumDecl {
        name: name.to_string(),
        constants,
    })
}

/// Evaluate a constant discriminant expression with C semantics.
///
/// Supports integer literals, references to earlier constants of the same
/// enum, parenthesization, and the `|`, `<<`, `+` operators.
fn eval_discriminant(expr: &Expr, known: &IndexMap<String, u32>) -> Option<u32> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(int) => int.base10_parse().ok(),
            _ => None,
        },
        Expr::Path(path) => {
            let name = path.path.segments.last()?.ident.to_string();
            known.get(&name).copied()
        }
        Expr::Paren(paren) => eval_discriminant(&paren.expr, known),
        Expr::Binary(binary) => {
            let lhs = eval_discriminant(&binary.left, known)?;
            let rhs = eval_discriminant(&binary.right, known)?;
            match binary.op {
                syn::BinOp::BitOr(_) => Some(lhs | rhs),
                syn::BinOp::Shl(_) => Some(lhs.checked_shl(rhs)?),
                syn::BinOp::Add(_) => lhs.checked_add(rhs),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldDescriptor, FieldKind};

    fn config() -> GeneratorConfig {
        let mut config = GeneratorConfig::new();
        config
            .register_struct("SamplerDesc")
            .register_struct("InputLayoutDesc")
            .register_struct("LayoutElement")
            .register_enum("FILTER_TYPE")
            .register_enum("SHADER_TYPE");
        config
    }

    #[test]
    fn test_extract_struct_and_enum() {
        let source = r#"
            #[repr(u32)]
            pub enum FILTER_TYPE {
                FILTER_TYPE_UNKNOWN = 0,
                FILTER_TYPE_POINT,
                FILTER_TYPE_LINEAR,
            }

            #[repr(C)]
            pub struct SamplerDesc {
                pub MinFilter: FILTER_TYPE,
                pub MipLODBias: f32,
                pub BorderColor: [f32; 4],
            }
        "#;
        let registry = extract(source, &config()).unwrap();

        let decl = registry.get_struct("SamplerDesc").unwrap();
        assert_eq!(decl.fields.len(), 3);
        assert_eq!(decl.fields[0].kind, FieldKind::Plain);
        assert_eq!(decl.fields[2].kind, FieldKind::ConstArray);

        let filter = registry.get_enum("FILTER_TYPE").unwrap();
        assert_eq!(filter.constants[1].raw_name, "FILTER_TYPE_POINT");
        assert_eq!(filter.constants[1].label, "POINT");
        assert_eq!(filter.constants[2].value, 2);
    }

    #[test]
    fn test_discriminant_expressions() {
        let source = r#"
            #[repr(u32)]
            pub enum SHADER_TYPE {
                SHADER_TYPE_UNKNOWN = 0,
                SHADER_TYPE_VERTEX = 1 << 0,
                SHADER_TYPE_PIXEL = 1 << 1,
                SHADER_TYPE_VS_PS = SHADER_TYPE_VERTEX | SHADER_TYPE_PIXEL,
            }
        "#;
        let registry = extract(source, &config()).unwrap();
        let decl = registry.get_enum("SHADER_TYPE").unwrap();
        assert_eq!(decl.value_of("SHADER_TYPE_PIXEL"), Some(2));
        assert_eq!(decl.value_of("SHADER_TYPE_VS_PS"), Some(3));
    }

    #[test]
    fn test_bitwise_discovered_from_signatures() {
        let source = r#"
            #[repr(u32)]
            pub enum SHADER_TYPE {
                SHADER_TYPE_VERTEX = 1,
                SHADER_TYPE_PIXEL = 2,
            }

            extern "C" {
                pub fn GetActiveStages(Stages: SHADER_TYPE) -> bool;
            }

            #[repr(C)]
            pub struct SamplerDesc {
                pub ActiveStages: SHADER_TYPE,
            }
        "#;
        let registry = extract(source, &config()).unwrap();
        assert!(registry.is_bitwise("SHADER_TYPE"));
        let decl = registry.get_struct("SamplerDesc").unwrap();
        assert_eq!(decl.fields[0].kind, FieldKind::Bitwise);
    }

    #[test]
    fn test_size_map_computed_per_struct() {
        let source = r#"
            #[repr(C)]
            pub struct LayoutElement {
                pub InputIndex: u32,
            }

            #[repr(C)]
            pub struct InputLayoutDesc {
                pub pLayoutElements: *const LayoutElement,
                pub NumElements: u32,
            }
        "#;
        let registry = extract(source, &config()).unwrap();
        let map = registry.size_map("InputLayoutDesc").unwrap();
        assert_eq!(map.count_for("pLayoutElements"), Some("NumElements"));
        assert!(registry.size_map("LayoutElement").is_none());
    }

    #[test]
    fn test_declared_base_is_kept() {
        let source = r#"
            #[repr(C)]
            pub struct LayoutElement {
                pub InputIndex: u32,
            }

            #[repr(C)]
            #[extends(LayoutElement)]
            pub struct InputLayoutDesc {
                pub NumElements: u32,
            }
        "#;
        let registry = extract(source, &config()).unwrap();
        let decl = registry.get_struct("InputLayoutDesc").unwrap();
        assert_eq!(decl.bases, vec!["LayoutElement"]);
        assert_eq!(decl.fields.len(), 1);
    }

    #[test]
    fn test_configured_base_injects_field() {
        let mut config = config();
        config.register_base(
            "DeviceObjectAttribs",
            FieldDescriptor::new("Name", "*const c_char", FieldKind::String),
        );
        let source = r#"
            #[repr(C)]
            #[extends(DeviceObjectAttribs)]
            pub struct SamplerDesc {
                pub MipLODBias: f32,
            }
        "#;
        let registry = extract(source, &config).unwrap();
        let decl = registry.get_struct("SamplerDesc").unwrap();
        assert!(decl.bases.is_empty());
        assert_eq!(decl.fields[0].name, "Name");
        assert_eq!(decl.fields[0].kind, FieldKind::String);
        assert_eq!(decl.fields[1].name, "MipLODBias");
    }

    #[test]
    fn test_unknown_base_is_fatal() {
        let source = r#"
            #[repr(C)]
            #[extends(MysteryBase)]
            pub struct SamplerDesc {
                pub MipLODBias: f32,
            }
        "#;
        let err = extract(source, &config()).unwrap_err();
        assert!(matches!(err, GenError::UnknownBaseType { .. }));
    }

    #[test]
    fn test_union_members_flattened() {
        let source = r#"
            pub union ElementValue {
                pub Stride: u32,
                pub Offset: u32,
            }

            #[repr(C)]
            pub struct LayoutElement {
                pub InputIndex: u32,
                pub Value: ElementValue,
            }
        "#;
        let registry = extract(source, &config()).unwrap();
        let decl = registry.get_struct("LayoutElement").unwrap();
        let names: Vec<_> = decl.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["InputIndex", "Stride", "Offset"]);
        assert_eq!(decl.fields[1].access, "Value.Stride");
        assert_eq!(decl.fields[1].kind, FieldKind::Union);
    }

    #[test]
    fn test_unregistered_types_are_ignored() {
        let source = r#"
            #[repr(C)]
            pub struct PrivateHelper {
                pub X: u32,
            }
        "#;
        let registry = extract(source, &config()).unwrap();
        assert!(!registry.contains_struct("PrivateHelper"));
    }

    #[test]
    fn test_full_path_types_use_last_segment() {
        let source = r#"
            #[repr(C)]
            pub struct SamplerDesc {
                pub Name: *const std::os::raw::c_char,
            }
        "#;
        let registry = extract(source, &config()).unwrap();
        let decl = registry.get_struct("SamplerDesc").unwrap();
        assert_eq!(decl.fields[0].kind, FieldKind::String);
        assert_eq!(decl.fields[0].type_spelling, "*const c_char");
    }
}
