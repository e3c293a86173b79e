//! Runtime contract exercised the way generated code uses it: a fixture
//! struct with hand-written codecs shaped exactly like emitted output.

#![allow(non_camel_case_types, non_snake_case)]

use std::os::raw::c_char;

use ffi_json_codegen::runtime::*;
use serde_json::{json, Value};

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SHADER_TYPE {
    SHADER_TYPE_UNKNOWN = 0,
    SHADER_TYPE_VERTEX = 1,
    SHADER_TYPE_PIXEL = 2,
    SHADER_TYPE_VS_PS = 3,
}

impl Default for SHADER_TYPE {
    fn default() -> Self {
        Self::SHADER_TYPE_UNKNOWN
    }
}

pub const SHADER_TYPE_LABELS: &[(u32, &str)] = &[
    (0, "UNKNOWN"),
    (1, "VERTEX"),
    (2, "PIXEL"),
    (3, "VS_PS"),
];

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutElement {
    pub InputIndex: u32,
    pub RelativeOffset: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PipelineDesc {
    pub Name: *const c_char,
    pub Stages: SHADER_TYPE,
    pub pElements: *const LayoutElement,
    pub NumElements: u32,
    pub BorderColor: [f32; 4],
    pub DepthBias: f32,
}

impl Default for PipelineDesc {
    fn default() -> Self {
        Self {
            Name: std::ptr::null(),
            Stages: SHADER_TYPE::default(),
            pElements: std::ptr::null(),
            NumElements: 0,
            BorderColor: [0.0; 4],
            DepthBias: 0.0,
        }
    }
}

pub const LAYOUT_ELEMENT_KEYS: &[&str] = &["InputIndex", "RelativeOffset"];

pub fn serialize_layout_element(
    json: &mut Value,
    value: &LayoutElement,
    _alloc: &DocArena,
) -> Result<(), CodecError> {
    let defaults = LayoutElement::default();
    if value.InputIndex != defaults.InputIndex {
        write_scalar(&mut json["InputIndex"], &value.InputIndex);
    }
    if value.RelativeOffset != defaults.RelativeOffset {
        write_scalar(&mut json["RelativeOffset"], &value.RelativeOffset);
    }
    Ok(())
}

pub fn deserialize_layout_element(
    json: &Value,
    value: &mut LayoutElement,
    alloc: &DocArena,
) -> Result<(), CodecError> {
    validate_keys(json, LAYOUT_ELEMENT_KEYS, "LayoutElement")?;
    deserialize_layout_element_fields(json, value, alloc)
}

pub fn deserialize_layout_element_fields(
    json: &Value,
    value: &mut LayoutElement,
    _alloc: &DocArena,
) -> Result<(), CodecError> {
    if let Some(v) = json.get("InputIndex") {
        value.InputIndex = parse_scalar(v, "LayoutElement.InputIndex")?;
    }
    if let Some(v) = json.get("RelativeOffset") {
        value.RelativeOffset = parse_scalar(v, "LayoutElement.RelativeOffset")?;
    }
    Ok(())
}

pub const PIPELINE_DESC_KEYS: &[&str] = &[
    "Name",
    "Stages",
    "pElements",
    "BorderColor",
    "DepthBias",
];

pub fn serialize_pipeline_desc(
    json: &mut Value,
    value: &PipelineDesc,
    alloc: &DocArena,
) -> Result<(), CodecError> {
    let defaults = PipelineDesc::default();
    if unsafe { !str_eq(value.Name, defaults.Name) } {
        unsafe { write_str(&mut json["Name"], value.Name) };
    }
    let raw = unsafe { std::ptr::read(&value.Stages as *const SHADER_TYPE as *const u32) };
    if raw != defaults.Stages as u32 {
        pack_bits(&mut json["Stages"], raw, |bits| {
            enum_to_json(SHADER_TYPE_LABELS, bits, "SHADER_TYPE")
        })?;
    }
    if !value.pElements.is_null() {
        unsafe {
            serialize_ptr_array(
                &mut json["pElements"],
                value.pElements,
                value.NumElements as usize,
                alloc,
                serialize_layout_element,
            )?
        };
    }
    if value.BorderColor != defaults.BorderColor {
        serialize_scalar_array(&mut json["BorderColor"], &value.BorderColor);
    }
    if value.DepthBias != defaults.DepthBias {
        write_scalar(&mut json["DepthBias"], &value.DepthBias);
    }
    Ok(())
}

pub fn deserialize_pipeline_desc(
    json: &Value,
    value: &mut PipelineDesc,
    alloc: &DocArena,
) -> Result<(), CodecError> {
    validate_keys(json, PIPELINE_DESC_KEYS, "PipelineDesc")?;
    deserialize_pipeline_desc_fields(json, value, alloc)
}

pub fn deserialize_pipeline_desc_fields(
    json: &Value,
    value: &mut PipelineDesc,
    alloc: &DocArena,
) -> Result<(), CodecError> {
    if let Some(v) = json.get("Name") {
        value.Name = parse_str(v, "PipelineDesc.Name", alloc)?;
    }
    if let Some(v) = json.get("Stages") {
        let bits = unpack_bits(v, "PipelineDesc.Stages", |label| {
            enum_from_json(SHADER_TYPE_LABELS, label, "PipelineDesc.Stages")
        })?;
        unsafe { std::ptr::write(&mut value.Stages as *mut SHADER_TYPE as *mut u32, bits) };
    }
    if let Some(v) = json.get("pElements") {
        let (data, count) =
            deserialize_ptr_array(v, "PipelineDesc.pElements", alloc, |j, item, a| {
                deserialize_layout_element(j, item, a)
            })?;
        value.pElements = data;
        value.NumElements = count as _;
    }
    if let Some(v) = json.get("BorderColor") {
        deserialize_scalar_array(v, "PipelineDesc.BorderColor", &mut value.BorderColor)?;
    }
    if let Some(v) = json.get("DepthBias") {
        value.DepthBias = parse_scalar(v, "PipelineDesc.DepthBias")?;
    }
    Ok(())
}

fn sample_desc(alloc: &DocArena) -> PipelineDesc {
    let elements = [
        LayoutElement {
            InputIndex: 0,
            RelativeOffset: 16,
        },
        LayoutElement {
            InputIndex: 2,
            RelativeOffset: 32,
        },
    ];
    PipelineDesc {
        Name: alloc.copy_str("Opaque PSO"),
        Stages: SHADER_TYPE::SHADER_TYPE_VS_PS,
        pElements: alloc.alloc_slice_with(elements.len(), |i| elements[i]),
        NumElements: elements.len() as u32,
        BorderColor: [0.5, 0.5, 1.0, 1.0],
        DepthBias: 0.25,
    }
}

#[test]
fn default_value_encodes_to_empty_object() {
    let alloc = DocArena::new();
    let mut doc = json!({});
    serialize_pipeline_desc(&mut doc, &PipelineDesc::default(), &alloc).unwrap();
    assert_eq!(doc, json!({}));
}

#[test]
fn round_trip_preserves_non_default_values() {
    let alloc = DocArena::new();
    let original = sample_desc(&alloc);

    let mut doc = json!({});
    serialize_pipeline_desc(&mut doc, &original, &alloc).unwrap();

    assert_eq!(doc["Name"], json!("Opaque PSO"));
    assert_eq!(doc["Stages"], json!(["VERTEX", "PIXEL"]));
    assert_eq!(
        doc["pElements"],
        json!([
            { "RelativeOffset": 16 },
            { "InputIndex": 2, "RelativeOffset": 32 },
        ])
    );
    // Count fields travel inside their pointer field, never as keys.
    assert!(doc.get("NumElements").is_none());

    let mut back = PipelineDesc::default();
    deserialize_pipeline_desc(&doc, &mut back, &alloc).unwrap();

    assert!(unsafe { str_eq(back.Name, original.Name) });
    assert_eq!(back.Stages, original.Stages);
    assert_eq!(back.NumElements, 2);
    let elements = unsafe { std::slice::from_raw_parts(back.pElements, 2) };
    assert_eq!(
        elements,
        unsafe { std::slice::from_raw_parts(original.pElements, 2) }
    );
    assert_eq!(back.BorderColor, original.BorderColor);
    assert_eq!(back.DepthBias, original.DepthBias);
}

#[test]
fn encode_is_idempotent_over_elision() {
    let alloc = DocArena::new();
    let mut desc = PipelineDesc::default();
    desc.DepthBias = 1.5;

    let mut doc = json!({});
    serialize_pipeline_desc(&mut doc, &desc, &alloc).unwrap();
    assert_eq!(doc, json!({ "DepthBias": 1.5 }));

    let mut back = PipelineDesc::default();
    deserialize_pipeline_desc(&doc, &mut back, &alloc).unwrap();
    let mut doc2 = json!({});
    serialize_pipeline_desc(&mut doc2, &back, &alloc).unwrap();
    assert_eq!(doc, doc2);
}

#[test]
fn single_stage_encodes_as_scalar_label() {
    let alloc = DocArena::new();
    let mut desc = PipelineDesc::default();
    desc.Stages = SHADER_TYPE::SHADER_TYPE_PIXEL;

    let mut doc = json!({});
    serialize_pipeline_desc(&mut doc, &desc, &alloc).unwrap();
    assert_eq!(doc["Stages"], json!("PIXEL"));
}

#[test]
fn decode_accepts_both_flag_forms() {
    let alloc = DocArena::new();

    let mut back = PipelineDesc::default();
    deserialize_pipeline_desc(&json!({ "Stages": "VERTEX" }), &mut back, &alloc).unwrap();
    assert_eq!(back.Stages, SHADER_TYPE::SHADER_TYPE_VERTEX);

    let mut back = PipelineDesc::default();
    deserialize_pipeline_desc(&json!({ "Stages": ["VERTEX", "PIXEL"] }), &mut back, &alloc)
        .unwrap();
    assert_eq!(back.Stages, SHADER_TYPE::SHADER_TYPE_VS_PS);
}

#[test]
fn strict_validation_rejects_stray_keys() {
    let alloc = DocArena::new();
    let doc = json!({ "DepthBias": 1.0, "DethBias": 2.0 });

    let mut back = PipelineDesc::default();
    let err = deserialize_pipeline_desc(&doc, &mut back, &alloc).unwrap_err();
    match err {
        CodecError::UnexpectedKey { type_name, key } => {
            assert_eq!(type_name, "PipelineDesc");
            assert_eq!(key, "DethBias");
        }
        other => panic!("unexpected error: {other}"),
    }

    // The fields procedure is the lenient path base delegation uses.
    let mut back = PipelineDesc::default();
    deserialize_pipeline_desc_fields(&doc, &mut back, &alloc).unwrap();
    assert_eq!(back.DepthBias, 1.0);
}

#[test]
fn independent_count_key_is_rejected() {
    let alloc = DocArena::new();
    // Count fields travel inside their pointer field; a bare one is stray.
    let doc = json!({ "NumElements": 2 });

    let mut back = PipelineDesc::default();
    let err = deserialize_pipeline_desc(&doc, &mut back, &alloc).unwrap_err();
    match err {
        CodecError::UnexpectedKey { type_name, key } => {
            assert_eq!(type_name, "PipelineDesc");
            assert_eq!(key, "NumElements");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn nested_element_keys_are_validated_too() {
    let alloc = DocArena::new();
    let doc = json!({ "pElements": [{ "InputIdx": 1 }] });

    let mut back = PipelineDesc::default();
    let err = deserialize_pipeline_desc(&doc, &mut back, &alloc).unwrap_err();
    assert!(matches!(err, CodecError::UnexpectedKey { .. }));
}

#[test]
fn unknown_label_aborts_decode() {
    let alloc = DocArena::new();
    let doc = json!({ "Stages": "HULL" });

    let mut back = PipelineDesc::default();
    let err = deserialize_pipeline_desc(&doc, &mut back, &alloc).unwrap_err();
    match err {
        CodecError::UnknownLabel { path, label } => {
            assert_eq!(path, "PipelineDesc.Stages");
            assert_eq!(label, "HULL");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn wrong_node_type_reports_path() {
    let alloc = DocArena::new();
    let doc = json!({ "pElements": "not-an-array" });

    let mut back = PipelineDesc::default();
    let err = deserialize_pipeline_desc(&doc, &mut back, &alloc).unwrap_err();
    match err {
        CodecError::TypeMismatch { path, expected, .. } => {
            assert_eq!(path, "PipelineDesc.pElements");
            assert_eq!(expected, "array");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// Polymorphic dispatch, shaped like an emitted interface field.

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShaderDesc {
    pub SourceLength: u32,
}

fn serialize_shader_desc(
    json: &mut Value,
    value: &ShaderDesc,
    _alloc: &DocArena,
) -> Result<(), CodecError> {
    let defaults = ShaderDesc::default();
    if value.SourceLength != defaults.SourceLength {
        write_scalar(&mut json["SourceLength"], &value.SourceLength);
    }
    Ok(())
}

fn deserialize_shader_desc(
    json: &Value,
    value: &mut ShaderDesc,
    _alloc: &DocArena,
) -> Result<(), CodecError> {
    if let Some(v) = json.get("SourceLength") {
        value.SourceLength = parse_scalar(v, "ShaderDesc.SourceLength")?;
    }
    Ok(())
}

unsafe fn encode_ishader(
    slot: &mut Value,
    ptr: *const (),
    alloc: &DocArena,
) -> Result<(), CodecError> {
    serialize_shader_desc(slot, &*(ptr as *const ShaderDesc), alloc)
}

unsafe fn decode_ishader(json: &Value, alloc: &DocArena) -> Result<*mut (), CodecError> {
    let ptr = deserialize_ptr(json, alloc, |j, item: &mut ShaderDesc, a| {
        deserialize_shader_desc(j, item, a)
    })?;
    Ok(ptr as *mut ())
}

#[test]
fn dispatch_round_trip() {
    let mut registry = DispatchRegistry::new();
    registry.register("IShader", encode_ishader, decode_ishader);
    let alloc = DocArena::with_dispatch(registry);

    let shader = ShaderDesc { SourceLength: 128 };
    let mut doc = json!({});
    if alloc.has_dispatch("IShader") {
        unsafe {
            alloc
                .dispatch_serialize(
                    "IShader",
                    &mut doc["pShader"],
                    &shader as *const ShaderDesc as *const (),
                )
                .unwrap()
        };
    }
    assert_eq!(doc, json!({ "pShader": { "SourceLength": 128 } }));

    let back: *mut ShaderDesc = alloc
        .dispatch_deserialize("IShader", &doc["pShader"])
        .unwrap()
        .cast();
    assert_eq!(unsafe { *back }, shader);
}

#[test]
fn dispatch_decode_without_registration_fails() {
    let alloc = DocArena::new();
    let err = alloc
        .dispatch_deserialize("IShader", &json!({}))
        .unwrap_err();
    assert!(matches!(err, CodecError::UnknownDispatchTag { .. }));
}
