//! Runtime support for emitted codecs.
//!
//! Emitted serialize/deserialize procedures are thin walks over struct
//! fields; everything with real behavior lives here: scalar and string
//! bridging, counted-array and single-object pointer paths, fixed-array
//! handling, bit-flag packing, enum label tables, binary blobs, and strict
//! key validation. All helpers operate on `serde_json::Value` nodes and
//! report failures as [`CodecError`] with a `Struct.Field` path.

mod arena;
mod dispatch;

pub use arena::DocArena;
pub use dispatch::{DecodeFn, DispatchRegistry, EncodeFn};

pub use crate::errors::CodecError;

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::json_type_name;

// ---------------------------------------------------------------------------
// Shape checks

pub fn expect_str<'a>(json: &'a Value, path: &str) -> Result<&'a str, CodecError> {
    json.as_str().ok_or_else(|| CodecError::TypeMismatch {
        path: path.to_string(),
        expected: "string",
        found: json_type_name(json),
    })
}

pub fn expect_array<'a>(json: &'a Value, path: &str) -> Result<&'a Vec<Value>, CodecError> {
    json.as_array().ok_or_else(|| CodecError::TypeMismatch {
        path: path.to_string(),
        expected: "array",
        found: json_type_name(json),
    })
}

pub fn expect_object<'a>(
    json: &'a Value,
    path: &str,
) -> Result<&'a Map<String, Value>, CodecError> {
    json.as_object().ok_or_else(|| CodecError::TypeMismatch {
        path: path.to_string(),
        expected: "object",
        found: json_type_name(json),
    })
}

/// Strict-key validation: every key of the object must appear in `known`.
pub fn validate_keys(json: &Value, known: &[&str], type_name: &str) -> Result<(), CodecError> {
    let object = expect_object(json, type_name)?;
    for key in object.keys() {
        if !known.contains(&key.as_str()) {
            return Err(CodecError::UnexpectedKey {
                type_name: type_name.to_string(),
                key: key.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Scalars

/// Write any serde-serializable scalar into `slot`.
pub fn write_scalar<T: Serialize>(slot: &mut Value, value: &T) {
    *slot = serde_json::to_value(value).unwrap_or(Value::Null);
}

/// Parse a serde-deserializable scalar out of `json`.
pub fn parse_scalar<T: DeserializeOwned>(json: &Value, path: &str) -> Result<T, CodecError> {
    serde_json::from_value(json.clone()).map_err(|_| CodecError::TypeMismatch {
        path: path.to_string(),
        expected: std::any::type_name::<T>(),
        found: json_type_name(json),
    })
}

// ---------------------------------------------------------------------------
// Strings

/// Write a NUL-terminated C string into `slot`. Null writes a JSON null.
///
/// # Safety
/// `s`, when non-null, must point to a NUL-terminated byte string.
pub unsafe fn write_str(slot: &mut Value, s: *const c_char) {
    if s.is_null() {
        *slot = Value::Null;
    } else {
        *slot = Value::String(CStr::from_ptr(s).to_string_lossy().into_owned());
    }
}

/// Parse a JSON string into an arena-owned C string.
pub fn parse_str(
    json: &Value,
    path: &str,
    alloc: &DocArena,
) -> Result<*const c_char, CodecError> {
    let s = expect_str(json, path)?;
    Ok(alloc.copy_str(s))
}

/// Content comparison of two C strings. Two nulls are equal; a null and a
/// non-null are not.
///
/// # Safety
/// Non-null arguments must point to NUL-terminated byte strings.
pub unsafe fn str_eq(a: *const c_char, b: *const c_char) -> bool {
    match (a.is_null(), b.is_null()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => CStr::from_ptr(a).to_bytes() == CStr::from_ptr(b).to_bytes(),
    }
}

// ---------------------------------------------------------------------------
// Pointer paths

/// Encode a single out-of-line object.
///
/// # Safety
/// `ptr` must point to a live `T`.
pub unsafe fn serialize_ptr<T>(
    slot: &mut Value,
    ptr: *const T,
    alloc: &DocArena,
    f: impl Fn(&mut Value, &T, &DocArena) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    f(slot, &*ptr, alloc)
}

/// Decode a single out-of-line object into the arena.
pub fn deserialize_ptr<T: Default>(
    json: &Value,
    alloc: &DocArena,
    f: impl Fn(&Value, &mut T, &DocArena) -> Result<(), CodecError>,
) -> Result<*mut T, CodecError> {
    let ptr = alloc.alloc(T::default());
    // Arena pointer is valid and uniquely owned until returned.
    f(json, unsafe { &mut *ptr }, alloc)?;
    Ok(ptr)
}

/// Encode a counted array as a JSON array, one element at a time.
///
/// # Safety
/// `ptr` must point to at least `count` live elements.
pub unsafe fn serialize_ptr_array<T>(
    slot: &mut Value,
    ptr: *const T,
    count: usize,
    alloc: &DocArena,
    f: impl Fn(&mut Value, &T, &DocArena) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    let items = std::slice::from_raw_parts(ptr, count);
    let mut out = Vec::with_capacity(count);
    for item in items {
        let mut element = Value::Null;
        f(&mut element, item, alloc)?;
        out.push(element);
    }
    *slot = Value::Array(out);
    Ok(())
}

/// Decode a JSON array into an arena-owned counted array.
pub fn deserialize_ptr_array<T: Default>(
    json: &Value,
    path: &str,
    alloc: &DocArena,
    f: impl Fn(&Value, &mut T, &DocArena) -> Result<(), CodecError>,
) -> Result<(*mut T, usize), CodecError> {
    let elements = expect_array(json, path)?;
    let ptr: *mut T = alloc.alloc_slice(elements.len());
    for (i, element) in elements.iter().enumerate() {
        let item = unsafe { &mut *ptr.add(i) };
        f(element, item, alloc).map_err(|e| rewrite_path(e, &format!("{path}[{i}]")))?;
    }
    Ok((ptr, elements.len()))
}

fn rewrite_path(err: CodecError, path: &str) -> CodecError {
    match err {
        CodecError::TypeMismatch {
            expected, found, ..
        } => CodecError::TypeMismatch {
            path: path.to_string(),
            expected,
            found,
        },
        other => other,
    }
}

/// Encode a counted `*const *const c_char` array as a JSON string array.
///
/// # Safety
/// `ptr` must point to at least `count` pointers, each null or
/// NUL-terminated.
pub unsafe fn serialize_str_array(slot: &mut Value, ptr: *const *const c_char, count: usize) {
    let items = std::slice::from_raw_parts(ptr, count);
    let mut out = Vec::with_capacity(count);
    for &item in items {
        let mut element = Value::Null;
        write_str(&mut element, item);
        out.push(element);
    }
    *slot = Value::Array(out);
}

/// Decode a JSON string array into an arena-owned C-string array.
pub fn deserialize_str_array(
    json: &Value,
    path: &str,
    alloc: &DocArena,
) -> Result<(*mut *const c_char, usize), CodecError> {
    let elements = expect_array(json, path)?;
    let mut strings = Vec::with_capacity(elements.len());
    for (i, element) in elements.iter().enumerate() {
        strings.push(parse_str(element, &format!("{path}[{i}]"), alloc)?);
    }
    let ptr = alloc.alloc_slice_with(strings.len(), |i| strings[i]);
    Ok((ptr, elements.len()))
}

// ---------------------------------------------------------------------------
// Binary blobs

/// Encode `size` raw bytes as a JSON array of numbers.
///
/// # Safety
/// `ptr` must point to at least `size` readable bytes.
pub unsafe fn serialize_blob(slot: &mut Value, ptr: *const c_void, size: usize) {
    let bytes = std::slice::from_raw_parts(ptr as *const u8, size);
    *slot = Value::Array(bytes.iter().map(|&b| Value::from(b)).collect());
}

/// Decode a JSON byte array into an arena-owned blob.
pub fn deserialize_blob(
    json: &Value,
    path: &str,
    alloc: &DocArena,
) -> Result<(*mut c_void, usize), CodecError> {
    let elements = expect_array(json, path)?;
    let mut bytes = Vec::with_capacity(elements.len());
    for (i, element) in elements.iter().enumerate() {
        bytes.push(parse_scalar::<u8>(element, &format!("{path}[{i}]"))?);
    }
    let ptr = alloc.alloc_slice_with(bytes.len(), |i| bytes[i]);
    Ok((ptr as *mut c_void, bytes.len()))
}

// ---------------------------------------------------------------------------
// Fixed arrays

/// Encode a fixed scalar array as a JSON array.
pub fn serialize_scalar_array<T: Serialize>(slot: &mut Value, values: &[T]) {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        let mut element = Value::Null;
        write_scalar(&mut element, value);
        out.push(element);
    }
    *slot = Value::Array(out);
}

/// Decode a JSON array into a fixed scalar array. Extra document elements
/// are ignored, missing ones leave the tail untouched.
pub fn deserialize_scalar_array<T: DeserializeOwned>(
    json: &Value,
    path: &str,
    out: &mut [T],
) -> Result<(), CodecError> {
    let elements = expect_array(json, path)?;
    for (i, (slot, element)) in out.iter_mut().zip(elements).enumerate() {
        *slot = parse_scalar(element, &format!("{path}[{i}]"))?;
    }
    Ok(())
}

/// Encode a fixed `c_char` array as a JSON string, up to the first NUL.
pub fn serialize_char_array(slot: &mut Value, chars: &[c_char]) {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    *slot = Value::String(String::from_utf8_lossy(&bytes).into_owned());
}

/// Decode a JSON string into a fixed `c_char` array, truncating to fit and
/// always NUL-terminating.
pub fn deserialize_char_array(
    json: &Value,
    path: &str,
    out: &mut [c_char],
) -> Result<(), CodecError> {
    let s = expect_str(json, path)?;
    let limit = s.len().min(out.len().saturating_sub(1));
    for (slot, &byte) in out.iter_mut().zip(s.as_bytes()[..limit].iter()) {
        *slot = byte as c_char;
    }
    if !out.is_empty() {
        out[limit] = 0;
    }
    Ok(())
}

/// Encode a fixed array of structs as an object keyed by decimal index,
/// writing only the non-default elements.
pub fn serialize_struct_slice<T: Default + PartialEq>(
    slot: &mut Value,
    values: &[T],
    alloc: &DocArena,
    f: impl Fn(&mut Value, &T, &DocArena) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    let default = T::default();
    let mut out = Map::new();
    for (i, value) in values.iter().enumerate() {
        if *value == default {
            continue;
        }
        let mut element = Value::Null;
        f(&mut element, value, alloc)?;
        out.insert(i.to_string(), element);
    }
    *slot = Value::Object(out);
    Ok(())
}

/// Decode an index-keyed object back into a fixed array of structs.
/// Absent indexes keep their current element value.
pub fn deserialize_struct_slice<T>(
    json: &Value,
    path: &str,
    out: &mut [T],
    alloc: &DocArena,
    f: impl Fn(&Value, &mut T, &DocArena) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    expect_object(json, path)?;
    for (i, slot) in out.iter_mut().enumerate() {
        if let Some(element) = json.get(i.to_string()) {
            f(element, slot, alloc)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Enum label tables

/// Label for `value` from an emitted label table.
pub fn enum_to_json(
    table: &[(u32, &str)],
    value: u32,
    type_name: &str,
) -> Result<Value, CodecError> {
    table
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, label)| Value::String((*label).to_string()))
        .ok_or_else(|| CodecError::UnknownValue {
            type_name: type_name.to_string(),
            value,
        })
}

/// Value for the label in `json` from an emitted label table.
pub fn enum_from_json(
    table: &[(u32, &str)],
    json: &Value,
    path: &str,
) -> Result<u32, CodecError> {
    let label = expect_str(json, path)?;
    table
        .iter()
        .find(|(_, l)| *l == label)
        .map(|(v, _)| *v)
        .ok_or_else(|| CodecError::UnknownLabel {
            path: path.to_string(),
            label: label.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Bit flags

/// Encode an accumulated flag value. More than one set bit becomes an array
/// of labels; one set bit, or no bits at all, becomes the single label for
/// the whole value.
pub fn pack_bits(
    slot: &mut Value,
    bits: u32,
    to_label: impl Fn(u32) -> Result<Value, CodecError>,
) -> Result<(), CodecError> {
    if bits.count_ones() > 1 {
        let mut labels = Vec::new();
        let mut rest = bits;
        while rest != 0 {
            let lsb = rest & rest.wrapping_neg();
            labels.push(to_label(lsb)?);
            rest &= rest - 1;
        }
        *slot = Value::Array(labels);
    } else {
        *slot = to_label(bits)?;
    }
    Ok(())
}

/// Decode a flag value from either form: an array of labels is OR-folded, a
/// single label stands alone.
pub fn unpack_bits(
    json: &Value,
    path: &str,
    from_label: impl Fn(&Value) -> Result<u32, CodecError>,
) -> Result<u32, CodecError> {
    match json {
        Value::Array(labels) => {
            let mut bits = 0;
            for label in labels {
                bits |= from_label(label)?;
            }
            Ok(bits)
        }
        Value::String(_) => from_label(json),
        other => Err(CodecError::TypeMismatch {
            path: path.to_string(),
            expected: "array or string",
            found: json_type_name(other),
        }),
    }
}
