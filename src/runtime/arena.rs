//! Decode-side arena.
//!
//! Decoded documents own out-of-line data (strings, counted arrays, nested
//! objects) through raw pointers, exactly like the FFI structs they fill.
//! All of it is bump-allocated here; dropping the arena invalidates every
//! pointer a decode handed out. The arena also carries the dispatch registry
//! so emitted code reaches polymorphic handlers through the same parameter
//! it allocates with.

use std::os::raw::c_char;

use bumpalo::Bump;
use log::debug;
use serde_json::Value;

use crate::errors::CodecError;
use crate::runtime::dispatch::DispatchRegistry;

pub struct DocArena {
    bump: Bump,
    dispatch: DispatchRegistry,
}

impl DocArena {
    pub fn new() -> Self {
        Self::with_dispatch(DispatchRegistry::new())
    }

    pub fn with_dispatch(dispatch: DispatchRegistry) -> Self {
        Self {
            bump: Bump::new(),
            dispatch,
        }
    }

    pub fn dispatch(&self) -> &DispatchRegistry {
        &self.dispatch
    }

    /// Move `value` into the arena.
    ///
    /// The pointer is valid until the arena is dropped; the value is never
    /// dropped itself, so only plain-data types belong here.
    pub fn alloc<T>(&self, value: T) -> *mut T {
        self.bump.alloc(value) as *mut T
    }

    /// Allocate a default-initialized slice, returning its base pointer.
    /// Returns null for a zero-length request.
    pub fn alloc_slice<T: Default>(&self, len: usize) -> *mut T {
        if len == 0 {
            return std::ptr::null_mut();
        }
        self.bump
            .alloc_slice_fill_with(len, |_| T::default())
            .as_mut_ptr()
    }

    /// Allocate a slice initialized per index.
    pub fn alloc_slice_with<T>(&self, len: usize, init: impl FnMut(usize) -> T) -> *mut T {
        if len == 0 {
            return std::ptr::null_mut();
        }
        self.bump.alloc_slice_fill_with(len, init).as_mut_ptr()
    }

    /// Copy `s` into the arena as a NUL-terminated C string.
    pub fn copy_str(&self, s: &str) -> *const c_char {
        let bytes = self
            .bump
            .alloc_slice_fill_with(s.len() + 1, |i| {
                if i < s.len() {
                    s.as_bytes()[i]
                } else {
                    0
                }
            });
        bytes.as_ptr() as *const c_char
    }

    /// True when an encode/decode handler pair is registered for `tag`.
    pub fn has_dispatch(&self, tag: &str) -> bool {
        self.dispatch.contains(tag)
    }

    /// Encode a polymorphic object through its registered handler.
    ///
    /// A null pointer writes nothing. A missing registration is logged and
    /// skipped; encoding stays total.
    ///
    /// # Safety
    /// `ptr`, when non-null, must point to a live value of the type
    /// registered under `tag`.
    pub unsafe fn dispatch_serialize(
        &self,
        tag: &str,
        slot: &mut Value,
        ptr: *const (),
    ) -> Result<(), CodecError> {
        if ptr.is_null() {
            return Ok(());
        }
        match self.dispatch.encode_fn(tag) {
            Some(encode) => encode(slot, ptr, self),
            None => {
                debug!("no encoder registered for dispatch tag '{tag}', skipping");
                Ok(())
            }
        }
    }

    /// Decode a polymorphic object through its registered handler.
    ///
    /// Unlike the encode side, an unknown tag is an error: the document
    /// names a type this process cannot reconstruct.
    pub fn dispatch_deserialize(&self, tag: &str, json: &Value) -> Result<*mut (), CodecError> {
        match self.dispatch.decode_fn(tag) {
            // Handler contract: json is the node the tag's codec expects.
            Some(decode) => unsafe { decode(json, self) },
            None => Err(CodecError::UnknownDispatchTag {
                tag: tag.to_string(),
            }),
        }
    }
}

impl Default for DocArena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DocArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocArena")
            .field("allocated_bytes", &self.bump.allocated_bytes())
            .field("dispatch", &self.dispatch)
            .finish()
    }
}
