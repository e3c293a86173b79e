//! Polymorphic dispatch registry.
//!
//! Interface-kind fields hold pointers to engine objects whose concrete type
//! is only known by tag. The registry maps each tag to a pair of type-erased
//! encode/decode functions; emitted code never names concrete handlers, it
//! goes through the [`DocArena`](crate::runtime::DocArena) carrying the
//! registry.

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::CodecError;
use crate::runtime::DocArena;

/// Type-erased encode handler.
///
/// # Safety
/// `ptr` must point to a live value of the type registered under the tag.
pub type EncodeFn = unsafe fn(&mut Value, *const (), &DocArena) -> Result<(), CodecError>;

/// Type-erased decode handler. Returns an arena-owned pointer to the decoded
/// value.
pub type DecodeFn = unsafe fn(&Value, &DocArena) -> Result<*mut (), CodecError>;

#[derive(Clone, Copy)]
struct Handlers {
    encode: EncodeFn,
    decode: DecodeFn,
}

/// Tag -> handler-pair registry for polymorphic fields.
#[derive(Default, Clone)]
pub struct DispatchRegistry {
    handlers: IndexMap<String, Handlers>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler pair for `tag`, replacing any previous one.
    pub fn register(&mut self, tag: impl Into<String>, encode: EncodeFn, decode: DecodeFn) {
        self.handlers.insert(tag.into(), Handlers { encode, decode });
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    pub(crate) fn encode_fn(&self, tag: &str) -> Option<EncodeFn> {
        self.handlers.get(tag).map(|h| h.encode)
    }

    pub(crate) fn decode_fn(&self, tag: &str) -> Option<DecodeFn> {
        self.handlers.get(tag).map(|h| h.decode)
    }
}

impl std::fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchRegistry")
            .field("tags", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
