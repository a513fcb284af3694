//! Component M: bounded, thread-safe LRU caches shared across a pipeline
//! run — parsed type encodings, parsed method types, and demangled names
//! (§4.M). All three are mutex-guarded; reads are cheap, writes rare.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

use crate::encoding::{parse_method_type, parse_type, Type};
use crate::error::Result;

const DEFAULT_CAPACITY: usize = 4096;

/// Caches `encoding → parsedType` and `encoding → parsedMethodType`,
/// computing and inserting on miss. Default capacity is generous enough to
/// cover one process invocation; callers who need a harder bound can
/// construct with [`EncodingCache::with_capacity`].
pub struct EncodingCache {
    types: Mutex<LruCache<String, Type>>,
    method_types: Mutex<LruCache<String, Vec<Type>>>,
}

impl EncodingCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap();
        EncodingCache {
            types: Mutex::new(LruCache::new(cap)),
            method_types: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get_or_parse_type(&self, encoding: &str) -> Result<Type> {
        if let Some(cached) = self.types.lock().get(encoding) {
            return Ok(cached.clone());
        }
        let parsed = parse_type(encoding)?;
        self.types.lock().put(encoding.to_string(), parsed.clone());
        Ok(parsed)
    }

    pub fn get_or_parse_method_type(&self, encoding: &str) -> Result<Vec<Type>> {
        if let Some(cached) = self.method_types.lock().get(encoding) {
            return Ok(cached.clone());
        }
        let parsed = parse_method_type(encoding)?;
        self.method_types.lock().put(encoding.to_string(), parsed.clone());
        Ok(parsed)
    }

    pub fn clear(&self) {
        self.types.lock().clear();
        self.method_types.lock().clear();
    }
}

impl Default for EncodingCache {
    fn default() -> Self {
        EncodingCache::new()
    }
}

/// Caches `mangledName → demangledName`, shared between the built-in
/// demangler and an optional oracle (§4.J, §4.M). The oracle's result is
/// preferred over the built-in one when both are available; this cache
/// doesn't care which produced the cached value, only that oracle lookups
/// should consult it first.
pub struct DemangleCache {
    entries: Mutex<LruCache<String, String>>,
}

impl DemangleCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap();
        DemangleCache {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Returns the cached demangling for `mangled`, computing and caching
    /// it via `compute` on a miss. `compute` typically tries the oracle
    /// first, falling back to the built-in demangler (§4.J).
    pub fn get_or_compute(&self, mangled: &str, compute: impl FnOnce() -> String) -> String {
        if let Some(cached) = self.entries.lock().get(mangled) {
            return cached.clone();
        }
        let computed = compute();
        self.entries.lock().put(mangled.to_string(), computed.clone());
        computed
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for DemangleCache {
    fn default() -> Self {
        DemangleCache::new()
    }
}
