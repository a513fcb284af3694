//! Optional dynamic demangling adapter (§4.J: "An optional dynamic adapter
//! may consult a host-provided demangling oracle"). The core demangler
//! never depends on this trait being implemented.

/// A host-provided demangler consulted when the built-in grammar doesn't
/// recognize a mangled name. Implementations are expected to be blocking
/// (§5: "spawns a subprocess and is therefore blocking"); callers are
/// responsible for keeping this off any hot path and caching the result.
pub trait DemangleOracle: Send + Sync {
    fn demangle(&self, mangled: &str) -> Option<String>;
}
