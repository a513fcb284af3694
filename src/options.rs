//! Pipeline configuration structs (§6, §4.L): how a file is read, and how
//! the extracted model is rendered to output. No CLI argument parsing
//! lives here — these are the shapes a front end populates.

use std::sync::Arc;

use crate::arch::Arch;
use crate::demangle::DemangleOracle;

/// A host-provided table of selectors keyed by offset into a shared cache,
/// consulted by the small-method-list relative-selector path (§4.F "an
/// optional external dyld-shared-cache selector-table provider").
pub trait SharedCacheSelectorProvider: Send + Sync {
    fn selector_at(&self, offset: u64) -> Option<String>;
}

/// Controls how a Mach-O file is read and its metadata extracted (§6).
pub struct ReadOptions {
    /// Restrict extraction to one architecture slice of a fat binary.
    /// `None` selects the best match for the host, per `Container::best_match`.
    pub arch: Option<Arch>,
    /// Whether Swift/ObjC mangled names are demangled in the output model.
    pub demangle: bool,
    pub shared_cache_selectors: Option<Arc<dyn SharedCacheSelectorProvider>>,
    pub demangle_oracle: Option<Arc<dyn DemangleOracle>>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            arch: None,
            demangle: true,
            shared_cache_selectors: None,
            demangle_oracle: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Alphabetical,
    InheritanceDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HideSections {
    pub ivars: bool,
    pub properties: bool,
    pub protocols: bool,
    pub categories: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitLayout {
    SingleFile,
    MultiFile,
}

/// Controls how the visitor walks and renders the extracted model (§4.L).
#[derive(Debug, Clone)]
pub struct VisitOptions {
    pub sort_order: SortOrder,
    pub hide: HideSections,
    pub emit_forward_declarations: bool,
    pub show_ivar_offsets: bool,
    pub show_method_addresses: bool,
    pub layout: EmitLayoutOwned,
}

/// `EmitLayout` plus the output directory multi-file mode needs; kept as
/// its own type so `VisitOptions` stays `Clone` without forcing `Copy` on
/// a path.
#[derive(Debug, Clone)]
pub enum EmitLayoutOwned {
    SingleFile,
    MultiFile { output_dir: String },
}

impl From<EmitLayout> for EmitLayoutOwned {
    fn from(layout: EmitLayout) -> Self {
        match layout {
            EmitLayout::SingleFile => EmitLayoutOwned::SingleFile,
            EmitLayout::MultiFile => EmitLayoutOwned::MultiFile {
                output_dir: ".".to_string(),
            },
        }
    }
}

impl Default for VisitOptions {
    fn default() -> Self {
        VisitOptions {
            sort_order: SortOrder::Alphabetical,
            hide: HideSections::default(),
            emit_forward_declarations: true,
            show_ivar_offsets: false,
            show_method_addresses: false,
            layout: EmitLayoutOwned::SingleFile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_read_options_demangle_and_select_best_match() {
        let opts = ReadOptions::default();
        assert!(opts.demangle);
        assert!(opts.arch.is_none());
    }

    #[test]
    fn default_visit_options_sort_alphabetically_single_file() {
        let opts = VisitOptions::default();
        assert_eq!(opts.sort_order, SortOrder::Alphabetical);
        assert!(matches!(opts.layout, EmitLayoutOwned::SingleFile));
    }
}
