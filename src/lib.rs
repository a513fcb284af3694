//! Reconstructs Objective-C and Swift declarations from Mach-O binaries by
//! walking `__objc_*`/`__swift5_*` runtime metadata sections (§1).

pub mod address_map;
pub mod arch;
pub mod cache;
pub mod container;
pub mod cursor;
pub mod demangle;
pub mod encoding;
pub mod error;
pub mod fixups;
pub mod macho;
pub mod objc;
pub mod options;
pub mod pipeline;
pub mod pointer;
pub mod registry;
pub mod swift;
pub mod visitor;

pub use container::Container;
pub use error::{Diagnostic, Error, Result, Severity};
pub use macho::MachOFile;
pub use pipeline::{extract, process_many, Cancellation};
pub use visitor::ExtractedModel;
