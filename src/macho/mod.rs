//! Mach-O container internals: constants, the per-slice file reader, load
//! commands, segments/sections, and the lazy symbol table.

pub mod consts;
pub mod header;
pub mod load_command;
pub mod segment;
pub mod symtab;

pub use header::MachOFile;
pub use load_command::{DylibCommand, DylibKind, LoadCommand};
pub use segment::{Section, Segment};
pub use symtab::Symbol;
