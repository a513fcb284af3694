//! Swift reflection metadata: nominal type descriptors, field descriptors,
//! and protocol conformances reconstructed from `__swift5_*` sections
//! (§4.G).

pub mod conformance;
pub mod descriptor;
pub mod field;
pub mod processor;
pub mod protocol;
pub mod symbolic_ref;

pub use conformance::ProtocolConformance;
pub use descriptor::{NominalKind, TypeContextDescriptor};
pub use field::{FieldDescriptor, FieldRecord};
pub use processor::{fields_not_backed_by_ivars, SwiftModel, SwiftProcessor};
pub use protocol::SwiftProtocolDescriptor;
pub use symbolic_ref::{read_symbolic_reference, resolve_relative, SymbolicReference};
