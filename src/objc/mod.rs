//! Objective-C runtime metadata: classes, categories, protocols, method
//! lists, ivars, and properties reconstructed from `__objc_*` sections
//! (§4.F).

pub mod category;
pub mod class;
pub mod image_info;
pub mod ivar;
pub mod method;
pub mod processor;
pub mod property;
pub mod protocol;

pub use category::Category;
pub use class::{Class, ClassRef};
pub use image_info::ImageInfo;
pub use ivar::{IVar, IVarList};
pub use method::{Method, MethodList};
pub use processor::{ObjCModel, ObjCProcessor};
pub use property::{Property, PropertyList};
pub use protocol::{Protocol, ProtocolList};
