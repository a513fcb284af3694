//! The aggregated, per-file result of running phases A–G (§4.L): header
//! metadata plus the Objective-C and Swift processors' output, ready for a
//! visitor to walk.

use crate::error::Diagnostic;
use crate::macho::MachOFile;
use crate::objc::ObjCModel;
use crate::swift::SwiftModel;

#[derive(Debug, Clone)]
pub struct FileHeader {
    pub arch_name: &'static str,
    pub uuid: Option<[u8; 16]>,
    pub build_platform: Option<u32>,
    pub sdk_version: Option<u32>,
}

#[derive(Debug)]
pub struct ExtractedModel {
    pub header: FileHeader,
    pub objc: ObjCModel,
    pub swift: SwiftModel,
}

impl ExtractedModel {
    pub fn build(file: &MachOFile, objc: ObjCModel, swift: SwiftModel) -> ExtractedModel {
        let header = FileHeader {
            arch_name: file.arch().name(),
            uuid: file.uuid,
            build_platform: file.build_version.as_ref().map(|bv| bv.platform),
            sdk_version: file.build_version.as_ref().map(|bv| bv.sdk),
        };
        ExtractedModel { header, objc, swift }
    }

    /// All diagnostics from both processors, in the order they were
    /// produced (§7: "non-fatal errors produce optional diagnostics").
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        self.objc.diagnostics.iter().chain(self.swift.diagnostics.iter()).collect()
    }
}
