//! Architecture identification shared by the container and Mach-O readers.

use crate::macho::consts;

/// A `(cputype, cpusubtype)` pair identifying one Mach-O architecture slice.
///
/// Mirrors the teacher's `architecture()` match over `cputype` in
/// `read/macho/file.rs`, generalized to a value type so the container
/// reader (component B) can compare requested vs. available architectures
/// without parsing a whole file first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arch {
    pub cpu_type: u32,
    pub cpu_subtype: u32,
}

impl Arch {
    pub fn new(cpu_type: u32, cpu_subtype: u32) -> Self {
        Arch {
            cpu_type,
            cpu_subtype,
        }
    }

    /// The subtype with capability bits (the high byte: `CPU_SUBTYPE_MASK`)
    /// masked off, used for "masked comparison" per §4.B and §8 property 1.
    pub fn masked_subtype(&self) -> u32 {
        self.cpu_subtype & !consts::CPU_SUBTYPE_MASK
    }

    pub fn masked(&self) -> Arch {
        Arch {
            cpu_type: self.cpu_type,
            cpu_subtype: self.masked_subtype(),
        }
    }

    /// Whether this CPU type's family bit marks a 64-bit ABI
    /// (`CPU_ARCH_ABI64` / `CPU_ARCH_ABI64_32`).
    pub fn uses_64bit_abi(&self) -> bool {
        self.cpu_type & consts::CPU_ARCH_ABI64 != 0
    }

    /// The CPU family, ignoring the 64-bit ABI bit, used to find "another
    /// slice in the same family" per §4.B rule 3.
    pub fn family(&self) -> u32 {
        self.cpu_type & !(consts::CPU_ARCH_ABI64 | consts::CPU_ARCH_ABI64_32)
    }

    pub fn name(&self) -> &'static str {
        match (self.cpu_type, self.masked_subtype()) {
            (consts::CPU_TYPE_POWERPC, _) => "ppc",
            (consts::CPU_TYPE_POWERPC64, _) => "ppc64",
            (consts::CPU_TYPE_I386, _) => "i386",
            (consts::CPU_TYPE_X86_64, _) => "x86_64",
            (consts::CPU_TYPE_ARM, consts::CPU_SUBTYPE_ARM_V6) => "armv6",
            (consts::CPU_TYPE_ARM, consts::CPU_SUBTYPE_ARM_V7) => "armv7",
            (consts::CPU_TYPE_ARM, consts::CPU_SUBTYPE_ARM_V7S) => "armv7s",
            (consts::CPU_TYPE_ARM, _) => "arm",
            (consts::CPU_TYPE_ARM64, consts::CPU_SUBTYPE_ARM64E) => "arm64e",
            (consts::CPU_TYPE_ARM64, _) => "arm64",
            _ => "unknown",
        }
    }

    /// Parses one of the `--arch` names enumerated in §6.
    pub fn from_name(name: &str) -> Option<Arch> {
        Some(match name {
            "ppc" => Arch::new(consts::CPU_TYPE_POWERPC, 0),
            "ppc64" => Arch::new(consts::CPU_TYPE_POWERPC64, 0),
            "i386" => Arch::new(consts::CPU_TYPE_I386, consts::CPU_SUBTYPE_I386_ALL),
            "x86_64" => Arch::new(consts::CPU_TYPE_X86_64, consts::CPU_SUBTYPE_X86_64_ALL),
            "armv6" => Arch::new(consts::CPU_TYPE_ARM, consts::CPU_SUBTYPE_ARM_V6),
            "armv7" => Arch::new(consts::CPU_TYPE_ARM, consts::CPU_SUBTYPE_ARM_V7),
            "armv7s" => Arch::new(consts::CPU_TYPE_ARM, consts::CPU_SUBTYPE_ARM_V7S),
            "arm64" => Arch::new(consts::CPU_TYPE_ARM64, consts::CPU_SUBTYPE_ARM64_ALL),
            "arm64e" => Arch::new(consts::CPU_TYPE_ARM64, consts::CPU_SUBTYPE_ARM64E),
            _ => return None,
        })
    }

    /// True for the ARM64E pointer-authentication family, which needs PAC
    /// bits stripped from chained-fixup targets (§4.D, §4.E).
    pub fn is_arm64e(&self) -> bool {
        self.cpu_type == consts::CPU_TYPE_ARM64 && self.masked_subtype() == consts::CPU_SUBTYPE_ARM64E
    }
}
