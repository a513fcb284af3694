//! Hand-assembled Mach-O byte buffers shared by the integration tests.
//! No binary fixtures are loaded from disk; every buffer is built field by
//! field, mirroring the byte-layout conventions the unit tests already use
//! (`objc::class`, `objc::method`, `container`, `macho::header`).

use machodecl::macho::consts::{LC_DYLD_CHAINED_FIXUPS, LC_SEGMENT_64, MH_EXECUTE, MH_MAGIC_64};

pub fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn push_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn push_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn push_cstr(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

fn pad16(name: &str) -> [u8; 16] {
    let mut out = [0u8; 16];
    let bytes = name.as_bytes();
    let n = bytes.len().min(16);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

const HEADER_SIZE: u32 = 32;

fn seg_cmdsize(nsects: u32) -> u32 {
    8 + 16 + 32 + 8 + 8 + 80 * nsects
}

fn fixups_cmdsize(has_fixups: bool) -> u32 {
    if has_fixups {
        16
    } else {
        0
    }
}

/// Where the catch-all data section's bytes start, for a file with a
/// `classlist_len`-byte `__objc_classlist` section followed by that data
/// section, optionally with a trailing `LC_DYLD_CHAINED_FIXUPS` command.
/// Callers need this *before* building the data section's own contents,
/// since that blob's pointers are absolute addresses into itself.
pub fn blob_base(classlist_len: u32, has_fixups: bool) -> u32 {
    HEADER_SIZE + seg_cmdsize(2) + fixups_cmdsize(has_fixups) + classlist_len
}

/// Assembles a thin little-endian 64-bit Mach-O: one `__DATA` segment
/// (vmaddr 0, flat addressing so vmaddr == file offset throughout),
/// containing an `__objc_classlist` section followed by one catch-all
/// `__objc_data` section, and an optional `LC_DYLD_CHAINED_FIXUPS` load
/// command whose payload is appended after both sections.
pub fn build_thin_macho(cpu_type: u32, cpu_subtype: u32, classlist: &[u8], blob: &[u8], fixups_payload: Option<&[u8]>) -> Vec<u8> {
    let nsects = 2u32;
    let has_fixups = fixups_payload.is_some();
    let sizeofcmds = seg_cmdsize(nsects) + fixups_cmdsize(has_fixups);
    let ncmds = if has_fixups { 2 } else { 1 };
    let data_start = HEADER_SIZE + sizeofcmds;
    let classlist_off = data_start;
    let blob_off = classlist_off + classlist.len() as u32;
    assert_eq!(blob_off, blob_base(classlist.len() as u32, has_fixups), "blob_base() must match this layout");
    let total_size = (blob_off + blob.len() as u32) as u64;

    let mut buf = Vec::new();
    push_u32(&mut buf, MH_MAGIC_64);
    push_u32(&mut buf, cpu_type);
    push_u32(&mut buf, cpu_subtype);
    push_u32(&mut buf, MH_EXECUTE);
    push_u32(&mut buf, ncmds);
    push_u32(&mut buf, sizeofcmds);
    push_u32(&mut buf, 0);
    push_u32(&mut buf, 0);
    assert_eq!(buf.len() as u32, HEADER_SIZE);

    push_u32(&mut buf, LC_SEGMENT_64);
    push_u32(&mut buf, seg_cmdsize(nsects));
    buf.extend_from_slice(&pad16("__DATA"));
    push_u64(&mut buf, 0); // vmaddr
    push_u64(&mut buf, total_size); // vmsize
    push_u64(&mut buf, 0); // fileoff
    push_u64(&mut buf, total_size); // filesize
    push_i32(&mut buf, 0); // maxprot
    push_i32(&mut buf, 0); // initprot
    push_u32(&mut buf, nsects);
    push_u32(&mut buf, 0); // flags

    for (sectname, off, len) in [
        ("__objc_classlist", classlist_off, classlist.len() as u64),
        ("__objc_data", blob_off, blob.len() as u64),
    ] {
        buf.extend_from_slice(&pad16(sectname));
        buf.extend_from_slice(&pad16("__DATA"));
        push_u64(&mut buf, off as u64); // addr == file offset (flat segment)
        push_u64(&mut buf, len);
        push_u32(&mut buf, off);
        push_u32(&mut buf, 0); // align
        push_u32(&mut buf, 0); // reloff
        push_u32(&mut buf, 0); // nreloc
        push_u32(&mut buf, 0); // flags
        push_u32(&mut buf, 0); // reserved1
        push_u32(&mut buf, 0); // reserved2
        push_u32(&mut buf, 0); // reserved3
    }

    let fixups_dataoff = blob_off + blob.len() as u32;
    if let Some(payload) = fixups_payload {
        push_u32(&mut buf, LC_DYLD_CHAINED_FIXUPS);
        push_u32(&mut buf, 16);
        push_u32(&mut buf, fixups_dataoff);
        push_u32(&mut buf, payload.len() as u32);
    }

    assert_eq!(buf.len() as u32, data_start);
    buf.extend_from_slice(classlist);
    buf.extend_from_slice(blob);
    if let Some(payload) = fixups_payload {
        buf.extend_from_slice(payload);
    }
    buf
}

/// Builds an `LC_DYLD_CHAINED_FIXUPS` payload with a single bind import
/// pointing at `symbol_name`, and no rebase pages — enough for a pointer
/// resolver to decode an ARM64E/64-bit bind word at ordinal 0 (§4.D).
pub fn build_single_import_fixups(symbol_name: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    let starts_offset = 28u32;
    let imports_offset = starts_offset + 4;
    let symbols_offset = imports_offset + 4;

    push_u32(&mut buf, 0); // fixups_version
    push_u32(&mut buf, starts_offset);
    push_u32(&mut buf, imports_offset);
    push_u32(&mut buf, symbols_offset);
    push_u32(&mut buf, 1); // imports_count
    push_u32(&mut buf, 1); // imports_format = DYLD_CHAINED_IMPORT
    push_u32(&mut buf, 0); // symbols_format = uncompressed
    assert_eq!(buf.len() as u32, starts_offset);

    push_u32(&mut buf, 0); // seg_count = 0
    assert_eq!(buf.len() as u32, imports_offset);

    push_u32(&mut buf, 0); // packed: ordinal 0, not weak, name_offset 0
    assert_eq!(buf.len() as u32, symbols_offset);

    push_cstr(&mut buf, symbol_name);
    buf
}

/// Appends a nul-terminated string to `blob` (whose absolute base address
/// is `base`) and returns its absolute address.
pub fn append_cstring(blob: &mut Vec<u8>, base: u32, s: &str) -> u32 {
    let addr = base + blob.len() as u32;
    push_cstr(blob, s);
    addr
}

/// Appends a normal (24-byte-entry) Objective-C method list to `blob` and
/// returns its absolute address.
pub fn append_method_list(blob: &mut Vec<u8>, base: u32, methods: &[(&str, &str)]) -> u32 {
    let list_addr = base + blob.len() as u32;
    push_u32(blob, 0); // entsize_and_flags: normal, not small
    push_u32(blob, methods.len() as u32);

    let entries_start = blob.len();
    blob.resize(entries_start + 24 * methods.len(), 0);

    for (i, (selector, type_encoding)) in methods.iter().enumerate() {
        let sel_addr = append_cstring(blob, base, selector);
        let type_addr = append_cstring(blob, base, type_encoding);
        let entry_off = entries_start + 24 * i;
        blob[entry_off..entry_off + 8].copy_from_slice(&(sel_addr as u64).to_le_bytes());
        blob[entry_off + 8..entry_off + 16].copy_from_slice(&(type_addr as u64).to_le_bytes());
        blob[entry_off + 16..entry_off + 24].copy_from_slice(&0u64.to_le_bytes());
    }
    list_addr
}

/// Appends a 72-byte `class_ro_t` record (name at the known offset-24
/// slot, `base_methods`/`base_protocols` pointers elsewhere) and returns
/// its absolute address.
pub fn append_class_ro(blob: &mut Vec<u8>, base: u32, name: &str, base_methods_addr: u64, base_protocols_addr: u64) -> u32 {
    let ro_addr = base + blob.len() as u32;
    let ro_off = blob.len();
    blob.resize(ro_off + 72, 0);
    let name_addr = append_cstring(blob, base, name);

    push_u32_at(blob, ro_off, 0); // flags
    push_u32_at(blob, ro_off + 4, 0); // instance_start
    push_u32_at(blob, ro_off + 8, 0); // instance_size
    push_u32_at(blob, ro_off + 12, 0); // reserved
    push_u64_at(blob, ro_off + 16, 0); // ivar_layout
    push_u64_at(blob, ro_off + 24, name_addr as u64);
    push_u64_at(blob, ro_off + 32, base_methods_addr);
    push_u64_at(blob, ro_off + 40, base_protocols_addr);
    push_u64_at(blob, ro_off + 48, 0); // ivars
    push_u64_at(blob, ro_off + 56, 0); // weak_ivar_layout
    push_u64_at(blob, ro_off + 64, 0); // base_properties
    ro_addr
}

fn push_u32_at(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

fn push_u64_at(buf: &mut [u8], off: usize, v: u64) {
    buf[off..off + 8].copy_from_slice(&v.to_le_bytes());
}

/// Appends a 40-byte `class_t` record (isa/superclass/cache/vtable/data)
/// and returns its absolute address. `superclass_raw` is the raw on-file
/// word — a plain local address when there are no chained fixups, or a
/// bind-chain word when `fixups` will be supplied to the processor.
pub fn append_class(blob: &mut Vec<u8>, base: u32, superclass_raw: u64, ro_addr: u32) -> u32 {
    let class_addr = base + blob.len() as u32;
    push_u64(blob, 0); // isa
    push_u64(blob, superclass_raw);
    push_u64(blob, 0); // cache
    push_u64(blob, 0); // vtable
    push_u64(blob, ro_addr as u64); // data (swift-stable bit clear)
    class_addr
}
