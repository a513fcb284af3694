//! Closed-set lookup tables for Swift's single-letter stdlib shortcuts,
//! fixed-width integer codes, and `Builtin.*` codes (§4.J "Standard
//! shortcuts").

/// `S<letter>` single-character stdlib type shortcuts.
pub fn standard_shortcut(code: char) -> Option<&'static str> {
    Some(match code {
        'S' => "String",
        'i' => "Int",
        'b' => "Bool",
        'd' => "Double",
        'f' => "Float",
        'u' => "UInt",
        'a' => "Array",
        'D' => "Dictionary",
        'h' => "Set",
        'q' => "Optional",
        'Q' => "ImplicitlyUnwrappedOptional",
        'V' => "UnsafeRawPointer",
        'v' => "UnsafeMutableRawPointer",
        'P' => "UnsafePointer",
        'p' => "UnsafeMutablePointer",
        'r' => "UnsafeBufferPointer",
        'R' => "UnsafeMutableBufferPointer",
        'A' => "ContiguousArray",
        's' => "Substring",
        'c' => "Character",
        'y' => "Void",
        'n' => "Never",
        'z' => "RawRepresentable",
        _ => return None,
    })
}

/// `s<letter><digits>V` fixed-width integer/float forms, e.g. `s5Int8V`.
pub fn fixed_width_name(name: &str) -> Option<&'static str> {
    Some(match name {
        "Int8" => "Int8",
        "Int16" => "Int16",
        "Int32" => "Int32",
        "Int64" => "Int64",
        "UInt8" => "UInt8",
        "UInt16" => "UInt16",
        "UInt32" => "UInt32",
        "UInt64" => "UInt64",
        "Float32" => "Float32",
        "Float64" => "Float64",
        _ => return None,
    })
}

/// `B<letter>` builtin codes.
pub fn builtin_code(code: char) -> Option<&'static str> {
    Some(match code {
        'o' => "Builtin.NativeObject",
        'p' => "Builtin.RawPointer",
        'w' => "Builtin.Word",
        'i' => "Builtin.IntLiteral",
        'D' => "Builtin.UnknownObject",
        'b' => "Builtin.BridgeObject",
        'f' => "Builtin.FPIEEE",
        't' => "Builtin.SILToken",
        'v' => "Builtin.Vec",
        _ => return None,
    })
}
