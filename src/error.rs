//! Error taxonomy for the `machodecl` pipeline.
//!
//! Container- and header-level failures are fatal for the file being
//! processed (the caller gets an `Err`). Record-level failures inside the
//! Objective-C and Swift processors are captured as [`Diagnostic`]s on the
//! extracted model instead of aborting — see `ExtractedModel::diagnostics`.

use std::fmt;

/// Errors that can terminate parsing of a single architecture slice.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("requested architecture not present in fat file")]
    ArchitectureNotFound,

    #[error("first 4 bytes match no known Mach-O magic")]
    InvalidMagic,

    #[error("read at offset {offset:#x} of length {len} would cross end of file (size {size})")]
    TruncatedFile {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("malformed load command #{index} at offset {offset:#x}: {reason}")]
    MalformedLoadCommand {
        index: u32,
        offset: usize,
        reason: &'static str,
    },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(&'static str),

    #[error("syntax error ({kind}) in {remaining:?}")]
    SyntaxError {
        kind: SyntaxErrorKind,
        remaining: String,
    },

    #[error("pointer could not be resolved to a file offset or external symbol")]
    UnresolvedReference,

    #[error("corrupt metadata: {0}")]
    CorruptMetadata(&'static str),

    #[error("invalid LEB128 encoding at offset {0:#x}")]
    InvalidLeb128(usize),
}

/// Reasons a type-encoding or mangled-name grammar can fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    UnexpectedEof,
    UnexpectedToken,
    UnterminatedAggregate,
    InvalidNumber,
    InvalidMangling,
    RecursionLimit,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyntaxErrorKind::UnexpectedEof => "unexpected end of input",
            SyntaxErrorKind::UnexpectedToken => "unexpected token",
            SyntaxErrorKind::UnterminatedAggregate => "unterminated struct/union/array",
            SyntaxErrorKind::InvalidNumber => "invalid numeric literal",
            SyntaxErrorKind::InvalidMangling => "invalid mangling grammar",
            SyntaxErrorKind::RecursionLimit => "recursion limit exceeded",
        };
        f.write_str(s)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A non-fatal, record-level finding surfaced alongside a successfully
/// extracted model (§7: "Non-fatal errors produce optional diagnostics").
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            offset: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            offset: None,
        }
    }

    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(off) => write!(f, "{:?} @ {:#x}: {}", self.severity, off, self.message),
            None => write!(f, "{:?}: {}", self.severity, self.message),
        }
    }
}
