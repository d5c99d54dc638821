//! Error types produced by the core synthesis engine.

use std::fmt;
use std::io;

/// An error produced while parsing an LTLf formula or a partition file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseError {
    message: String,
    position: Option<usize>,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    pub(crate) fn at(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(position),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "parse error at position {}: {}", pos, self.message),
            None => write!(f, "parse error: {}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error produced while reading a partition file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PartitionError {
    /// An atomic proposition is listed in neither `.inputs:` nor `.outputs:`.
    UnknownAtom(String),
    /// An atomic proposition is listed in both `.inputs:` and `.outputs:`.
    DuplicateAtom(String),
    /// The partition file is malformed.
    Malformed(String),
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAtom(a) => write!(f, "atomic proposition '{}' used in formula but not listed in partition", a),
            Self::DuplicateAtom(a) => write!(f, "atomic proposition '{}' listed in both .inputs and .outputs", a),
            Self::Malformed(msg) => write!(f, "malformed partition file: {}", msg),
        }
    }
}

impl std::error::Error for PartitionError {}

/// The error kinds surfaced by the core synthesis engine.
///
/// This mirrors the error kinds of the underlying CUDD-style manager wrappers
/// elsewhere in this crate: hand-written variants with a manual [`Display`]
/// and [`std::error::Error`] implementation, no `anyhow`/`thiserror`.
#[derive(Debug)]
pub enum CynthiaError {
    /// Ill-formed construction: a handle from a foreign context, a `PropNot`
    /// over a non-atom, `xnf` called on non-NNF input, or a partition
    /// mentioning an unknown atom.
    InvalidArgument(String),
    /// A parse error from the surface grammar or partition file reader,
    /// passed through unchanged.
    Parse(ParseError),
    /// A partition file error.
    Partition(PartitionError),
    /// The cancellation flag was observed set during search.
    Cancelled,
    /// An SDD manager failure or other invariant violation. Treated as a bug.
    Internal(String),
    /// An I/O error while reading a formula or partition file.
    Io(io::Error),
}

impl fmt::Display for CynthiaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Self::Parse(e) => write!(f, "{}", e),
            Self::Partition(e) => write!(f, "{}", e),
            Self::Cancelled => write!(f, "synthesis was cancelled"),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CynthiaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Partition(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for CynthiaError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<PartitionError> for CynthiaError {
    fn from(e: PartitionError) -> Self {
        Self::Partition(e)
    }
}

impl From<io::Error> for CynthiaError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// The exit code this error should produce at the CLI boundary (§6 of the
/// specification): `2` for recoverable input errors, `3` for internal bugs.
impl CynthiaError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) | Self::Parse(_) | Self::Partition(_) | Self::Io(_) => 2,
            Self::Cancelled => 2,
            Self::Internal(_) => 3,
        }
    }
}

/// Convenience alias for a [`Result`] whose error type is [`CynthiaError`].
pub type Result<T> = std::result::Result<T, CynthiaError>;
