//! Unified error taxonomy shared by every crate in the workspace.
//!
//! Each downstream crate still defines its own `Error` enum (mirroring the
//! source project's convention of one error type per crate) but every one
//! of those enums carries a `Core(docarc_core::error::Error)` variant and
//! converts into this taxonomy at its boundary, so a CLI that only knows
//! about `docarc_core::error::Error` can still print a coherent message no
//! matter which crate raised it.

use std::fmt;
use thiserror::Error;

/// Canonical result type for code that reports through the shared taxonomy.
pub type Result<T> = std::result::Result<T, Error>;

/// A source location captured at the point an error was raised, matching
/// the `(code, file, line)` triple the original C implementation attaches
/// to every leaf failure.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// The eight error kinds named in the specification's error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error at {loc}: {source}")]
    Io {
        loc: Location,
        #[source]
        source: std::io::Error,
    },

    #[error("format error at {loc}: {detail}")]
    Format { loc: Location, detail: String },

    #[error("parse error: {detail}")]
    Parse { detail: String, line: Option<usize>, column: Option<usize> },

    #[error("invariant violated: {detail}{}", pointer.as_ref().map(|p| format!(" (at {p})")).unwrap_or_default())]
    Invariant { detail: String, pointer: Option<String> },

    #[error("unexpected type at {loc}: {detail}")]
    Type { loc: Location, detail: String },

    #[error("resource exhausted: {detail}")]
    Resource { detail: String },

    #[error("lookup failed: {detail}")]
    Lookup { detail: String },

    #[error("internal error at {loc}: {detail} (this indicates a bug)")]
    Internal { loc: Location, detail: String },

    /// Error with a context chain, following the teacher's `with_context` convention.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn io(loc: Location, source: std::io::Error) -> Self {
        Error::Io { loc, source }
    }

    pub fn format(loc: Location, detail: impl Into<String>) -> Self {
        Error::Format { loc, detail: detail.into() }
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Error::Parse { detail: detail.into(), line: None, column: None }
    }

    pub fn parse_at(detail: impl Into<String>, line: usize, column: usize) -> Self {
        Error::Parse { detail: detail.into(), line: Some(line), column: Some(column) }
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Error::Invariant { detail: detail.into(), pointer: None }
    }

    pub fn invariant_at(detail: impl Into<String>, pointer: impl Into<String>) -> Self {
        Error::Invariant { detail: detail.into(), pointer: Some(pointer.into()) }
    }

    pub fn ty(loc: Location, detail: impl Into<String>) -> Self {
        Error::Type { loc, detail: detail.into() }
    }

    pub fn resource(detail: impl Into<String>) -> Self {
        Error::Resource { detail: detail.into() }
    }

    pub fn lookup(detail: impl Into<String>) -> Self {
        Error::Lookup { detail: detail.into() }
    }

    pub fn internal(loc: Location, detail: impl Into<String>) -> Self {
        Error::Internal { loc, detail: detail.into() }
    }

    /// Add context to an error, creating an error chain.
    ///
    /// # Example
    /// ```
    /// use docarc_core::error::Error;
    /// let err = Error::lookup("unknown string id 42");
    /// let err = err.with_context("while extracting archive row 3");
    /// ```
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable error code, e.g. for the CLI's exit message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io { .. } => "IO",
            Error::Format { .. } => "FORMAT",
            Error::Parse { .. } => "PARSE",
            Error::Invariant { .. } => "INVARIANT",
            Error::Type { .. } => "TYPE",
            Error::Resource { .. } => "RESOURCE",
            Error::Lookup { .. } => "LOOKUP",
            Error::Internal { .. } => "INTERNAL",
            Error::Context { source, .. } => source.code(),
        }
    }

    /// Short, human-facing suggestions for common failure classes.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::Format { detail, .. } if detail.contains("magic") => {
                vec!["Check that the input file is a docarc archive, not raw JSON".into()]
            }
            Error::Format { detail, .. } if detail.contains("version") => {
                vec!["Rebuild the archive with this version of docarc, or use a matching reader".into()]
            }
            Error::Invariant { .. } => {
                vec!["JSON arrays must contain either uniform scalars, uniform objects, or nulls mixed with one of those".into()]
            }
            Error::Resource { .. } => {
                vec!["The archive or dictionary has exhausted an internal counter; this is unusual for realistic input sizes".into()]
            }
            _ => vec![],
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io(Location { file: "unknown", line: 0 }, e)
    }
}

/// Captures the call site the way `#[track_caller]` would, without requiring
/// every call site to opt in; used by `internal_error!` below.
#[macro_export]
macro_rules! loc {
    () => {
        $crate::error::Location { file: file!(), line: line!() }
    };
}

/// Raises an `Error::Internal`. In debug builds this first panics via
/// `unreachable!`, matching the original's "abort the process at the call
/// site in debug builds" contract; in release builds it returns the error
/// as an ordinary `Result` instead, per §7 of the specification.
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {{
        if cfg!(debug_assertions) {
            unreachable!($($arg)*);
        }
        #[allow(unreachable_code)]
        {
            $crate::error::Error::internal($crate::loc!(), format!($($arg)*))
        }
    }};
}
