#![forbid(unsafe_code)]
//! docarc-core: shared kernel for the docarc columnar archive format.
//!
//! This crate contains only *pure* types and small helpers used by every
//! other crate in the workspace. There is **no I/O**, **no async**, and
//! **no allocation policy** here, by design.
//!
//! Crates that use this:
//! - docarc-dict: implements the string dictionary; uses `error::Error` and nothing else.
//! - docarc-doc: builds the document tree using `value::ValueType`/`value::Sentinel`.
//! - docarc-columnar: pivots documents using the same value-type lattice.
//! - docarc-format: serializes using `marker::Marker` and `header::ArchiveHeader`.
//! - docarc-index: bakes the string-id index using `error::Error`.
//! - docarc-cli: wires the pipeline together and reports `error::Error` to the user.

pub mod config;
pub mod error;
pub mod marker;
pub mod oid;
pub mod value;

pub mod prelude {
    pub use crate::config::{BuildConfig, Compressor, DictType};
    pub use crate::error::{Error, Result};
    pub use crate::marker::Marker;
    pub use crate::oid::ObjectIdGenerator;
    pub use crate::value::{Sentinel, ValueType};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Magic bytes at the start of every archive file. Chosen to be
/// unambiguous in a hex dump and to fail fast on non-archive input.
pub const ARCHIVE_MAGIC: [u8; 8] = *b"DOCARC01";

/// Current on-wire format version. Bump when the binary layout changes
/// in a way old readers cannot tolerate.
pub const FORMAT_VERSION: u32 = 1;
