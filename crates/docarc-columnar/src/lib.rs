#![forbid(unsafe_code)]
//! docarc-columnar: the columnar transform (C4, §4.3) and the optional
//! read-optimized sort pass (C5, §4.4).

pub mod columndoc;
pub mod error;
pub mod sort;
pub mod transform;

pub mod prelude {
    pub use crate::columndoc::{ColumnDoc, ColumnEntry, ObjectArrayColumn, ObjectArrayGroup, ScalarColumn, ArrayColumn, WireScalar};
    pub use crate::error::{Error, Result};
    pub use crate::sort::sort_columndoc;
    pub use crate::transform::{collect_strings, preregister, to_columndoc};
}
