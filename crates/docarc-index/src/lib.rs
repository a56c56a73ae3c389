#![forbid(unsafe_code)]
//! docarc-index: the optional string-id -> file-offset index (C7, §4.6)
//! that `docarc build --bake-string-id-index` appends to a written
//! archive, backed by a robin-hood open-addressed hash table.

pub mod bake;
pub mod error;
pub mod hashtable;
pub mod scan;

pub mod prelude {
    pub use crate::bake::{bake_string_id_index, deserialize_index};
    pub use crate::error::{Error, Result};
    pub use crate::hashtable::RobinHoodTable;
    pub use crate::scan::collect_string_offsets;
}

pub use bake::bake_string_id_index;
