#![forbid(unsafe_code)]

pub mod doc;
pub mod error;
pub mod from_json;
pub mod infer;

pub mod prelude {
    pub use crate::doc::{DocObject, Entry, EntryValues, Scalar};
    pub use crate::error::{Error, Result};
    pub use crate::from_json::from_json;
}
