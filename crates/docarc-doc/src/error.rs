use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("ARRAY_OF_ARRAYS at {pointer}: JSON arrays may not contain arrays")]
    ArrayOfArrays { pointer: String },

    #[error("ARRAY_OF_MIXED_TYPES at {pointer}: {detail}")]
    ArrayOfMixedTypes { pointer: String, detail: String },

    #[error("JSONTYPE: top-level JSON must be an object or an array of objects, found {found}")]
    JsonType { found: &'static str },

    #[error(transparent)]
    Core(#[from] docarc_core::error::Error),
}

impl Error {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::ArrayOfArrays { .. } => {
                vec!["Flatten nested arrays, or model them as an array of single-key objects".into()]
            }
            Error::ArrayOfMixedTypes { .. } => {
                vec!["Arrays must hold either uniform scalars, uniform objects, or nulls mixed with one of those".into()]
            }
            Error::JsonType { .. } => {
                vec!["Wrap scalar/array-of-scalar top-level input in a single JSON object".into()]
            }
            Error::Core(_) => vec![],
        }
    }
}
