use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("CORRUPTED: string-id index {detail}")]
    Corrupted { detail: String },

    #[error(transparent)]
    Core(#[from] docarc_core::error::Error),

    #[error(transparent)]
    Format(#[from] docarc_format::error::Error),
}

impl Error {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::Corrupted { .. } => vec!["Rebake the index from a freshly written archive".into()],
            Error::Core(e) => e.suggestions(),
            Error::Format(e) => e.suggestions(),
        }
    }
}
