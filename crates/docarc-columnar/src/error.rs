use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] docarc_core::error::Error),

    #[error(transparent)]
    Dict(#[from] docarc_dict::Error),
}

impl Error {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::Core(e) => e.suggestions(),
            Error::Dict(e) => e.suggestions(),
        }
    }
}
