use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown string id {0}")]
    UnknownId(u64),

    #[error("allocation failed while growing dictionary: {0}")]
    Alloc(String),

    #[error(transparent)]
    Core(#[from] docarc_core::error::Error),
}

impl Error {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::UnknownId(_) => vec![
                "Only pass ids previously returned by insert()/locate_safe()".into(),
            ],
            _ => vec![],
        }
    }
}
