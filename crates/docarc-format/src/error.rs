use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("NOARCHIVEFILE: not a docarc archive (bad magic bytes)")]
    NoArchiveFile,

    #[error("FORMATVERERR: archive was written with format version {found}, this build reads version {expected}")]
    FormatVersion { found: u32, expected: u32 },

    #[error("CORRUPTED: {detail}")]
    Corrupted { detail: String },

    #[error("unknown codec flag bit {0:#x}")]
    UnknownCodec(u32),

    #[error(transparent)]
    Core(#[from] docarc_core::error::Error),

    #[error(transparent)]
    Dict(#[from] docarc_dict::Error),

    #[error(transparent)]
    Columnar(#[from] docarc_columnar::error::Error),
}

impl Error {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::NoArchiveFile => vec!["Check that the input file was produced by `docarc build`".into()],
            Error::FormatVersion { .. } => {
                vec!["Rebuild the archive with this version of docarc, or use a matching reader".into()]
            }
            Error::Corrupted { .. } => vec!["The archive may be truncated or written by an incompatible build".into()],
            Error::UnknownCodec(_) => vec!["Register the codec used to write this archive before reading it".into()],
            Error::Core(e) => e.suggestions(),
            Error::Dict(e) => e.suggestions(),
            Error::Columnar(e) => e.suggestions(),
        }
    }
}
