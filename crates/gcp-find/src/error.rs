use gcp_find_core::{CoordsError, DictionaryError, FinderError, ParamsError, ParamsIoError};

/// Fatal errors of a `gcp-find` run. Per-image problems never end up here.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("no input images given")]
    NoImages,

    #[error("cannot open output file {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Coords(#[from] CoordsError),

    #[error("cannot load detector parameters from {path}: {source}")]
    ParamsFile {
        path: String,
        #[source]
        source: ParamsIoError,
    },

    #[error("invalid detector parameters: {0}")]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error("cannot set up marker detector: {0}")]
    Detector(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Finder(#[from] FinderError),
}
