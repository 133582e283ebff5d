#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("container backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bollard::errors::Error> for SourceError {
    fn from(err: bollard::errors::Error) -> Self {
        SourceError::Backend(err.to_string())
    }
}
