// crates/kryon-core/src/error.rs

#[derive(Debug, thiserror::Error)]
pub enum KryonError {
    #[error("malformed KRB container: {0}")]
    MalformedContainer(String),

    #[error("unsupported KRB major version: {0}")]
    UnsupportedVersion(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing section: {0}")]
    MissingSection(String),

    #[error("invalid element type: 0x{0:04X}")]
    InvalidElementType(u16),

    #[error("component not found: {0}")]
    ComponentNotFound(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

pub type Result<T> = std::result::Result<T, KryonError>;
