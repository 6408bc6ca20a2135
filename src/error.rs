use crate::CacheConfigBuilderError;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("invalid cache configuration: {0}")]
    Config(#[from] CacheConfigBuilderError),
    #[error("cached bytes are not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),
}
