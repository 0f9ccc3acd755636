use thiserror::Error;

pub type RevealResult<T> = Result<T, RevealError>;

#[derive(Debug, Error)]
pub enum RevealError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid trigger `{0}`")]
    InvalidTrigger(String),

    #[error("invalid root margin `{0}`")]
    InvalidRootMargin(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("record source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("host error: {0}")]
    Host(String),
}
