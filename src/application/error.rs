use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("{0}")]
    Validation(String),
    #[error("Data Not Found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl TodoError {
    pub fn validation(message: impl Into<String>) -> Self { Self::Validation(message.into()) }
}

pub type TodoResult<T> = Result<T, TodoError>;
