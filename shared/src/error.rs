use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    UnprocessableEntiry(String),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    EntityAlreadyExists(String),
    #[error("{0}")]
    StateConflict(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    // std::io::Error を引数にするヴァリアントが増える可能性があるので、[from] ではなく [source] にしている
    #[error("スナップショットの読み書きに失敗しました。")]
    IoError(#[source] std::io::Error),
    #[error("{0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("{0}")]
    BcriptError(#[from] bcrypt::BcryptError),
    #[error("{0}")]
    ConvertToUuidError(#[from] uuid::Error),
    #[error("ログインに失敗しました")]
    UnauthenticatedError,
    #[error("許可されていない操作です")]
    ForbiddenOperation,
    #[error("{0}")]
    ConversionEntityError(String),
}

pub type AppResult<T> = Result<T, AppError>;
