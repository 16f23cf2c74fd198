use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("The requested resource was not found")]
    NotFound,
    #[error("Failed to parse value")]
    ParsingFailure,
    #[error("Unknown Database error")]
    Backend(#[from] fred::error::RedisError),
}

impl DbError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound)
    }
}

/// Handler-level failures. Each variant maps to exactly one client-visible
/// failure event; see `dispatcher::emit_error`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("The user with id {user_id} does not exist")]
    UserNotFound { user_id: String },
    #[error("The room with id {room_id} does not exist")]
    RoomNotFound { room_id: String },
    #[error("Room already exists")]
    RoomAlreadyExists { room_id: String },
    #[error("Room is full")]
    RoomFull,
    #[error("Game already started")]
    GameAlreadyStarted,
    #[error("Not enough coins")]
    InsufficientCoins { required: u64, current: u64 },
    #[error("{message}")]
    BadRequest { message: String },
    #[error("Internal Server error")]
    InternalServerError,
}

pub trait ResultExtApp<T> {
    // Returns the provided api_error if it is a not found error in database or return `InternalServerError`
    fn to_not_found(self, api_error: ApiError) -> Result<T, ApiError>;

    fn to_internal_api_error(self) -> Result<T, ApiError>;
}

impl<T> ResultExtApp<T> for Result<T, DbError> {
    fn to_not_found(self, api_error: ApiError) -> Result<T, ApiError> {
        if let Err(DbError::NotFound) = &self {
            self.map_err(|_| api_error)
        } else {
            self.map_err(|error| {
                tracing::error!(db_error=?error);
                ApiError::InternalServerError
            })
        }
    }

    fn to_internal_api_error(self) -> Result<T, ApiError> {
        self.map_err(|error| {
            tracing::error!(db_error=?error);
            ApiError::InternalServerError
        })
    }
}
