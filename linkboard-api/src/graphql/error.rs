use async_graphql::ErrorExtensions;
use linkboard_common::model::feed::FeedArgsError;
use linkboard_db::DbError;
use thiserror::Error;
use tracing::error;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Cannot post without logging in.")]
    Unauthenticated,
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] FeedArgsError),
    #[error("Feed id could not be serialized: {0}")]
    FeedId(#[from] serde_json::Error),
    #[error("Link count {0} does not fit into an Int")]
    CountOutOfRange(u64),
    #[error(transparent)]
    Database(#[from] DbError),
}

impl ApiError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::InvalidArguments(_) => "BAD_USER_INPUT",
            ApiError::FeedId(_) | ApiError::CountOutOfRange(_) | ApiError::Database(_) => {
                "INTERNAL_SERVER_ERROR"
            }
        }
    }

    fn is_internal(&self) -> bool {
        self.code() == "INTERNAL_SERVER_ERROR"
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let message = if self.is_internal() {
            error!(error = %self, "Resolver failed");
            "Internal data store error".to_owned()
        } else {
            self.to_string()
        };

        async_graphql::Error::new(message).extend_with(|_, extensions| {
            extensions.set("code", self.code());
        })
    }
}
