use linkboard_common::model::{
    ModelValidationError,
    auth::Authentication,
    link::Link,
    user::{User, UserHandle},
};
use sqlx::FromRow;
use time::{Duration, PrimitiveDateTime};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i32,
    pub handle: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct LinkRecord {
    pub link_id: i32,
    pub description: String,
    pub url: String,
    pub created_at: PrimitiveDateTime,
    pub user_id: Option<i32>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_id: i32,
    pub token_hash: Vec<u8>,
    pub created_at: PrimitiveDateTime,
    pub expires_after_seconds: Option<i64>,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.into(),
            handle: UserHandle::new(value.handle)?,
        })
    }
}

impl From<LinkRecord> for Link {
    fn from(value: LinkRecord) -> Self {
        Self {
            id: value.link_id.into(),
            description: value.description,
            url: value.url,
            created_at: value.created_at.as_utc(),
            author_id: value.user_id.map(Into::into),
        }
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.into(),
            token_hash: value.token_hash.try_into()?,
            created_at: value.created_at.as_utc(),
            expires_after: value
                .expires_after_seconds
                .map(|seconds| Duration::seconds(seconds).try_into())
                .transpose()?,
        })
    }
}
