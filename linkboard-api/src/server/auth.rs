use crate::server::ServerError;
use axum::{
    extract::{FromRef, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use linkboard_common::model::{Id, auth::AuthToken, user::UserMarker};
use linkboard_db::LinkStore;
use std::sync::Arc;
use time::UtcDateTime;
use tracing::debug;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// Caller identified by a valid bearer token.
///
/// Extracted as `Option<AuthenticatedUser>`: a request without an
/// `Authorization` header is anonymous, one with a bad token is rejected.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct AuthenticatedUser {
    id: Id<UserMarker>,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(self) -> Id<UserMarker> {
        self.id
    }
}

impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    Arc<dyn LinkStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Some(header) =
            <AuthorizationHeader as OptionalFromRequestParts<S>>::from_request_parts(parts, state)
                .await
                .map_err(ServerError::InvalidAuthorizationHeader)?
        else {
            return Ok(None);
        };

        let request_token: AuthToken = header.token().parse()?;
        let token_hash = request_token.hash()?;

        let authentication = Arc::<dyn LinkStore>::from_ref(state)
            .fetch_authentication(&token_hash)
            .await?
            .ok_or(ServerError::InvalidToken)?;

        if authentication.user != request_token.user_id
            || authentication.is_expired_at(UtcDateTime::now())
        {
            return Err(ServerError::InvalidToken);
        }

        debug!(user_id = %authentication.user, "Authenticated request");
        Ok(Some(Self {
            id: authentication.user,
        }))
    }
}
