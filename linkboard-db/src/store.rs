use async_trait::async_trait;
use linkboard_common::model::{
    Id, ModelValidationError,
    auth::{AuthTokenHash, Authentication},
    feed::{LinkFilter, LinkQuery},
    link::{CreateLink, Link, LinkMarker},
    user::{User, UserMarker},
};
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("User with id {0} does not exist")]
    UnknownUser(Id<UserMarker>),
    #[error("Link with id {0} does not exist")]
    UnknownLink(Id<LinkMarker>),
    #[error("No ids left for new rows")]
    IdsExhausted,
    #[error("The database reported a negative count: {0}")]
    CountOutOfRange(i64),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Data access used by the API.
///
/// Every method is a single read or a single write, so implementations never
/// need to coordinate across calls.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Links matching the query's filter, ordered and paginated.
    async fn fetch_links(&self, query: &LinkQuery) -> Result<Vec<Link>>;

    /// Number of links matching `filter`, or of all links.
    async fn count_links(&self, filter: Option<&LinkFilter>) -> Result<u64>;

    async fn fetch_link_author(&self, link_id: Id<LinkMarker>) -> Result<Option<User>>;

    /// Voters of a link ordered by user id. Empty for unknown links.
    async fn fetch_link_voters(&self, link_id: Id<LinkMarker>) -> Result<Vec<User>>;

    async fn create_link(&self, link: &CreateLink) -> Result<Link>;

    async fn fetch_authentication(
        &self,
        token_hash: &AuthTokenHash,
    ) -> Result<Option<Authentication>>;
}
