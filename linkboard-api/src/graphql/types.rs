use crate::graphql::{RequestContext, error::ApiError};
use async_graphql::{
    Context, Enum, ErrorExtensions, ID, InputObject, InputValueError, InputValueResult, Object,
    Scalar, ScalarType, SimpleObject, Value,
};
use linkboard_common::model::{
    feed::{FeedArgsError, LinkOrder, SortDirection},
    link::Link,
    user::User,
};
use time::{OffsetDateTime, UtcDateTime, format_description::well_known::Rfc3339};

/// RFC 3339 timestamp, always in UTC.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DateTime(pub UtcDateTime);

#[Scalar]
impl ScalarType for DateTime {
    fn parse(value: Value) -> InputValueResult<Self> {
        let Value::String(text) = &value else {
            return Err(InputValueError::expected_type(value));
        };
        let parsed = OffsetDateTime::parse(text, &Rfc3339)
            .map_err(|err| InputValueError::custom(format!("Invalid DateTime: {err}")))?;

        Ok(Self(parsed.into()))
    }

    fn to_value(&self) -> Value {
        OffsetDateTime::from(self.0)
            .format(&Rfc3339)
            .map_or(Value::Null, Value::String)
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum Sort {
    #[graphql(name = "asc")]
    Asc,
    #[graphql(name = "desc")]
    Desc,
}

impl From<Sort> for SortDirection {
    fn from(value: Sort) -> Self {
        match value {
            Sort::Asc => SortDirection::Asc,
            Sort::Desc => SortDirection::Desc,
        }
    }
}

/// Sort directive. Exactly one field has to be set.
#[derive(InputObject, Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct LinkOrderByInput {
    pub description: Option<Sort>,
    pub url: Option<Sort>,
    pub created_at: Option<Sort>,
}

impl TryFrom<LinkOrderByInput> for LinkOrder {
    type Error = FeedArgsError;

    fn try_from(value: LinkOrderByInput) -> Result<Self, Self::Error> {
        LinkOrder::from_fields(
            value.description.map(Into::into),
            value.url.map(Into::into),
            value.created_at.map(Into::into),
        )
    }
}

pub struct UserNode(pub User);

#[Object(name = "User")]
impl UserNode {
    async fn id(&self) -> i32 {
        self.0.id.get()
    }

    async fn handle(&self) -> &str {
        self.0.handle.get()
    }
}

pub struct LinkNode(pub Link);

#[Object(name = "Link")]
impl LinkNode {
    async fn id(&self) -> i32 {
        self.0.id.get()
    }

    async fn description(&self) -> &str {
        &self.0.description
    }

    async fn url(&self) -> &str {
        &self.0.url
    }

    async fn created_at(&self) -> DateTime {
        DateTime(self.0.created_at)
    }

    /// Author of the link, null if it is unknown or was deleted.
    async fn posted_by(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<UserNode>> {
        let author = RequestContext::get(ctx)?
            .store()
            .fetch_link_author(self.0.id)
            .await
            .map_err(|err| ApiError::from(err).extend())?;

        Ok(author.map(UserNode))
    }

    async fn voters(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<UserNode>> {
        let voters = RequestContext::get(ctx)?
            .store()
            .fetch_link_voters(self.0.id)
            .await
            .map_err(|err| ApiError::from(err).extend())?;

        Ok(voters.into_iter().map(UserNode).collect())
    }
}

#[derive(SimpleObject)]
pub struct Feed {
    pub links: Vec<LinkNode>,
    /// Number of links matching the filter, regardless of `skip` and `take`.
    pub count: i32,
    pub id: Option<ID>,
}
