use crate::graphql::{
    RequestContext,
    error::{ApiError, Result},
    types::{Feed, LinkNode, LinkOrderByInput},
};
use async_graphql::{Context, ErrorExtensions, ID, Object};
use linkboard_common::model::feed::{FeedArgs, LinkOrder};
use tracing::debug;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Links matching `filter` in their description or url, sorted by `orderBy` and paginated.
    #[graphql(cache_control(max_age = 5))]
    async fn feed(
        &self,
        ctx: &Context<'_>,
        filter: Option<String>,
        skip: Option<i32>,
        take: Option<i32>,
        order_by: Option<Vec<LinkOrderByInput>>,
    ) -> async_graphql::Result<Feed> {
        let context = RequestContext::get(ctx)?;

        resolve_feed(context, filter, skip, take, order_by)
            .await
            .map_err(|err| err.extend())
    }
}

async fn resolve_feed(
    context: &RequestContext,
    filter: Option<String>,
    skip: Option<i32>,
    take: Option<i32>,
    order_by: Option<Vec<LinkOrderByInput>>,
) -> Result<Feed> {
    let order_by = order_by
        .map(|orders| {
            orders
                .into_iter()
                .map(LinkOrder::try_from)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;
    let args = FeedArgs {
        filter,
        skip,
        take,
        order_by,
    };

    let id = args.cache_id()?;
    let query = args.to_query()?;
    debug!(%id, user = ?context.user_id(), "Resolving feed");

    let links = context.store().fetch_links(&query).await?;
    let count = context.store().count_links(query.filter.as_ref()).await?;

    Ok(Feed {
        links: links.into_iter().map(LinkNode).collect(),
        count: i32::try_from(count).map_err(|_| ApiError::CountOutOfRange(count))?,
        id: Some(ID(id)),
    })
}
