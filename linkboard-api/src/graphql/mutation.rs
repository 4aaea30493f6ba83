use crate::graphql::{
    RequestContext,
    error::{ApiError, Result},
    types::LinkNode,
};
use async_graphql::{Context, ErrorExtensions, Object};
use linkboard_common::model::link::CreateLink;
use tracing::info;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Creates a link posted by the authenticated user.
    async fn post(
        &self,
        ctx: &Context<'_>,
        description: String,
        url: String,
    ) -> async_graphql::Result<LinkNode> {
        let context = RequestContext::get(ctx)?;

        create_link(context, description, url)
            .await
            .map_err(|err| err.extend())
    }
}

async fn create_link(context: &RequestContext, description: String, url: String) -> Result<LinkNode> {
    let author = context.user_id().ok_or(ApiError::Unauthenticated)?;

    let link = context
        .store()
        .create_link(&CreateLink {
            description,
            url,
            author,
        })
        .await?;
    info!(link_id = %link.id, user_id = %author, "Link posted");

    Ok(LinkNode(link))
}
