//! GraphQL schema of the link board.
//!
//! The schema itself holds no data. Everything a resolver needs comes from the
//! [`RequestContext`] attached to each request by the transport layer.

mod error;
mod mutation;
mod query;
mod types;

use async_graphql::{Context, EmptySubscription, Schema};
use linkboard_common::model::{Id, user::UserMarker};
use linkboard_db::LinkStore;
use mutation::MutationRoot;
use query::QueryRoot;
use std::sync::Arc;

pub type LinkboardSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[must_use]
pub fn build_schema() -> LinkboardSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .limit_depth(8)
        .finish()
}

/// Identity and data access of a single request.
#[derive(Clone)]
pub struct RequestContext {
    user_id: Option<Id<UserMarker>>,
    store: Arc<dyn LinkStore>,
}

impl RequestContext {
    #[must_use]
    pub fn new(user_id: Option<Id<UserMarker>>, store: Arc<dyn LinkStore>) -> Self {
        Self { user_id, store }
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<Id<UserMarker>> {
        self.user_id
    }

    #[must_use]
    pub fn store(&self) -> &dyn LinkStore {
        &*self.store
    }

    fn get<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Self> {
        ctx.data::<Self>()
    }
}
