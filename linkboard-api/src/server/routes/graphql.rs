use crate::{
    graphql::{LinkboardSchema, RequestContext},
    server::{
        ServerError, ServerRouter,
        auth::AuthenticatedUser,
        json::{GraphqlResponse, Json},
    },
};
use async_graphql::http::GraphiQLSource;
use axum::{extract::State, response::Html};
use axum_extra::routing::{RouterExt, TypedPath};
use linkboard_db::LinkStore;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(graphiql)
        .typed_post(execute)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/graphql", rejection(ServerError))]
struct GraphqlPath();

async fn graphiql(GraphqlPath(): GraphqlPath) -> Html<String> {
    Html(GraphiQLSource::build().endpoint(GraphqlPath::PATH).finish())
}

async fn execute(
    GraphqlPath(): GraphqlPath,
    State(schema): State<LinkboardSchema>,
    State(store): State<Arc<dyn LinkStore>>,
    user: Option<AuthenticatedUser>,
    Json(request): Json<async_graphql::Request>,
) -> GraphqlResponse {
    let context = RequestContext::new(user.map(AuthenticatedUser::user_id), store);

    GraphqlResponse(schema.execute(request.data(context)).await)
}
