use crate::server::ServerRouter;

mod graphql;

pub fn routes() -> ServerRouter {
    ServerRouter::new().merge(graphql::routes())
}
