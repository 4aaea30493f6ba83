use crate::graphql::LinkboardSchema;
use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use json::Json;
use linkboard_common::model::auth::{AuthTokenDecodeError, AuthTokenHashError};
use linkboard_db::{DbError, LinkStore};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

mod auth;
mod json;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub schema: LinkboardSchema,
    pub store: Arc<dyn LinkStore>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided auth token could not be decoded: {0}")]
    InvalidAuthToken(#[from] AuthTokenDecodeError),
    #[error("The auth token could not be hashed: {0}")]
    AuthTokenHash(#[from] AuthTokenHashError),
    #[error("Provided token was invalid")]
    InvalidToken,
    #[error(transparent)]
    Database(#[from] DbError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) | ServerError::PathRejection(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidToken => StatusCode::UNAUTHORIZED,
            ServerError::JsonRejection(_)
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidAuthToken(_) => StatusCode::BAD_REQUEST,
            ServerError::JsonResponse(_)
            | ServerError::Database(_)
            | ServerError::AuthTokenHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
struct ErrorResponse {
    status: u16,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
        };
        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        graphql::build_schema,
        server::{ServerState, routes},
    };
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{
            Request, StatusCode,
            header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE},
        },
    };
    use linkboard_common::model::{
        auth::{AuthToken, Authentication, TokenLifetime},
        user::{User, UserHandle},
    };
    use linkboard_db::memory::MemoryStore;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use time::{Duration, UtcDateTime};
    use tower::ServiceExt;

    const POST_MUTATION: &str =
        r#"mutation { post(description: "hello", url: "http://example.com") { postedBy { id } } }"#;

    async fn app() -> (Router, Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .insert_user(UserHandle::new("alice".to_owned()).unwrap())
            .await
            .unwrap();
        let app = routes().with_state(ServerState {
            schema: build_schema(),
            store: store.clone(),
        });

        (app, store, user)
    }

    async fn issue_token(
        store: &MemoryStore,
        user: &User,
        created_at: UtcDateTime,
        lifetime: Option<TokenLifetime>,
    ) -> String {
        let token = AuthToken::generate_random(user.id);
        store
            .insert_authentication(Authentication {
                user: user.id,
                token_hash: token.hash().unwrap(),
                created_at,
                expires_after: lifetime,
            })
            .await;
        token.as_token_str()
    }

    fn graphql_request(query: &str, authorization: Option<&str>) -> Request<Body> {
        let mut request = Request::post("/graphql").header(CONTENT_TYPE, "application/json");
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        request
            .body(Body::from(json!({ "query": query }).to_string()))
            .unwrap()
    }

    async fn send(app: Router, query: &str, authorization: Option<&str>) -> (StatusCode, Value) {
        let response = app
            .oneshot(graphql_request(query, authorization))
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn anonymous_request() {
        let (app, _, _) = app().await;

        let (status, body) = send(app.clone(), "{ feed { count } }", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["feed"]["count"], 0);

        let (status, body) = send(app, POST_MUTATION, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn authenticated_post() {
        let (app, store, user) = app().await;
        let token = issue_token(&store, &user, UtcDateTime::now(), None).await;

        let (status, body) = send(app, POST_MUTATION, Some(&format!("Bearer {token}"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["post"]["postedBy"]["id"], user.id.get());
    }

    #[tokio::test]
    async fn rejected_tokens() {
        let (app, store, user) = app().await;

        let unknown = AuthToken::generate_random(user.id).as_token_str();
        let (status, body) = send(app.clone(), POST_MUTATION, Some(&format!("Bearer {unknown}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "status": 401 }));

        let expired = issue_token(
            &store,
            &user,
            UtcDateTime::now() - Duration::days(2),
            TokenLifetime::new(Duration::days(1)),
        )
        .await;
        let (status, _) = send(app.clone(), POST_MUTATION, Some(&format!("Bearer {expired}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(app.clone(), POST_MUTATION, Some("Bearer garbage")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(app, POST_MUTATION, Some("Basic YWxpY2U6c2VjcmV0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(
            linkboard_db::LinkStore::count_links(&*store, None).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn token_of_another_user() {
        let (app, store, alice) = app().await;
        let bob = store
            .insert_user(UserHandle::new("bob".to_owned()).unwrap())
            .await
            .unwrap();
        let token = AuthToken::generate_random(bob.id);
        store
            .insert_authentication(Authentication {
                user: alice.id,
                token_hash: token.hash().unwrap(),
                created_at: UtcDateTime::now(),
                expires_after: None,
            })
            .await;

        let (status, _) = send(
            app,
            POST_MUTATION,
            Some(&format!("Bearer {}", token.as_token_str())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn incomplete_authorization_header() {
        let (app, _, _) = app().await;

        let (status, body) = send(app.clone(), "{ feed { count } }", Some("Bearer")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "status": 400 }));

        let (status, _) = send(app, "{ feed { count } }", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn feed_responses_are_cacheable() {
        let (app, store, user) = app().await;
        let token = issue_token(&store, &user, UtcDateTime::now(), None).await;
        let execute = |query: &str, authorization: Option<&str>| {
            app.clone().oneshot(graphql_request(query, authorization))
        };

        let response = execute("{ feed { count links { id } } }", None)
            .await
            .unwrap();
        assert_eq!(response.headers()[CACHE_CONTROL], "max-age=5");

        let response = execute("{ feed(skip: -1) { count } }", None)
            .await
            .unwrap();
        assert!(!response.headers().contains_key(CACHE_CONTROL));

        let response = execute(POST_MUTATION, Some(&format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(CACHE_CONTROL));
    }

    #[tokio::test]
    async fn graphiql_page() {
        let (app, _, _) = app().await;

        let request = Request::get("/graphql").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/graphql"));
    }

    #[tokio::test]
    async fn malformed_body_and_unknown_route() {
        let (app, _, _) = app().await;

        let request = Request::post("/graphql")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = Request::get("/nowhere").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            serde_json::from_slice::<Value>(&bytes).unwrap(),
            json!({ "status": 404 })
        );
    }
}
