use crate::server::ServerError;
use axum::{
    Json as AxumJson,
    extract::FromRequest,
    http::{HeaderValue, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use headers::ContentType;
use serde::Serialize;
use tracing::{debug, warn};

/// JSON body whose rejection is reported as a [`ServerError`].
#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(AxumJson), rejection(ServerError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(json) => (TypedHeader(ContentType::json()), json).into_response(),
            Err(err) => ServerError::JsonResponse(err).into_response(),
        }
    }
}

/// Result of executing a GraphQL request.
///
/// Always answered with `200 OK`; resolver errors travel in the `errors` array.
/// Cache hints collected during execution become the `Cache-Control` header,
/// unless the response carries errors.
pub struct GraphqlResponse(pub async_graphql::Response);

impl IntoResponse for GraphqlResponse {
    fn into_response(self) -> Response {
        let cache_control = if self.0.is_ok() {
            self.0.cache_control.value()
        } else {
            debug!(errors = self.0.errors.len(), "GraphQL request finished with errors");
            None
        };

        let mut response = Json(self.0).into_response();
        if let Some(cache_control) = cache_control {
            match HeaderValue::from_str(&cache_control) {
                Ok(value) => {
                    response.headers_mut().insert(CACHE_CONTROL, value);
                }
                Err(err) => warn!(error = %err, %cache_control, "Dropping invalid cache hint"),
            }
        }

        response
    }
}
