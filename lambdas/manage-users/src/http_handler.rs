use leadboard_shared::{auth::API_KEY_HEADER, response, AppState};
use lambda_http::{http::Method, Body, Error, Request, Response};
use std::sync::Arc;

/// Main Lambda handler - account create/update/delete for the dashboard admins
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    tracing::info!("manage-users invoked - Method: {}", method);

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        return response::preflight();
    }

    let api_key = event
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    // Secret check runs before anything else looks at the request
    if *method != Method::POST {
        if let Err(e) = state.provisioner.authorize(api_key) {
            return response::from_result(&e.into());
        }
        return response::method_not_allowed();
    }

    let body: &[u8] = match event.body() {
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes,
        Body::Empty => &[],
    };

    let result = state.provisioner.handle(body, api_key).await;
    response::from_result(&result)
}
