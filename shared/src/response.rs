use lambda_http::{http::StatusCode, Body, Error, Response};
use serde_json::Value;

use crate::users::OperationResult;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type, x-api-key";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";

/// Empty 200 answering a CORS preflight.
pub fn preflight() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", ALLOW_ORIGIN)
        .header("Access-Control-Allow-Headers", ALLOW_HEADERS)
        .header("Access-Control-Allow-Methods", ALLOW_METHODS)
        .body(Body::Empty)
        .map_err(Box::new)?)
}

/// JSON response carrying the CORS headers.
pub fn json(status: StatusCode, body: &Value) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", ALLOW_ORIGIN)
        .header("Access-Control-Allow-Headers", ALLOW_HEADERS)
        .header("Access-Control-Allow-Methods", ALLOW_METHODS)
        .body(body.to_string().into())
        .map_err(Box::new)?)
}

pub fn from_result(result: &OperationResult) -> Result<Response<Body>, Error> {
    json(result.status, &result.body)
}

pub fn method_not_allowed() -> Result<Response<Body>, Error> {
    json(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({"error": "Method not allowed"}),
    )
}
