//! The daemon's JSON control API.
//!
//! One endpoint per file; each file holds the wire types, the axum handler,
//! and the client-side [`ApiRequest`] implementation for the same
//! operation, so server and client cannot drift apart.

pub mod client;
mod list;
mod register;
mod terminate;
mod unmount;

use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Json;
use axum::Router;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ServerState;

pub use client::{ApiClient, ApiError};
pub use list::ListMountsRequest;
pub use register::RegisterMountRequest;
pub use terminate::{TerminateRequest, TerminateResponse};
pub use unmount::{UnmountRequest, UnmountResponse};

/// A control-API operation, able to build its own HTTP request. Implemented
/// next to each server handler.
pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder;
}

/// Wire shape of control-API failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpError {
    pub error: String,
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(HttpError {
            error: message.into(),
        }),
    )
        .into_response()
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/mounts",
            post(register::handler)
                .get(list::handler)
                .delete(unmount::handler),
        )
        .route("/terminate", post(terminate::handler))
        .with_state(state)
}
