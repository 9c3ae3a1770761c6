//! Ask the daemon to shut down. The response is written first; the accept
//! loop winds down in the background.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::server::ServerState;

use super::ApiRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminateResponse {
    pub terminating: bool,
}

pub async fn handler(State(state): State<ServerState>) -> impl IntoResponse {
    info!("termination requested");
    state.terminate();
    (StatusCode::OK, Json(TerminateResponse { terminating: true }))
}

#[derive(Debug, Clone, Default)]
pub struct TerminateRequest;

impl ApiRequest for TerminateRequest {
    type Response = TerminateResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let url = base_url.join("/terminate").unwrap();
        client.post(url)
    }
}
