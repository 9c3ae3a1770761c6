//! Remove a mount from the registry. Succeeds even when the path was never
//! registered, so unmount retries are idempotent.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::server::ServerState;

use super::ApiRequest;

#[derive(Debug, Clone, Deserialize)]
pub struct UnmountQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmountResponse {
    pub removed: bool,
}

pub async fn handler(
    State(state): State<ServerState>,
    Query(query): Query<UnmountQuery>,
) -> impl IntoResponse {
    let removed = state.registry().unregister(&query.path);
    if removed {
        info!(local_path = %query.path, "unregistered mount");
    }
    (StatusCode::OK, Json(UnmountResponse { removed }))
}

#[derive(Debug, Clone)]
pub struct UnmountRequest {
    pub path: String,
}

impl ApiRequest for UnmountRequest {
    type Response = UnmountResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let url = base_url.join("/mounts").unwrap();
        client.delete(url).query(&[("path", self.path)])
    }
}
