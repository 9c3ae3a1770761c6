//! List active mounts, ascending by local path.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};

use crate::server::{MountInfo, ServerState};

use super::ApiRequest;

pub async fn handler(State(state): State<ServerState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.registry().list()))
}

#[derive(Debug, Clone, Default)]
pub struct ListMountsRequest;

impl ApiRequest for ListMountsRequest {
    type Response = Vec<MountInfo>;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let url = base_url.join("/mounts").unwrap();
        client.get(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testutil::test_state;
    use crate::server::MountInfo;
    use common::{MountMode, RemotePath};

    #[tokio::test]
    async fn lists_in_path_order() {
        let (state, _rx) = test_state();
        for local in ["/mnt/c", "/mnt/a", "/mnt/b"] {
            state.registry().register(MountInfo {
                remote: RemotePath::new("repo", "main", ""),
                local_path: local.to_string(),
                mode: MountMode::ReadOnly,
            });
        }

        let response = handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let mounts: Vec<MountInfo> = serde_json::from_slice(&body).unwrap();
        let paths: Vec<&str> = mounts.iter().map(|m| m.local_path.as_str()).collect();
        assert_eq!(paths, vec!["/mnt/a", "/mnt/b", "/mnt/c"]);
    }
}
