//! Register (or overwrite) an active mount.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use tracing::info;

use crate::server::{MountInfo, ServerState};

use super::{error_response, ApiRequest};

pub async fn handler(
    State(state): State<ServerState>,
    body: Result<Json<MountInfo>, JsonRejection>,
) -> Result<impl IntoResponse, RegisterError> {
    let Json(mount) = body.map_err(|err| RegisterError::InvalidBody(err.to_string()))?;
    info!(local_path = %mount.local_path, remote = %mount.remote, "registering mount");
    state.registry().register(mount.clone());
    Ok((StatusCode::CREATED, Json(mount)))
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("invalid mount body: {0}")]
    InvalidBody(String),
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        match self {
            RegisterError::InvalidBody(_) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
        }
    }
}

/// Client side of the same operation.
#[derive(Debug, Clone)]
pub struct RegisterMountRequest {
    pub mount: MountInfo,
}

impl ApiRequest for RegisterMountRequest {
    type Response = MountInfo;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let url = base_url.join("/mounts").unwrap();
        client.post(url).json(&self.mount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testutil::test_state;
    use common::{MountMode, RemotePath};

    fn mount(local: &str) -> MountInfo {
        MountInfo {
            remote: RemotePath::new("repo", "main", "data"),
            local_path: local.to_string(),
            mode: MountMode::ReadOnly,
        }
    }

    #[tokio::test]
    async fn registers_and_echoes_the_mount() {
        let (state, _rx) = test_state();
        let response = handler(State(state.clone()), Ok(Json(mount("/mnt/a"))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(state.registry().list().len(), 1);
    }

    #[tokio::test]
    async fn overwrites_existing_path() {
        let (state, _rx) = test_state();
        for _ in 0..2 {
            let response = handler(State(state.clone()), Ok(Json(mount("/mnt/a"))))
                .await
                .into_response();
            assert_eq!(response.status(), StatusCode::CREATED);
        }
        assert_eq!(state.registry().list().len(), 1);
    }
}
