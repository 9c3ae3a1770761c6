//! HTTP client for the daemon's control API, used by CLI invocations.

use common::{MountMode, RemotePath};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use uuid::Uuid;

use super::ApiRequest;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mount server returned HTTP {0}: {1}")]
    Status(StatusCode, String),
    #[error("invalid server address: {0}")]
    Address(#[from] url::ParseError),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    addr: String,
    base: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(addr: &str) -> Result<Self, ApiError> {
        let base = Url::parse(&format!("http://{addr}/"))?;
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;
        Ok(Self {
            addr: addr.to_string(),
            base,
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let response = request.build_request(&self.base, &self.client).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T::Response>().await?)
        } else {
            Err(ApiError::Status(status, response.text().await?))
        }
    }

    /// The URL a mount consumer connects to. Each call embeds a fresh
    /// nonce so the consumer never reuses cached coordinates from an
    /// unrelated earlier mount; the nonce is not a credential.
    pub fn webdav_url(&self, mode: MountMode, remote: &RemotePath) -> String {
        let path = if remote.path.is_empty() {
            "/"
        } else {
            remote.path.as_str()
        };
        let nonce = Uuid::new_v4();
        format!(
            "http://{}/wd/{}/{}/{}/{}/{}",
            self.addr, mode, nonce, remote.repository, remote.reference, path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webdav_url_layout() {
        let client = ApiClient::new("127.0.0.1:6363").unwrap();
        let remote = RemotePath::new("repo", "main", "data/raw");
        let url = client.webdav_url(MountMode::ReadOnly, &remote);

        let suffix = url
            .strip_prefix("http://127.0.0.1:6363/wd/read-only/")
            .unwrap();
        let (nonce, rest) = suffix.split_once('/').unwrap();
        assert!(Uuid::parse_str(nonce).is_ok());
        assert_eq!(rest, "repo/main/data/raw");
    }

    #[test]
    fn webdav_url_for_ref_root() {
        let client = ApiClient::new("127.0.0.1:6363").unwrap();
        let remote = RemotePath::new("repo", "main", "");
        let url = client.webdav_url(MountMode::ReadOnly, &remote);
        assert!(url.ends_with("/repo/main//"));
    }

    #[test]
    fn webdav_url_round_trips_through_name_resolution() {
        let client = ApiClient::new("127.0.0.1:6363").unwrap();
        let remote = RemotePath::new("repo", "v1.2", "some/deep/path");
        let url = client.webdav_url(MountMode::ReadOnly, &remote);

        let name = url
            .strip_prefix("http://127.0.0.1:6363/wd/read-only/")
            .unwrap();
        assert_eq!(crate::dav::uri_for(name).unwrap(), remote);
    }

    #[test]
    fn nonce_is_fresh_per_call() {
        let client = ApiClient::new("127.0.0.1:6363").unwrap();
        let remote = RemotePath::new("repo", "main", "");
        assert_ne!(
            client.webdav_url(MountMode::ReadOnly, &remote),
            client.webdav_url(MountMode::ReadOnly, &remote)
        );
    }
}
