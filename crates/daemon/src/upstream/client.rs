//! `reqwest`-backed implementation of [`ObjectStore`] against the lakeFS
//! REST API (`/api/v1/repositories/{repo}/refs/{ref}/objects...`).

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode, Url};

use crate::config::Config;

use super::{ByteStream, ListParams, ObjectStats, ObjectStatsList, ObjectStore, UpstreamError};

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    base: Url,
    client: Client,
    access_key_id: String,
    secret_access_key: String,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let mut base = config.endpoint.clone();
        // The configured endpoint excludes the API root, matching lakectl.
        if !base.path().trim_end_matches('/').ends_with("/api/v1") {
            let joined = format!("{}/api/v1/", base.path().trim_end_matches('/'));
            base.set_path(&joined);
        } else if !base.path().ends_with('/') {
            let joined = format!("{}/", base.path());
            base.set_path(&joined);
        }
        let client = Client::builder().build()?;
        Ok(Self {
            base,
            client,
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
        })
    }

    fn objects_url(&self, repository: &str, reference: &str, suffix: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(["repositories", repository, "refs", reference]);
            segments.extend(suffix.split('/'));
        }
        url
    }

    fn request(&self, url: Url) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.access_key_id, Some(&self.secret_access_key))
    }
}

fn status_error(status: StatusCode) -> UpstreamError {
    if status == StatusCode::NOT_FOUND {
        UpstreamError::NotFound
    } else {
        UpstreamError::Http(status)
    }
}

#[async_trait]
impl ObjectStore for UpstreamClient {
    async fn stat_object(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
    ) -> Result<ObjectStats, UpstreamError> {
        let url = self.objects_url(repository, reference, "objects/stat");
        let response = self.request(url).query(&[("path", path)]).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(status_error(status));
        }
        Ok(response.json().await?)
    }

    async fn list_objects(
        &self,
        repository: &str,
        reference: &str,
        params: &ListParams,
    ) -> Result<ObjectStatsList, UpstreamError> {
        let url = self.objects_url(repository, reference, "objects/ls");
        let response = self
            .request(url)
            .query(&[
                ("prefix", params.prefix.as_str()),
                ("delimiter", params.delimiter.as_str()),
                ("after", params.after.as_str()),
            ])
            .query(&[("amount", params.amount)])
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(status_error(status));
        }
        Ok(response.json().await?)
    }

    async fn get_object(
        &self,
        repository: &str,
        reference: &str,
        path: &str,
        presign: bool,
    ) -> Result<ByteStream, UpstreamError> {
        let url = self.objects_url(repository, reference, "objects");
        let response = self
            .request(url)
            .query(&[("path", path)])
            .query(&[("presign", presign)])
            .send()
            .await?;
        let status = response.status();
        // Presigned fetches arrive here after redirects; anything still not
        // a success is an upstream failure.
        if status.as_u16() > 299 {
            return Err(status_error(status));
        }
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::pin(stream))
    }
}
