//! Google Cloud Storage backend
//!
//! Talks to the GCS JSON API directly. The two conditional primitives map
//! onto generation preconditions:
//!
//! - create-if-absent: media upload with `ifGenerationMatch=0`
//! - delete-if-version: `DELETE` with `ifGenerationMatch=<generation>`
//!
//! GCS answers `412 Precondition Failed` when either condition does not hold
//! and `404 Not Found` when the object is absent.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header::CONTENT_TYPE, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{CreateResult, DeleteResult, StorageBackend};
use crate::{Config, Error, LockName, ObjectMeta, Result, StoredObject, VersionStamp};

/// Response header carrying the generation of a media download
const GENERATION_HEADER: &str = "x-goog-generation";

/// Outcome of [`GcsBackend::ensure_bucket`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    /// The bucket was already there
    Existing,
    /// The bucket was missing and has been created
    Created,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    generation: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    time_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct BucketResource<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

/// Bucket in Google Cloud Storage, or in anything speaking its JSON API
#[derive(Debug, Clone)]
pub struct GcsBackend {
    http: reqwest::Client,
    endpoint: Url,
    bucket: String,
    access_token: Option<String>,
}

impl GcsBackend {
    /// Build a backend for the configured bucket and endpoint
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the endpoint is not a base URL or the
    /// HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = Url::parse(&config.storage.endpoint).map_err(|e| {
            Error::invalid_config(format!(
                "Invalid storage endpoint '{}': {e}",
                config.storage.endpoint
            ))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::invalid_config(format!(
                "Storage endpoint '{endpoint}' cannot be used as a base URL"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.storage.request_timeout_secs))
            .user_agent(concat!("cloudlock/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::invalid_config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            bucket: config.bucket.clone(),
            access_token: config.storage.access_token.clone(),
        })
    }

    /// Make sure the bucket exists, creating it in `project_id` if it does not.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the bucket is missing and no project id is
    /// available to create it in, and `Backend` for any API failure.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn ensure_bucket(
        &self,
        project_id: Option<&str>,
        region: Option<&str>,
    ) -> Result<BucketStatus> {
        const LOOKUP: &str = "look up bucket";
        const CREATE: &str = "create bucket";

        let url = self.url(&["storage", "v1", "b", &self.bucket])?;
        let response = self.send(LOOKUP, self.http.get(url)).await?;
        match response.status() {
            status if status.is_success() => return Ok(BucketStatus::Existing),
            StatusCode::NOT_FOUND => {}
            _ => return Err(unexpected_status(LOOKUP, response).await),
        }

        let project_id = project_id.ok_or_else(|| {
            Error::invalid_config(format!(
                "Bucket '{}' does not exist and no project id is configured to create it.\n\
                 Set GCP_PROJECT_ID or create the bucket yourself.",
                self.bucket
            ))
        })?;

        info!(project = project_id, "Bucket not found - creating bucket");
        let url = self.url(&["storage", "v1", "b"])?;
        let body = BucketResource {
            name: &self.bucket,
            location: region,
        };
        let request = self
            .http
            .post(url)
            .query(&[("project", project_id)])
            .json(&body);
        let response = self.send(CREATE, request).await?;
        match response.status() {
            status if status.is_success() => Ok(BucketStatus::Created),
            // Someone else created it between our lookup and insert
            StatusCode::CONFLICT => Ok(BucketStatus::Existing),
            _ => Err(unexpected_status(CREATE, response).await),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                Error::invalid_config(format!(
                    "Storage endpoint '{}' cannot be used as a base URL",
                    self.endpoint
                ))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn object_url(&self, name: &LockName) -> Result<Url> {
        self.url(&["storage", "v1", "b", &self.bucket, "o", name.as_str()])
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request
            .send()
            .await
            .map_err(|e| Error::backend(operation, e.to_string()))
    }
}

async fn unexpected_status(operation: &str, response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::backend(
        operation,
        format!("unexpected status {status}: {}", body.trim()),
    )
}

#[async_trait]
impl StorageBackend for GcsBackend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self, payload), fields(bucket = %self.bucket, lock = %name))]
    async fn create_if_absent(&self, name: &LockName, payload: &[u8]) -> Result<CreateResult> {
        const OP: &str = "create lock object";

        let url = self.url(&["upload", "storage", "v1", "b", &self.bucket, "o"])?;
        let request = self
            .http
            .post(url)
            .query(&[
                ("uploadType", "media"),
                ("name", name.as_str()),
                ("ifGenerationMatch", "0"),
            ])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload.to_vec());

        let response = self.send(OP, request).await?;
        match response.status() {
            status if status.is_success() => {
                let resource: ObjectResource = response
                    .json()
                    .await
                    .map_err(|e| Error::backend(OP, format!("invalid object resource: {e}")))?;
                debug!(generation = %resource.generation, "Created lock object");
                Ok(CreateResult::Created {
                    version: VersionStamp::new(resource.generation),
                })
            }
            StatusCode::PRECONDITION_FAILED => Ok(CreateResult::AlreadyExists),
            _ => Err(unexpected_status(OP, response).await),
        }
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, lock = %name))]
    async fn read(&self, name: &LockName) -> Result<Option<StoredObject>> {
        const OP: &str = "read lock object";

        let url = self.object_url(name)?;
        let response = self
            .send(OP, self.http.get(url).query(&[("alt", "media")]))
            .await?;
        match response.status() {
            status if status.is_success() => {
                let version = response
                    .headers()
                    .get(GENERATION_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .map(VersionStamp::new)
                    .ok_or_else(|| {
                        Error::backend(OP, format!("response is missing the {GENERATION_HEADER} header"))
                    })?;
                let payload = response
                    .bytes()
                    .await
                    .map_err(|e| Error::backend(OP, e.to_string()))?
                    .to_vec();
                Ok(Some(StoredObject { payload, version }))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(unexpected_status(OP, response).await),
        }
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, lock = %name))]
    async fn stat(&self, name: &LockName) -> Result<Option<ObjectMeta>> {
        const OP: &str = "look up lock object";

        let url = self.object_url(name)?;
        let response = self.send(OP, self.http.get(url)).await?;
        match response.status() {
            status if status.is_success() => {
                let resource: ObjectResource = response
                    .json()
                    .await
                    .map_err(|e| Error::backend(OP, format!("invalid object resource: {e}")))?;
                let size = resource
                    .size
                    .as_deref()
                    .map(str::parse::<u64>)
                    .transpose()
                    .map_err(|e| Error::backend(OP, format!("invalid object size: {e}")))?
                    .unwrap_or_default();
                Ok(Some(ObjectMeta {
                    name: name.clone(),
                    version: VersionStamp::new(resource.generation),
                    size,
                    created_at: resource.time_created,
                }))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(unexpected_status(OP, response).await),
        }
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, lock = %name, version = %version))]
    async fn delete_if_version(
        &self,
        name: &LockName,
        version: &VersionStamp,
    ) -> Result<DeleteResult> {
        const OP: &str = "delete lock object";

        let url = self.object_url(name)?;
        let request = self
            .http
            .delete(url)
            .query(&[("ifGenerationMatch", version.as_str())]);
        let response = self.send(OP, request).await?;
        match response.status() {
            status if status.is_success() => Ok(DeleteResult::Deleted),
            StatusCode::NOT_FOUND => Ok(DeleteResult::NotFound),
            StatusCode::PRECONDITION_FAILED => Ok(DeleteResult::VersionMismatch),
            _ => Err(unexpected_status(OP, response).await),
        }
    }
}
