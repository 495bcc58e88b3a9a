//! HTTP remote store
//!
//! Talks to the Markdown web service REST API with Basic authentication and
//! an `Api-Version` header on every request.

use super::{
    Attachment, FileContent, RemoteEntry, RemoteStore, SearchHit, VersionRecord, WriteOutcome,
};
use crate::config::RemoteConfig;
use crate::error::ApiError;
use crate::tree::path;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Which error class a failed request maps to.
#[derive(Debug, Clone, Copy)]
enum Failure {
    Fetch,
    Write,
}

impl Failure {
    fn error(self, message: String) -> ApiError {
        match self {
            Failure::Fetch => ApiError::RemoteFetch(message),
            Failure::Write => ApiError::RemoteWrite(message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    sha1: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentList {
    #[serde(default)]
    attachments: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
struct VersionBody {
    content: String,
}

#[derive(Debug, Serialize)]
struct PathAction<'a> {
    action: &'a str,
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_path: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WriteBody<'a> {
    path: &'a str,
    content: &'a str,
    comment: &'a str,
}

#[derive(Debug, Serialize)]
struct AttachmentRef<'a> {
    #[serde(rename = "mdPath")]
    md_path: &'a str,
    #[serde(rename = "attachPath")]
    attach_path: &'a str,
}

/// Remote store speaking the service's JSON API over reqwest.
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    api_version: String,
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.resolved_password().unwrap_or_default(),
            api_version: config.api_version.clone(),
        })
    }

    /// Direct download URL for a file in the user's space.
    pub fn download_url(&self, file: &str) -> String {
        format!("{}/api/attach/get/{}", self.base_url, file)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, endpoint))
            .basic_auth(&self.username, Some(&self.password))
            .header("Api-Version", &self.api_version)
    }

    async fn send(&self, builder: RequestBuilder, failure: Failure) -> Result<Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| failure.error(format!("Request failed: {}", e)))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(ErrorBody { error: Some(msg) }) => msg,
            _ => format!("HTTP error! Status: {}", status.as_u16()),
        };
        debug!(status = status.as_u16(), %message, "remote request rejected");
        if status == StatusCode::NOT_FOUND {
            Err(ApiError::NotFound(message))
        } else {
            Err(failure.error(message))
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        failure: Failure,
    ) -> Result<T, ApiError> {
        let response = self.send(builder, failure).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| failure.error(format!("Invalid response body: {}", e)))
    }

    async fn dir_action(&self, body: PathAction<'_>) -> Result<(), ApiError> {
        self.send(
            self.request(Method::POST, "/api/dir").json(&body),
            Failure::Write,
        )
        .await
        .map(|_| ())
    }

    async fn file_action(&self, body: PathAction<'_>) -> Result<(), ApiError> {
        self.send(
            self.request(Method::PATCH, "/api/file").json(&body),
            Failure::Write,
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list_tree(&self, dir: &str, recursive: bool) -> Result<Vec<RemoteEntry>, ApiError> {
        let mut query = vec![("path", dir)];
        if recursive {
            query.push(("recursive", "true"));
        }
        let builder = self.request(Method::GET, "/api/list").query(&query);
        // An empty directory may come back as `null`.
        let entries: Option<Vec<RemoteEntry>> = self.send_json(builder, Failure::Fetch).await?;
        Ok(entries.unwrap_or_default())
    }

    async fn read_file(&self, file: &str) -> Result<FileContent, ApiError> {
        let builder = self.request(Method::GET, "/api/file").query(&[("path", file)]);
        self.send_json(builder, Failure::Fetch).await
    }

    async fn write_file(
        &self,
        file: &str,
        content: &str,
        comment: Option<&str>,
    ) -> Result<WriteOutcome, ApiError> {
        path::ensure_markdown(file)?;
        let body = WriteBody {
            path: file,
            content,
            comment: comment.unwrap_or_default(),
        };
        let builder = self.request(Method::POST, "/api/file").json(&body);
        let status: StatusBody = self.send_json(builder, Failure::Write).await?;
        if status.status == "no change" {
            return Ok(WriteOutcome::NoChange);
        }
        Ok(WriteOutcome::Written {
            new_hash: status.sha1.unwrap_or_default(),
        })
    }

    async fn create_directory(&self, dir: &str) -> Result<(), ApiError> {
        self.dir_action(PathAction {
            action: "create",
            path: dir,
            new_path: None,
        })
        .await
    }

    async fn delete_directory(&self, dir: &str) -> Result<(), ApiError> {
        self.dir_action(PathAction {
            action: "delete",
            path: dir,
            new_path: None,
        })
        .await
    }

    async fn rename_directory(&self, old_path: &str, new_path: &str) -> Result<(), ApiError> {
        self.dir_action(PathAction {
            action: "rename",
            path: old_path,
            new_path: Some(new_path),
        })
        .await
    }

    async fn rename_file(&self, old_path: &str, new_path: &str) -> Result<(), ApiError> {
        path::ensure_markdown(new_path)?;
        self.file_action(PathAction {
            action: "rename",
            path: old_path,
            new_path: Some(new_path),
        })
        .await
    }

    async fn delete_file(&self, file: &str) -> Result<(), ApiError> {
        self.file_action(PathAction {
            action: "delete",
            path: file,
            new_path: None,
        })
        .await
    }

    async fn list_attachments(&self, md_path: &str) -> Result<Vec<Attachment>, ApiError> {
        let builder = self
            .request(Method::GET, "/api/attach/list")
            .query(&[("path", md_path)]);
        let list: AttachmentList = self.send_json(builder, Failure::Fetch).await?;
        Ok(list.attachments)
    }

    async fn delete_attachment(&self, md_path: &str, attach_path: &str) -> Result<(), ApiError> {
        let body = AttachmentRef {
            md_path,
            attach_path,
        };
        self.send(
            self.request(Method::POST, "/api/attach/delete").json(&body),
            Failure::Write,
        )
        .await
        .map(|_| ())
    }

    async fn file_history(&self, file: &str) -> Result<Vec<VersionRecord>, ApiError> {
        let builder = self.request(Method::GET, "/api/history").query(&[("path", file)]);
        let records: Option<Vec<VersionRecord>> = self.send_json(builder, Failure::Fetch).await?;
        Ok(records.unwrap_or_default())
    }

    async fn file_version(&self, file: &str, version_id: u64) -> Result<String, ApiError> {
        let id = version_id.to_string();
        let builder = self
            .request(Method::GET, "/api/version")
            .query(&[("path", file), ("id", id.as_str())]);
        let body: VersionBody = self.send_json(builder, Failure::Fetch).await?;
        Ok(body.content)
    }

    async fn search(&self, query: &str, regex: bool) -> Result<Vec<SearchHit>, ApiError> {
        let mut params = vec![("q", query)];
        if regex {
            params.push(("regex", "true"));
        }
        let builder = self.request(Method::GET, "/api/search").query(&params);
        let hits: Option<Vec<SearchHit>> = self.send_json(builder, Failure::Fetch).await?;
        Ok(hits.unwrap_or_default())
    }
}
