//! `reqwest` implementation of [`FolderApi`].
//!
//! Every request carries `Authorization: Bearer <token>`. A `401` response is
//! mapped to [`AppError::Unauthorized`]; the manager reacts to it by clearing
//! the session store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::remote::api::FolderApi;
use crate::remote::model::{
    normalize_folder, normalize_folders, CreateFolderRequest, Folder, MoveFileRequest,
    MoveFolderRequest, RawFolder, UpdateFolderRequest,
};

/// Connection settings for [`HttpFolderApi`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

/// REST client for the folder endpoints.
pub struct HttpFolderApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Top-level list bodies come bare or wrapped.
#[derive(Deserialize)]
#[serde(untagged)]
enum FolderListBody {
    Bare(Vec<RawFolder>),
    Data { data: Vec<RawFolder> },
    Folders { folders: Vec<RawFolder> },
}

impl FolderListBody {
    fn into_inner(self) -> Vec<RawFolder> {
        match self {
            FolderListBody::Bare(v) => v,
            FolderListBody::Data { data } => data,
            FolderListBody::Folders { folders } => folders,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FolderContentBody {
    Data { data: RawFolder },
    Folder { folder: RawFolder },
    Bare(RawFolder),
}

impl FolderContentBody {
    fn into_inner(self) -> RawFolder {
        match self {
            FolderContentBody::Data { data } => data,
            FolderContentBody::Folder { folder } => folder,
            FolderContentBody::Bare(raw) => raw,
        }
    }
}

impl HttpFolderApi {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .default_headers(default_headers)
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_header(&self) -> Result<HeaderValue> {
        HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| AppError::Config(format!("invalid characters in API token: {}", e)))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .request(method, self.url(path))
            .header(AUTHORIZATION, self.auth_header()?))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let resp = builder.send().await?;
        check_status(resp).await
    }

    async fn send_body<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<()> {
        let builder = self.request(method, path)?.json(body);
        self.send(builder).await?;
        Ok(())
    }
}

/// Turn non-success responses into errors, reading the body for a message.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED {
        warn!("backend rejected the session token");
        return Err(AppError::Unauthorized);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = extract_error_message(&body);
    warn!(status = status.as_u16(), %message, "request failed");
    Err(AppError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `message`, `error` and `detail` (string or nested `{message}`).
/// Returns an empty string when nothing usable is found.
pub fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return String::new();
    };
    for key in ["message", "error", "detail"] {
        match value.get(key) {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => return s.clone(),
            Some(serde_json::Value::Array(items)) => {
                let joined: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
                if !joined.is_empty() {
                    return joined.join(", ");
                }
            }
            Some(nested @ serde_json::Value::Object(_)) => {
                if let Some(s) = nested.get("message").and_then(|m| m.as_str()) {
                    return s.to_string();
                }
            }
            _ => {}
        }
    }
    String::new()
}

fn parse_folder_list(body: &str) -> Result<Vec<Folder>> {
    let list: FolderListBody = serde_json::from_str(body)?;
    Ok(normalize_folders(list.into_inner()))
}

fn parse_folder_content(body: &str) -> Result<Folder> {
    let content: FolderContentBody = serde_json::from_str(body)?;
    Ok(normalize_folder(content.into_inner()))
}

#[async_trait]
impl FolderApi for HttpFolderApi {
    async fn organization_folders(&self, organization_id: &str) -> Result<Vec<Folder>> {
        debug!(organization_id, "fetching organization folders");
        let path = format!("/folders/organization/{}", organization_id);
        let resp = self.send(self.request(Method::GET, &path)?).await?;
        parse_folder_list(&resp.text().await?)
    }

    async fn folder_content(&self, folder_id: &str) -> Result<Folder> {
        debug!(folder_id, "fetching folder content");
        let path = format!("/folders/{}/content", folder_id);
        let resp = self.send(self.request(Method::GET, &path)?).await?;
        parse_folder_content(&resp.text().await?)
    }

    async fn create_folder(&self, request: &CreateFolderRequest) -> Result<()> {
        self.send_body(Method::POST, "/folders", request).await
    }

    async fn update_folder(&self, request: &UpdateFolderRequest) -> Result<()> {
        let path = format!("/folders/{}", request.id);
        self.send_body(Method::PUT, &path, request).await
    }

    async fn delete_folder(&self, folder_id: &str) -> Result<()> {
        let path = format!("/folders/{}", folder_id);
        self.send(self.request(Method::DELETE, &path)?).await?;
        Ok(())
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let path = format!("/files/{}", file_id);
        self.send(self.request(Method::DELETE, &path)?).await?;
        Ok(())
    }

    async fn move_file(&self, request: &MoveFileRequest) -> Result<()> {
        self.send_body(Method::PUT, "/files/move", request).await
    }

    async fn move_folder(&self, request: &MoveFolderRequest) -> Result<()> {
        self.send_body(Method::PUT, "/folders/move", request).await
    }
}
