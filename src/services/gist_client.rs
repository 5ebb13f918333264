//! GitHub Gist REST client.
//!
//! [`GistApi`] is the seam between the sync core and the network; the
//! production implementation is [`GistClient`] on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::types::errors::SyncError;
use crate::types::gist::{CreateGistRequest, Gist, UpdateGistRequest};
use crate::types::settings::SyncSettings;

const GITHUB_API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";

/// Raw gist operations. Status classification happens here:
/// 401 ⇒ `AuthError`, 404 on get/update ⇒ `NotFound`, any other non-2xx ⇒ `RemoteError`.
#[async_trait]
pub trait GistApi: Send + Sync {
    async fn get_gist(&self, token: &str, gist_id: &str) -> Result<Gist, SyncError>;
    async fn create_gist(&self, token: &str, request: &CreateGistRequest) -> Result<Gist, SyncError>;
    async fn update_gist(&self, token: &str, gist_id: &str, request: &UpdateGistRequest) -> Result<Gist, SyncError>;
    /// One page of the token owner's gists, 1-based.
    async fn list_gists(&self, token: &str, page: u32, per_page: u32) -> Result<Vec<Gist>, SyncError>;
}

/// `reqwest`-backed Gist client.
pub struct GistClient {
    client: Client,
    base_url: String,
}

impl GistClient {
    /// Builds a client from the sync settings. The request timeout is the only
    /// timeout in play: the sync core never retries on its own.
    pub fn new(settings: &SyncSettings) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(settings.request_timeout_secs.min(10)))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| SyncError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .bearer_auth(token)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, SyncError> {
        builder
            .send()
            .await
            .map_err(|e| SyncError::NetworkError(e.to_string()))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::MalformedRemote(format!("unexpected gist payload: {}", e)))
    }

    /// Large files come back with `truncated: true`; their full body lives at `raw_url`.
    async fn fill_truncated(&self, token: &str, gist: &mut Gist) -> Result<(), SyncError> {
        for (name, file) in gist.files.iter_mut() {
            if !file.truncated {
                continue;
            }
            let Some(raw_url) = file.raw_url.clone() else {
                continue;
            };
            log::debug!("gist file {} truncated, fetching raw content", name);
            let response = Self::send(self.request(Method::GET, &raw_url, token)).await?;
            let response = check_status(response, Some(&gist.id)).await?;
            let body = response
                .text()
                .await
                .map_err(|e| SyncError::NetworkError(e.to_string()))?;
            file.content = Some(body);
            file.truncated = false;
        }
        Ok(())
    }
}

/// Maps a non-2xx response to the sync error taxonomy.
///
/// `missing_id` is set for operations where a 404 means the gist is gone
/// (get, update); elsewhere a 404 is just another remote error.
pub async fn check_status(response: Response, missing_id: Option<&str>) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, missing_id, &body))
}

pub fn classify_status(status: StatusCode, missing_id: Option<&str>, body: &str) -> SyncError {
    let message = api_message(body);
    match (status, missing_id) {
        (StatusCode::UNAUTHORIZED, _) => SyncError::AuthError(message),
        (StatusCode::NOT_FOUND, Some(id)) => SyncError::NotFound(id.to_string()),
        _ => SyncError::RemoteError {
            status: status.as_u16(),
            message,
        },
    }
}

/// GitHub errors carry `{"message": ...}`; fall back to the raw body.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl GistApi for GistClient {
    async fn get_gist(&self, token: &str, gist_id: &str) -> Result<Gist, SyncError> {
        let url = self.url(&format!("gists/{}", gist_id));
        let response = Self::send(self.request(Method::GET, &url, token)).await?;
        let response = check_status(response, Some(gist_id)).await?;
        let mut gist: Gist = Self::decode(response).await?;
        self.fill_truncated(token, &mut gist).await?;
        Ok(gist)
    }

    async fn create_gist(&self, token: &str, request: &CreateGistRequest) -> Result<Gist, SyncError> {
        let url = self.url("gists");
        let response = Self::send(self.request(Method::POST, &url, token).json(request)).await?;
        let response = check_status(response, None).await?;
        Self::decode(response).await
    }

    async fn update_gist(&self, token: &str, gist_id: &str, request: &UpdateGistRequest) -> Result<Gist, SyncError> {
        let url = self.url(&format!("gists/{}", gist_id));
        let response = Self::send(self.request(Method::PATCH, &url, token).json(request)).await?;
        let response = check_status(response, Some(gist_id)).await?;
        Self::decode(response).await
    }

    async fn list_gists(&self, token: &str, page: u32, per_page: u32) -> Result<Vec<Gist>, SyncError> {
        let url = self.url("gists");
        let builder = self
            .request(Method::GET, &url, token)
            .query(&[("per_page", per_page), ("page", page)]);
        let response = Self::send(builder).await?;
        let response = check_status(response, None).await?;
        Self::decode(response).await
    }
}
