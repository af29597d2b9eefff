use anyhow::Context;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use super::error::ApiError;
use crate::config::Config;
use crate::model::Download;

/// How small a "file" response has to be before we suspect it is a JSON
/// error dressed up as a download.
const SMALL_BODY_LIMIT: usize = 2048;

/// The single configured HTTP client for the school backend. The bearer
/// token is injected into every outgoing request from the stored session
/// value.
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Mutex<Option<String>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let mut base = cfg.backend.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).context("invalid backend.base_url")?;
        Ok(Self::with_base_url(
            base_url,
            Duration::from_secs(cfg.backend.timeout_seconds),
        ))
    }

    pub fn with_base_url(base_url: Url, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent(concat!("classdeskd/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token: Mutex::new(None),
        }
    }

    pub fn set_bearer(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = token;
        }
    }

    fn bearer(&self) -> Option<String> {
        self.token.lock().ok().and_then(|guard| guard.clone())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("bad endpoint {path}: {e}")))
    }

    async fn send(&self, rb: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let rb = match self.bearer() {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        };
        let resp = rb.send().await?;
        let status = resp.status();
        debug!(status = %status, url = %resp.url(), "backend response");
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            let code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(code, &body));
        }
        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, ?query, "GET");
        let resp = self.send(self.http.get(url).query(query)).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let resp = self.send(self.http.post(url).json(body)).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "PUT");
        let resp = self.send(self.http.put(url).json(body)).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, "DELETE");
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    /// Fetch a server-generated file. The filename comes from the
    /// `Content-Disposition` header when present; a small body that parses as
    /// a JSON error is disambiguated here and returned as `ApiError::Api`,
    /// never handed to the caller as a "file".
    pub(crate) async fn get_download(
        &self,
        path: &str,
        query: &[(String, String)],
        default_stem: &str,
    ) -> Result<Download, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%url, ?query, "GET download");
        let resp = self.send(self.http.get(url).query(query)).await?;
        let filename = resp
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_disposition_filename)
            .unwrap_or_else(|| {
                format!("{default_stem}-{}.xlsx", chrono::Local::now().format("%Y-%m-%d"))
            });
        let bytes = resp.bytes().await?.to_vec();
        if bytes.len() < SMALL_BODY_LIMIT {
            if let Ok(v) = serde_json::from_slice::<Value>(&bytes) {
                if let Some(msg) = v
                    .get("message")
                    .or_else(|| v.get("error"))
                    .and_then(|m| m.as_str())
                {
                    return Err(ApiError::Api {
                        status: 200,
                        message: msg.to_string(),
                    });
                }
            }
        }
        Ok(Download { filename, bytes })
    }
}

fn parse_disposition_filename(header: &str) -> Option<String> {
    let idx = header.find("filename=")?;
    let raw = header[idx + "filename=".len()..]
        .split(';')
        .next()?
        .trim()
        .trim_matches('"');
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}
