// Async HTTP client for Vitrine resource collections.
//
// Endpoint shape (relative to the base URL):
//   GET    {resource}                 list
//   POST   {resource}                 create
//   PUT    {resource}/{id}            update
//   DELETE {resource}/{id}            remove
//   PATCH  {resource}/{id}/status     status transition
//   POST   {resource}/bulk-delete     bulk remove
//   POST   {resource}/bulk-status     bulk status transition

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{
    BulkIds, BulkStatusUpdate, ListResponse, Payload, Record, RecordResponse, StatusUpdate,
};

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the resource endpoints of one admin API.
///
/// The same client serves every resource; the resource path is passed per
/// call (e.g. `"products"` or `"catalog/services"`).
#[derive(Debug, Clone)]
pub struct ResourceClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ResourceClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout: transport.timeout,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            timeout: Duration::from_secs(30),
        })
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(raw.to_owned()));
        }
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append the resource path and extra segments to the base URL.
    ///
    /// Segments are percent-encoded individually, so ids containing `/`
    /// or spaces stay a single path segment.
    fn endpoint(&self, resource: &str, extra: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(resource.split('/').filter(|s| !s.is_empty()));
            segments.extend(extra);
        }
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let resp = self.send(self.http.get(url)).await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");
        let resp = self.send(self.http.post(url).json(body)).await?;
        Self::handle_response(resp).await
    }

    async fn post_optional<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<Option<T>, Error> {
        debug!("POST {url}");
        let resp = self.send(self.http.post(url).json(body)).await?;
        Self::handle_optional(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PUT {url}");
        let resp = self.send(self.http.put(url).json(body)).await?;
        Self::handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PATCH {url}");
        let resp = self.send(self.http.patch(url).json(body)).await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {url}");
        let resp = self.send(self.http.delete(url)).await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            decode(body)
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_optional<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Option<T>, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }
        let body = resp.text().await?;
        if body.trim().is_empty() {
            Ok(None)
        } else {
            decode(body).map(Some)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let (message, code) = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) => (err.message.unwrap_or_else(|| status.to_string()), err.code),
            Err(_) if raw.is_empty() => (status.to_string(), None),
            Err(_) => (raw, None),
        };

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Error::Authentication {
                status: status.as_u16(),
                message,
            };
        }

        Error::Api {
            message,
            code,
            status: status.as_u16(),
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Resource operations
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fetch the full collection.
    pub async fn list(&self, resource: &str) -> Result<Vec<Record>, Error> {
        let url = self.endpoint(resource, &[])?;
        let resp: ListResponse = self.get(url).await?;
        Ok(resp.into_records())
    }

    /// Create a record; the server assigns the id.
    pub async fn create(&self, resource: &str, payload: &Payload) -> Result<Record, Error> {
        let url = self.endpoint(resource, &[])?;
        let resp: RecordResponse = self.post(url, payload).await?;
        Ok(resp.into_record())
    }

    /// Replace the fields given in `payload` on record `id`.
    pub async fn update(
        &self,
        resource: &str,
        id: &str,
        payload: &Payload,
    ) -> Result<Record, Error> {
        let url = self.endpoint(resource, &[id])?;
        let resp: RecordResponse = self.put(url, payload).await?;
        Ok(resp.into_record())
    }

    pub async fn delete_record(&self, resource: &str, id: &str) -> Result<(), Error> {
        let url = self.endpoint(resource, &[id])?;
        self.delete(url).await
    }

    /// Move record `id` to `status` (stored in attribute `field`).
    pub async fn update_status(
        &self,
        resource: &str,
        id: &str,
        field: &str,
        status: &str,
    ) -> Result<Record, Error> {
        let url = self.endpoint(resource, &[id, "status"])?;
        let resp: RecordResponse = self.patch(url, &StatusUpdate { field, status }).await?;
        Ok(resp.into_record())
    }

    pub async fn bulk_delete(&self, resource: &str, ids: &[String]) -> Result<(), Error> {
        let url = self.endpoint(resource, &["bulk-delete"])?;
        debug!(count = ids.len(), "bulk delete");
        let _: Option<serde_json::Value> = self.post_optional(url, &BulkIds { ids }).await?;
        Ok(())
    }

    /// Bulk status transition. Servers that answer `204 No Content`
    /// yield `None`; the caller then patches its local copies itself.
    pub async fn bulk_update_status(
        &self,
        resource: &str,
        ids: &[String],
        field: &str,
        status: &str,
    ) -> Result<Option<Vec<Record>>, Error> {
        let url = self.endpoint(resource, &["bulk-status"])?;
        let body = BulkStatusUpdate { ids, field, status };
        let resp: Option<ListResponse> = self.post_optional(url, &body).await?;
        Ok(resp.map(ListResponse::into_records))
    }
}

fn decode<T: DeserializeOwned>(body: String) -> Result<T, Error> {
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}
