//! REST client for the admin livestock endpoints.
//!
//! Wraps `/admin/livestock/` and `/admin/media/` using [`reqwest`] and
//! exposes them through the core [`ListingApi`] trait.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use glafrica_core::api::{
    ApiError, ListingApi, ListingDetail, ListingPayload, MediaRef, UploadOptions,
};
use glafrica_core::media::MediaFile;
use glafrica_core::types::{ListingId, MediaId};

/// Errors from the admin REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Admin API error ({status}): {body}")]
    Status {
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A media file could not be read for upload.
    #[error("Could not read {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    /// No usable credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Request(e) if e.is_decode() => ApiError::Decode(e.to_string()),
            ClientError::Request(e) => ApiError::Transport(e.to_string()),
            ClientError::Status { status, body } if status == 401 || status == 403 => {
                ApiError::Unauthorized(backend_message(status, &body))
            }
            ClientError::Status { status, body } => ApiError::Backend {
                status,
                message: backend_message(status, &body),
            },
            ClientError::File { path, source } => ApiError::File {
                path,
                message: source.to_string(),
            },
            ClientError::Auth(message) => ApiError::Unauthorized(message),
        }
    }
}

/// User-facing message for an error body.
///
/// Prefers the `detail` field, then field errors (`{"price": ["..."]}`)
/// rendered as `price: ...`, then the raw body.
pub fn backend_message(status: u16, body: &str) -> String {
    let fallback = || {
        let raw = body.trim();
        if raw.is_empty() {
            format!("Request failed with status {status}")
        } else {
            raw.to_string()
        }
    };

    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback();
    };
    if let Some(detail) = map.get("detail").and_then(|d| d.as_str()) {
        return detail.to_string();
    }

    let fields: Vec<String> = map
        .iter()
        .filter_map(|(field, value)| {
            let first = match value {
                serde_json::Value::Array(items) => items.first()?.as_str()?,
                serde_json::Value::String(s) => s.as_str(),
                _ => return None,
            };
            Some(if field == "non_field_errors" {
                first.to_string()
            } else {
                format!("{field}: {first}")
            })
        })
        .collect();
    if fields.is_empty() {
        fallback()
    } else {
        fields.join("; ")
    }
}

/// HTTP client for the admin API of one backend.
#[derive(Debug, Clone)]
pub struct AdminApiClient {
    client: reqwest::Client,
    /// Base URL including `/api/v1`, without trailing slash.
    api_url: String,
    access_token: Option<String>,
}

impl AdminApiClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Reuse an existing [`reqwest::Client`] (timeouts, connection pool).
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    /// Send `token` as a bearer token on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/admin/{}", self.api_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post_listing(&self, payload: &ListingPayload) -> Result<ListingDetail, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "livestock/")
            .json(payload)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn patch_listing(
        &self,
        id: ListingId,
        payload: &ListingPayload,
    ) -> Result<ListingDetail, ClientError> {
        let response = self
            .request(reqwest::Method::PATCH, &format!("livestock/{id}/"))
            .json(payload)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn fetch_listing(&self, id: ListingId) -> Result<ListingDetail, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &format!("livestock/{id}/"))
            .send()
            .await?;
        parse_response(response).await
    }

    /// `POST /admin/livestock/{id}/upload_media/` as multipart form data.
    async fn post_media(
        &self,
        listing: ListingId,
        file: &MediaFile,
        options: UploadOptions,
    ) -> Result<MediaRef, ClientError> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| ClientError::File {
                path: file.path.display().to_string(),
                source,
            })?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("media_type", options.media_kind.as_str())
            .text("is_featured", if options.is_featured { "true" } else { "false" })
            .text("aspect_ratio", options.aspect_ratio.to_string());

        let response = self
            .request(reqwest::Method::POST, &format!("livestock/{listing}/upload_media/"))
            .multipart(form)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn remove_media(&self, media: MediaId) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("media/{media}/"))
            .send()
            .await?;
        check_status(response).await
    }

    async fn feature_media(&self, media: MediaId) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::POST, &format!("media/{media}/set_featured/"))
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl ListingApi for AdminApiClient {
    async fn create_listing(&self, payload: &ListingPayload) -> Result<ListingDetail, ApiError> {
        Ok(self.post_listing(payload).await?)
    }

    async fn update_listing(
        &self,
        id: ListingId,
        payload: &ListingPayload,
    ) -> Result<ListingDetail, ApiError> {
        Ok(self.patch_listing(id, payload).await?)
    }

    async fn get_listing(&self, id: ListingId) -> Result<ListingDetail, ApiError> {
        Ok(self.fetch_listing(id).await?)
    }

    async fn upload_media(
        &self,
        listing: ListingId,
        file: &MediaFile,
        options: UploadOptions,
    ) -> Result<MediaRef, ApiError> {
        tracing::debug!(
            %listing,
            file = %file.file_name,
            size = file.size,
            is_featured = options.is_featured,
            "Uploading media",
        );
        Ok(self.post_media(listing, file, options).await?)
    }

    async fn delete_media(&self, listing: ListingId, media: MediaId) -> Result<(), ApiError> {
        tracing::debug!(%listing, %media, "Deleting media");
        Ok(self.remove_media(media).await?)
    }

    async fn set_featured_media(&self, media: MediaId) -> Result<(), ApiError> {
        Ok(self.feature_media(media).await?)
    }
}

// ---- response helpers ----

/// Return the response unchanged on success, or a
/// [`ClientError::Status`] with the status and body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

pub(crate) async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
    ensure_success(response).await?;
    Ok(())
}
