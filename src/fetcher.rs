//! Metadata resolution and image download.
//!
//! [`HttpFetcher`] issues two GETs per cycle: one to the metadata endpoint,
//! whose `image_urls.huge` field names the currently published image, and
//! one for the image itself. There are no retries; each call is bounded by
//! the configured timeout and a failure surfaces to the caller immediately.

use crate::bitmap::Rgb565Bitmap;
use crate::config::{HttpConfig, SourceConfig};
use crate::error::{Result, WallpaperError};
use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;
use serde::Deserialize;
use tracing::{debug, info};

/// Direct URL of the currently published image.
///
/// Change detection compares these by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef(String);

impl ResourceRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceRef {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for ResourceRef {
    fn from(url: String) -> Self {
        Self(url)
    }
}

/// A downloaded image: the original encoding plus its decoded bitmap.
#[derive(Debug, Clone)]
pub struct ImageBytes {
    /// Bytes exactly as served.
    pub encoded: Bytes,
    /// Container format detected from the payload.
    pub format: ImageFormat,
    /// Native-size RGB565 decode.
    pub bitmap: Rgb565Bitmap,
}

impl ImageBytes {
    /// Detect the format and decode `encoded`.
    ///
    /// # Errors
    ///
    /// Returns [`WallpaperError::Decode`] when the format is unknown or the
    /// payload is corrupt.
    pub fn decode(encoded: Bytes) -> Result<Self> {
        let format = image::guess_format(&encoded)
            .map_err(|e| WallpaperError::Decode(format!("unrecognised image format: {e}")))?;
        let bitmap = Rgb565Bitmap::decode(&encoded)?;
        Ok(Self {
            encoded,
            format,
            bitmap,
        })
    }

    /// Preferred file extension for the detected format.
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

/// Where published images come from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Resolve the indirection URL to the current image's direct URL.
    async fn resolve_resource_ref(&self) -> Result<ResourceRef>;

    /// Download and decode the image named by `resource`.
    async fn download(&self, resource: &ResourceRef) -> Result<ImageBytes>;
}

#[derive(Debug, Deserialize)]
struct WebImageResponse {
    image_urls: ImageUrls,
}

#[derive(Debug, Deserialize)]
struct ImageUrls {
    huge: String,
}

/// Extract `image_urls.huge` from a metadata response body.
///
/// # Errors
///
/// Returns [`WallpaperError::Parse`] for non-JSON bodies, a missing or
/// non-string field, an empty URL, or a URL with surrounding whitespace.
/// The value is never rewritten, so change detection sees it exactly as
/// published.
pub fn parse_resource_ref(body: &[u8]) -> Result<ResourceRef> {
    let response: WebImageResponse = serde_json::from_slice(body)
        .map_err(|e| WallpaperError::Parse(format!("invalid metadata response: {e}")))?;
    let huge = response.image_urls.huge;
    if huge.trim().is_empty() {
        return Err(WallpaperError::Parse(
            "metadata field image_urls.huge is empty".to_owned(),
        ));
    }
    if huge.trim() != huge {
        return Err(WallpaperError::Parse(format!(
            "metadata field image_urls.huge has surrounding whitespace: {huge:?}"
        )));
    }
    Ok(ResourceRef::from(huge))
}

fn network_error(context: &str, url: &str, e: &reqwest::Error) -> WallpaperError {
    if e.is_timeout() {
        WallpaperError::Network(format!("{context} {url} timed out: {e}"))
    } else {
        WallpaperError::Network(format!("{context} {url} failed: {e}"))
    }
}

/// [`ImageSource`] backed by `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
    metadata_url: String,
}

impl HttpFetcher {
    /// Build a fetcher with per-request timeouts from `http`.
    ///
    /// # Errors
    ///
    /// Returns [`WallpaperError::Network`] if the HTTP client cannot be built.
    pub fn new(source: &SourceConfig, http: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(source.user_agent.clone())
            .timeout(http.timeout())
            .connect_timeout(http.connect_timeout())
            .build()
            .map_err(|e| WallpaperError::Network(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            metadata_url: source.metadata_url.clone(),
        })
    }

    async fn get_bytes(&self, context: &str, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(context, url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WallpaperError::Network(format!(
                "{context} {url} returned {status}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| network_error(context, url, &e))
    }
}

#[async_trait]
impl ImageSource for HttpFetcher {
    async fn resolve_resource_ref(&self) -> Result<ResourceRef> {
        let body = self.get_bytes("metadata request", &self.metadata_url).await?;
        let resource = parse_resource_ref(&body)?;
        info!(url = %resource, "resolved current image");
        Ok(resource)
    }

    async fn download(&self, resource: &ResourceRef) -> Result<ImageBytes> {
        info!(url = %resource, "downloading image");
        let encoded = self.get_bytes("image request", resource.as_str()).await?;
        let size = encoded.len();

        let image = tokio::task::spawn_blocking(move || ImageBytes::decode(encoded))
            .await
            .map_err(|e| WallpaperError::Decode(format!("decode task failed: {e}")))??;

        debug!(
            url = %resource,
            bytes = size,
            width = image.bitmap.width(),
            height = image.bitmap.height(),
            "image decoded"
        );
        Ok(image)
    }
}
