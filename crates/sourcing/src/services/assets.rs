//! Remote asset download to local media storage.
//!
//! Downloads product images and videos referenced by a sourced listing so
//! detail pages never depend on the source platform's CDN staying up. A
//! batch never aborts on a single bad URL: each failed item keeps its
//! remote URL and the failure is logged.

use std::path::{Path, PathBuf};

use tracing::instrument;
use url::Url;
use uuid::Uuid;

/// Path prefix under which downloaded assets are served.
const PUBLIC_PREFIX: &str = "/uploads";
/// Videos land in their own subdirectory.
const VIDEO_SUBDIR: &str = "videos";

const DEFAULT_IMAGE_EXT: &str = "jpg";
const DEFAULT_VIDEO_EXT: &str = "mp4";

/// What kind of media a URL points at; decides filename defaults and
/// storage subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Product image
    Image,
    /// Product video
    Video,
}

impl AssetKind {
    const fn default_ext(self) -> &'static str {
        match self {
            Self::Image => DEFAULT_IMAGE_EXT,
            Self::Video => DEFAULT_VIDEO_EXT,
        }
    }

    const fn subdir(self) -> Option<&'static str> {
        match self {
            Self::Image => None,
            Self::Video => Some(VIDEO_SUBDIR),
        }
    }
}

/// Result of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    /// The URL the asset was fetched from.
    pub original_url: String,
    /// Local serving path (`/uploads/...`) when the download succeeded.
    pub local_path: Option<String>,
}

impl FetchedAsset {
    /// Whether the asset landed on local storage.
    #[must_use]
    pub const fn is_downloaded(&self) -> bool {
        self.local_path.is_some()
    }

    /// The URL to reference from listing media: the local path when
    /// downloaded, the remote URL otherwise.
    #[must_use]
    pub fn effective_url(&self) -> &str {
        self.local_path.as_deref().unwrap_or(&self.original_url)
    }

    fn failed(original_url: String) -> Self {
        Self {
            original_url,
            local_path: None,
        }
    }
}

/// Internal per-item failure reasons; logged, never propagated.
#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("not an absolute http(s) URL")]
    InvalidUrl,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(u16),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloads remote assets into the media root.
pub struct AssetFetcher {
    client: reqwest::Client,
    media_root: PathBuf,
}

impl AssetFetcher {
    /// Create a fetcher storing files under `media_root`.
    #[must_use]
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            media_root: media_root.into(),
        }
    }

    /// Download every URL in `urls` concurrently.
    ///
    /// Returns one [`FetchedAsset`] per input URL, in input order. Items
    /// that fail to download (invalid URL, network error, bad status) are
    /// returned with `local_path: None`.
    #[instrument(skip(self, urls), fields(count = urls.len(), kind = ?kind))]
    pub async fn fetch_all(&self, urls: &[String], kind: AssetKind) -> Vec<FetchedAsset> {
        let downloads = urls.iter().map(|url| self.fetch_one(url.clone(), kind));
        futures::future::join_all(downloads).await
    }

    async fn fetch_one(&self, url: String, kind: AssetKind) -> FetchedAsset {
        match self.download(&url, kind).await {
            Ok(local_path) => FetchedAsset {
                original_url: url,
                local_path: Some(local_path),
            },
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "asset download failed, keeping remote URL");
                FetchedAsset::failed(url)
            }
        }
    }

    async fn download(&self, url: &str, kind: AssetKind) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl);
        }

        let response = self.client.get(parsed.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension_for(&parsed, kind));

        let mut dir = self.media_root.clone();
        let mut public_path = PUBLIC_PREFIX.to_string();
        if let Some(subdir) = kind.subdir() {
            dir.push(subdir);
            public_path.push('/');
            public_path.push_str(subdir);
        }
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &bytes).await?;

        public_path.push('/');
        public_path.push_str(&file_name);
        Ok(public_path)
    }
}

/// File extension for a downloaded asset, taken from the URL path when it
/// looks like a plain extension, otherwise the kind's default.
fn extension_for(url: &Url, kind: AssetKind) -> String {
    Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(char::is_alphanumeric))
        .map_or_else(|| kind.default_ext().to_string(), str::to_lowercase)
}
