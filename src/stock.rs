//! Stock footage search and download.
//!
//! Providers are optional: one without an API key is never registered, and
//! one that fails during a search is skipped. Searches therefore return
//! whatever the working providers found, possibly nothing.

use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::StockConfig;
use crate::error::{Result, ReelError};

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockClip {
    pub source: String,
    pub media_url: String,
    pub thumbnail_url: String,
}

/// A remote stock footage catalogue
#[async_trait]
pub trait StockProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<StockClip>>;
}

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    videos: PixabayRenditions,
    #[serde(rename = "userImageURL", default)]
    user_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PixabayRenditions {
    medium: PixabayRendition,
}

#[derive(Debug, Deserialize)]
struct PixabayRendition {
    url: String,
    #[serde(default)]
    thumbnail: Option<String>,
}

/// Pixabay video search
pub struct PixabayProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    video_type: String,
    per_page: u32,
}

impl PixabayProvider {
    pub fn new(client: Client, config: &StockConfig, api_key: String) -> Self {
        Self {
            client,
            endpoint: config.pixabay_endpoint.clone(),
            api_key,
            video_type: config.video_type.clone(),
            per_page: config.per_page,
        }
    }
}

#[async_trait]
impl StockProvider for PixabayProvider {
    fn name(&self) -> &str {
        "pixabay"
    }

    async fn search(&self, query: &str) -> Result<Vec<StockClip>> {
        let per_page = self.per_page.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("video_type", self.video_type.as_str()),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReelError::Stock(format!("Pixabay API error {}", response.status())));
        }

        let body: PixabayResponse = response.json().await?;
        Ok(body
            .hits
            .into_iter()
            .map(|hit| StockClip {
                source: self.name().to_string(),
                thumbnail_url: hit
                    .user_image_url
                    .filter(|u| !u.is_empty())
                    .or(hit.videos.medium.thumbnail)
                    .unwrap_or_default(),
                media_url: hit.videos.medium.url,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct PexelsResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    #[serde(default)]
    image: String,
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    #[serde(default)]
    quality: Option<String>,
    link: String,
}

/// Pexels video search
pub struct PexelsProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    per_page: u32,
}

impl PexelsProvider {
    pub fn new(client: Client, config: &StockConfig, api_key: String) -> Self {
        Self {
            client,
            endpoint: config.pexels_endpoint.clone(),
            api_key,
            per_page: config.per_page,
        }
    }
}

#[async_trait]
impl StockProvider for PexelsProvider {
    fn name(&self) -> &str {
        "pexels"
    }

    async fn search(&self, query: &str) -> Result<Vec<StockClip>> {
        let per_page = self.per_page.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .header("Authorization", &self.api_key)
            .query(&[("query", query), ("per_page", per_page.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReelError::Stock(format!("Pexels API error {}", response.status())));
        }

        let body: PexelsResponse = response.json().await?;
        Ok(body
            .videos
            .into_iter()
            .filter_map(|video| {
                // Prefer the standard-definition rendition, like Pixabay's "medium"
                let index = video
                    .video_files
                    .iter()
                    .position(|f| f.quality.as_deref() == Some("sd"))
                    .unwrap_or(0);
                let file = video.video_files.into_iter().nth(index)?;
                Some(StockClip {
                    source: self.name().to_string(),
                    media_url: file.link,
                    thumbnail_url: video.image,
                })
            })
            .collect())
    }
}

/// Searches the configured providers and downloads footage
pub struct StockLocator {
    client: Client,
    providers: Vec<Box<dyn StockProvider>>,
    show_progress: bool,
}

impl StockLocator {
    pub fn new(client: Client, providers: Vec<Box<dyn StockProvider>>) -> Self {
        Self {
            client,
            providers,
            show_progress: false,
        }
    }

    /// Register every provider that has an API key
    pub fn from_config(config: &StockConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("reelcraft/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ReelError::Http)?;

        let key = |value: &Option<String>| value.clone().filter(|k| !k.trim().is_empty());
        let mut providers: Vec<Box<dyn StockProvider>> = Vec::new();
        if let Some(api_key) = key(&config.pixabay_api_key) {
            providers.push(Box::new(PixabayProvider::new(client.clone(), config, api_key)));
        }
        if let Some(api_key) = key(&config.pexels_api_key) {
            providers.push(Box::new(PexelsProvider::new(client.clone(), config, api_key)));
        }

        Ok(Self::new(client, providers))
    }

    /// Draw a progress bar on stderr while fetching
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Query every provider in order; failing providers are skipped
    pub async fn search(&self, query: &str) -> Vec<StockClip> {
        let mut results = Vec::new();

        for provider in &self.providers {
            match provider.search(query).await {
                Ok(clips) => {
                    debug!("{} returned {} clips for '{}'", provider.name(), clips.len(), query);
                    results.extend(clips);
                }
                Err(e) => warn!("{} search error: {}", provider.name(), e),
            }
        }

        info!("Found {} stock clips for '{}'", results.len(), query);
        results
    }

    /// Download `url` to a new temporary file; `None` on any failure.
    ///
    /// The file is deleted when the returned path is dropped.
    pub async fn fetch(&self, url: &str) -> Option<TempPath> {
        match self.download(url).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Download error for {}: {}", url, e);
                None
            }
        }
    }

    async fn download(&self, url: &str) -> Result<TempPath> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ReelError::Stock(format!("HTTP {}", response.status())));
        }

        let pb = match response.content_length() {
            Some(length) => ProgressBar::new(length),
            None => ProgressBar::new_spinner(),
        };
        if self.show_progress {
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .map_err(|e| ReelError::Stock(e.to_string()))?
                    .progress_chars("#>-"),
            );
        } else {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        // Removed on early return by the TempPath drop
        let path = tempfile::Builder::new()
            .prefix("reelcraft-stock-")
            .suffix(".mp4")
            .tempfile()?
            .into_temp_path();
        let mut file = tokio::fs::File::create(&path).await?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            pb.inc(chunk.len() as u64);
        }
        file.flush().await?;
        drop(file);

        pb.finish_and_clear();
        info!("Downloaded {} to {}", url, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn stock_config(server: &MockServer) -> StockConfig {
        let mut config = Config::default().stock;
        config.pixabay_endpoint = format!("{}/api/videos/", server.uri());
        config.pexels_endpoint = format!("{}/videos/search", server.uri());
        config
    }

    #[tokio::test]
    async fn test_no_providers_means_no_results() {
        let locator = StockLocator::from_config(&Config::default().stock).unwrap();
        assert_eq!(locator.provider_count(), 0);
        assert!(locator.search("ocean waves").await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_keys_are_not_registered() {
        let mut config = Config::default().stock;
        config.pixabay_api_key = Some(" ".to_string());
        config.pexels_api_key = Some(String::new());
        assert_eq!(StockLocator::from_config(&config).unwrap().provider_count(), 0);
    }

    #[tokio::test]
    async fn test_pixabay_hits_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/videos/"))
            .and(query_param("key", "pix"))
            .and(query_param("q", "ocean"))
            .and(query_param("video_type", "film"))
            .and(query_param("per_page", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 2,
                "hits": [
                    {"videos": {"medium": {"url": "https://cdn/a.mp4", "thumbnail": "https://cdn/a.jpg"}},
                     "userImageURL": "https://cdn/user-a.jpg"},
                    {"videos": {"medium": {"url": "https://cdn/b.mp4", "thumbnail": "https://cdn/b.jpg"}},
                     "userImageURL": ""}
                ]
            })))
            .mount(&server)
            .await;

        let mut config = stock_config(&server);
        config.pixabay_api_key = Some("pix".to_string());
        let clips = StockLocator::from_config(&config).unwrap().search("ocean").await;

        assert_eq!(
            clips,
            vec![
                StockClip {
                    source: "pixabay".to_string(),
                    media_url: "https://cdn/a.mp4".to_string(),
                    thumbnail_url: "https://cdn/user-a.jpg".to_string(),
                },
                StockClip {
                    source: "pixabay".to_string(),
                    media_url: "https://cdn/b.mp4".to_string(),
                    thumbnail_url: "https://cdn/b.jpg".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_provider_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/videos/"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos/search"))
            .and(header("Authorization", "pex"))
            .and(query_param("query", "city"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "videos": [{
                    "image": "https://pexels/thumb.jpg",
                    "video_files": [
                        {"quality": "hd", "link": "https://pexels/hd.mp4"},
                        {"quality": "sd", "link": "https://pexels/sd.mp4"}
                    ]
                }, {
                    "image": "https://pexels/empty.jpg",
                    "video_files": []
                }]
            })))
            .mount(&server)
            .await;

        let mut config = stock_config(&server);
        config.pixabay_api_key = Some("pix".to_string());
        config.pexels_api_key = Some("pex".to_string());
        let locator = StockLocator::from_config(&config).unwrap();
        assert_eq!(locator.provider_count(), 2);

        let clips = locator.search("city").await;
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].source, "pexels");
        assert_eq!(clips[0].media_url, "https://pexels/sd.mp4");
        assert_eq!(clips[0].thumbnail_url, "https://pexels/thumb.jpg");
    }

    #[tokio::test]
    async fn test_fetch_streams_to_temp_file() {
        let server = MockServer::start().await;
        let body = vec![7u8; 64 * 1024];
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let locator = StockLocator::from_config(&Config::default().stock).unwrap();
        let fetched = locator.fetch(&format!("{}/clip.mp4", server.uri())).await.unwrap();

        assert_eq!(std::fs::read(&fetched).unwrap(), body);
        let fetched_path = fetched.to_path_buf();
        drop(fetched);
        assert!(!fetched_path.exists());
    }

    #[tokio::test]
    async fn test_fetch_failures_are_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let locator = StockLocator::from_config(&Config::default().stock).unwrap();
        assert!(locator.fetch(&format!("{}/missing.mp4", server.uri())).await.is_none());
        assert!(locator.fetch("http://127.0.0.1:9/unreachable.mp4").await.is_none());
        assert!(locator.fetch("not a url").await.is_none());
    }

    #[test]
    fn test_clip_wire_shape() {
        let clip = StockClip {
            source: "pixabay".to_string(),
            media_url: "m".to_string(),
            thumbnail_url: "t".to_string(),
        };
        let json = serde_json::to_value(&clip).unwrap();
        assert_eq!(json, serde_json::json!({"source": "pixabay", "mediaUrl": "m", "thumbnailUrl": "t"}));
    }
}
