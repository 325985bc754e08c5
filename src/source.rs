use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::loader::LoadError;

/// Where the static JSON documents live.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError>;

    /// Human-readable location of `path`, for logs and messages.
    fn locate(&self, path: &str) -> String;
}

pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataSource for FsSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        let full = self.root.join(path);
        debug!("Reading {}", full.display());
        tokio::fs::read(&full).await.map_err(|source| LoadError::Io {
            path: full.display().to_string(),
            source,
        })
    }

    fn locate(&self, path: &str) -> String {
        self.root.join(path).display().to_string()
    }
}

pub struct HttpSource {
    base: Url,
    client: Client,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> anyhow::Result<Self> {
        // Url::join drops the last segment unless the base ends in '/'
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(concat!("internboard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { base, client })
    }

    fn url(&self, path: &str) -> Result<Url, LoadError> {
        self.base.join(path).map_err(|e| LoadError::BadPath {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        let url = self.url(path)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| LoadError::Http { path: url.to_string(), source })?;

        if !response.status().is_success() {
            return Err(LoadError::Status {
                path: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| LoadError::Http { path: url.to_string(), source })?;
        Ok(body.to_vec())
    }

    fn locate(&self, path: &str) -> String {
        self.url(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| path.to_string())
    }
}

/// Picks the HTTP source for `http(s)://` roots and the filesystem otherwise.
pub fn open(root: &str, timeout: Duration) -> anyhow::Result<Box<dyn DataSource>> {
    if root.starts_with("http://") || root.starts_with("https://") {
        Ok(Box::new(HttpSource::new(root, timeout)?))
    } else {
        Ok(Box::new(FsSource::new(root)))
    }
}
