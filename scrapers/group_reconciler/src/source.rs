use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

use crate::config::ScrapingConfig;
use crate::error::{ImportError, SourceError};
use crate::results::{ResultImportRequest, ResultImporter};
use crate::snapshot::{ExternalSnapshot, RawSnapshot};
use crate::types::CompetitionGroup;

/// Scraping collaborator: produces one raw snapshot per competition group.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, group: &CompetitionGroup) -> Result<RawSnapshot, SourceError>;
}

fn http_client(config: &ScrapingConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
}

pub struct HttpSnapshotSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSnapshotSource {
    pub fn new(config: &ScrapingConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self, group: &CompetitionGroup) -> Result<RawSnapshot, SourceError> {
        let url = format!("{}/groups/snapshot", self.base_url);
        info!("Fetching snapshot for {} from {}", group, url);
        let snapshot = self
            .client
            .get(&url)
            .query(&[
                ("category", group.category.as_str()),
                ("league", group.league.as_str()),
                ("groupName", group.group_name.as_str()),
                ("season", group.season.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<RawSnapshot>()
            .await?;
        debug!(
            "Snapshot for {} has {} teams and {} fixtures",
            group,
            snapshot.teams.len(),
            snapshot.fixtures.len()
        );
        Ok(snapshot)
    }
}

/// Reads `<dir>/<season>/<league>/<group>.json`, the layout `fetch` writes.
pub struct FileSnapshotSource {
    dir: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, group: &CompetitionGroup) -> PathBuf {
        let part = |s: &str| s.replace(['/', '\\'], "_");
        self.dir
            .join(part(&group.season))
            .join(part(&group.league))
            .join(format!("{}.json", part(&group.group_name)))
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn fetch(&self, group: &CompetitionGroup) -> Result<RawSnapshot, SourceError> {
        let path = self.path_for(group);
        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

pub async fn load_snapshot_file(path: &Path) -> Result<ExternalSnapshot, SourceError> {
    let content = fs::read_to_string(path).await?;
    let raw: RawSnapshot = serde_json::from_str(&content)?;
    Ok(ExternalSnapshot::try_from(raw)?)
}

/// All `.json` files below `dir`, sorted by path.
pub async fn snapshot_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    imported: u32,
}

/// Asks the scraping service to pull and store the rubbers of a fixture.
pub struct HttpResultImporter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpResultImporter {
    pub fn new(config: &ScrapingConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ResultImporter for HttpResultImporter {
    async fn import(&self, request: &ResultImportRequest) -> Result<u32, ImportError> {
        let url = format!("{}/results/import", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ImportError::ReportNotFound(request.result_id.clone()));
        }
        let body = response.error_for_status()?.json::<ImportResponse>().await?;
        debug!(
            "Imported {} rubbers for fixture {} from report {}",
            body.imported, request.fixture_id, request.result_id
        );
        Ok(body.imported)
    }
}
