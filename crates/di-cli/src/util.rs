use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use di_core::{ChangeSet, ProjectFile};
use di_review::{split_diff, ArchiveExtractor, DirectorySource, GeminiGateway, ReviewService};
use di_store::config::redis_url_from_parts;
use di_store::{EphemeralStore, StoreConfig};
use tracing::debug;

use crate::Settings;

impl Settings {
    fn store_config(&self) -> StoreConfig {
        StoreConfig::resolve(
            self.rest_url.clone(),
            self.rest_token.clone(),
            self.redis_url.clone().or_else(redis_url_from_parts),
            Duration::from_millis(self.store_timeout_ms),
        )
    }

    pub async fn store(&self) -> Arc<dyn EphemeralStore> {
        di_store::connect(&self.store_config()).await
    }

    pub fn extractor(&self) -> ArchiveExtractor {
        ArchiveExtractor::new(self.max_archive_bytes)
    }

    pub async fn review_service(&self) -> Result<ReviewService> {
        let Some(api_key) = self.api_key.clone().filter(|k| !k.trim().is_empty()) else {
            bail!("GOOGLE_API_KEY is not set (pass --api-key or export it)");
        };
        let gateway = GeminiGateway::new(api_key, Some(self.model.clone()))
            .context("failed to set up the analysis gateway")?;
        debug!(model = gateway.model(), "analysis gateway configured");
        Ok(ReviewService::new(
            self.store().await,
            Arc::new(gateway),
            Duration::from_secs(self.gateway_timeout_secs),
        ))
    }
}

/// Read every reviewable file under `dir`.
pub fn load_project(extractor: &ArchiveExtractor, dir: &Path) -> Result<Vec<ProjectFile>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    extractor
        .extract(&DirectorySource::new(dir))
        .with_context(|| format!("failed to read project at {}", dir.display()))
}

/// A `.diff`/`.patch` file is split per file; a directory becomes a set of
/// changed files; any other file is taken as a single changed file.
pub fn load_changes(extractor: &ArchiveExtractor, path: &Path) -> Result<ChangeSet> {
    if path.is_dir() {
        let files = extractor
            .extract(&DirectorySource::new(path))
            .with_context(|| format!("failed to read changes at {}", path.display()))?;
        return Ok(ChangeSet::from_files(files));
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if is_diff_file(path) {
        let records = split_diff(&text);
        if records.is_empty() {
            bail!("{} does not contain any file diffs", path.display());
        }
        return Ok(ChangeSet::from_diff(records));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ChangeSet::from_files(vec![ProjectFile::new(name, text)]))
}

fn is_diff_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("diff") | Some("patch")
    )
}
