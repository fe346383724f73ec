//! # Cluster Sources
//!
//! Producers of candidate partitions, one call per named model.
//!
//! A source never fails loudly: every fault (missing file, bad JSON,
//! unreachable service) comes back as [`ClusterOutcome::Error`] so the runner
//! can report it next to the model name and carry on with the others.

use crate::loader::parse_partition;
use erbench_core::Partition;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result of asking a source for one model's clusters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClusterOutcome {
    FinalClusters { model: String, clusters: Partition },
    Error { model: String, error: String },
}

impl ClusterOutcome {
    /// Name of the model this outcome belongs to.
    pub fn model(&self) -> &str {
        match self {
            Self::FinalClusters { model, .. } | Self::Error { model, .. } => model,
        }
    }

    fn error(model: &str, error: impl ToString) -> Self {
        Self::Error {
            model: model.to_string(),
            error: error.to_string(),
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Anything that can produce a candidate partition for a model name.
pub trait ClusterSource: Send + Sync + 'static {
    /// Short name for logs.
    fn kind(&self) -> &'static str;

    /// Produce clusters for `model`.
    fn produce(&self, model: &str) -> impl Future<Output = ClusterOutcome> + Send;
}

// =============================================================================
// DIRECTORY SOURCE
// =============================================================================

/// Pre-computed candidate partitions stored as `<dir>/<model>.json`.
///
/// Model names like `anthropic:claude` are mapped to file names by replacing
/// `:` and `/` with `_`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File that holds the clusters for `model`.
    pub fn path_for(&self, model: &str) -> PathBuf {
        let file: String = model
            .chars()
            .map(|c| if matches!(c, ':' | '/' | '\\') { '_' } else { c })
            .collect();
        self.dir.join(format!("{file}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ClusterSource for DirectorySource {
    fn kind(&self) -> &'static str {
        "directory"
    }

    async fn produce(&self, model: &str) -> ClusterOutcome {
        let path = self.path_for(model);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                return ClusterOutcome::error(model, format!("{}: {}", path.display(), e));
            }
        };
        match parse_partition(&text) {
            Ok(clusters) => ClusterOutcome::FinalClusters {
                model: model.to_string(),
                clusters,
            },
            Err(e) => ClusterOutcome::error(model, format!("{}: {}", path.display(), e)),
        }
    }
}

// =============================================================================
// HTTP SOURCE
// =============================================================================

/// Request sent to an external clustering service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRequest {
    pub model: String,
    /// Raw dataset text, when the service expects the records inline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<String>,
}

/// Response expected from an external clustering service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResponse {
    pub clusters: Partition,
}

/// An external, model-backed clustering service reached over HTTP.
///
/// `POST <endpoint>` with a [`ClusterRequest`]; expects a [`ClusterResponse`].
#[derive(Debug, Clone)]
pub struct HttpSource {
    endpoint: String,
    records: Option<Arc<str>>,
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a source with the given request timeout.
    ///
    /// Fails when the HTTP client cannot be built (for example when no TLS
    /// backend is available).
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            records: None,
            client,
        })
    }

    /// Send `records` along with every request.
    #[must_use]
    pub fn with_records(mut self, records: impl Into<Arc<str>>) -> Self {
        self.records = Some(records.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, model: &str) -> Result<Partition, reqwest::Error> {
        let body = ClusterRequest {
            model: model.to_string(),
            records: self.records.as_deref().map(str::to_string),
        };
        let response: ClusterResponse = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.clusters)
    }
}

impl ClusterSource for HttpSource {
    fn kind(&self) -> &'static str {
        "http"
    }

    async fn produce(&self, model: &str) -> ClusterOutcome {
        match self.request(model).await {
            Ok(clusters) => ClusterOutcome::FinalClusters {
                model: model.to_string(),
                clusters,
            },
            Err(e) => ClusterOutcome::error(model, e),
        }
    }
}

// =============================================================================
// CONFIGURED SOURCE
// =============================================================================

/// The source selected at startup.
#[derive(Debug, Clone)]
pub enum AnySource {
    Directory(DirectorySource),
    Http(HttpSource),
}

impl ClusterSource for AnySource {
    fn kind(&self) -> &'static str {
        match self {
            Self::Directory(source) => source.kind(),
            Self::Http(source) => source.kind(),
        }
    }

    async fn produce(&self, model: &str) -> ClusterOutcome {
        match self {
            Self::Directory(source) => source.produce(model).await,
            Self::Http(source) => source.produce(model).await,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_map_to_safe_file_names() {
        let source = DirectorySource::new("/data/candidates");
        assert_eq!(
            source.path_for("anthropic:claude-3/haiku"),
            PathBuf::from("/data/candidates/anthropic_claude-3_haiku.json")
        );
    }

    #[test]
    fn outcome_serializes_with_type_tag() {
        let outcome = ClusterOutcome::error("m", "boom");
        let json = serde_json::to_string(&outcome).unwrap_or_default();
        assert_eq!(json, r#"{"type":"error","model":"m","error":"boom"}"#);
        assert_eq!(outcome.model(), "m");
    }

    #[test]
    fn http_source_keeps_endpoint() {
        let source = HttpSource::new("http://localhost:9000/cluster", Duration::from_secs(5));
        assert_eq!(
            source.as_ref().map(HttpSource::endpoint).ok(),
            Some("http://localhost:9000/cluster")
        );
    }

    #[test]
    fn request_omits_missing_records() {
        let request = ClusterRequest {
            model: "m".to_string(),
            records: None,
        };
        let json = serde_json::to_string(&request).unwrap_or_default();
        assert_eq!(json, r#"{"model":"m"}"#);
    }
}
