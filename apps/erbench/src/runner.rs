//! # Comparison Runner
//!
//! Fans out one task per model, evaluates each successful candidate against
//! the shared ground truth, and hands results back in completion order.
//!
//! ```text
//!  models ──► [task per model] ──► source.produce() ──► spawn_blocking(evaluate)
//!                 │ (semaphore: max_concurrency)                    │
//!                 └──────────────── mpsc::Receiver<ModelResult> ◄───┘
//! ```
//!
//! The evaluator itself stays pure; the runner owns all scheduling.

use crate::config::RunnerConfig;
use crate::source::{ClusterOutcome, ClusterSource};
use erbench_core::{Evaluator, MetricsReport, Partition, Universe};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

/// One line of comparison output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelResult {
    Completed {
        model: String,
        clusters: Partition,
        metrics: MetricsReport,
    },
    Failed {
        model: String,
        error: String,
    },
}

impl ModelResult {
    pub fn model(&self) -> &str {
        match self {
            Self::Completed { model, .. } | Self::Failed { model, .. } => model,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Serialize as a single JSON line, newline included.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Everything a comparison needs, shared by all of its tasks.
pub struct Comparison<S> {
    source: Arc<S>,
    ground_truth: Arc<Partition>,
    universe: Option<Arc<Universe>>,
    evaluator: Evaluator,
    config: RunnerConfig,
}

impl<S: ClusterSource> Comparison<S> {
    pub fn new(source: S, ground_truth: Partition, universe: Option<Universe>) -> Self {
        Self {
            source: Arc::new(source),
            ground_truth: Arc::new(ground_truth),
            universe: universe.map(Arc::new),
            evaluator: Evaluator::new(),
            config: RunnerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn ground_truth(&self) -> &Partition {
        &self.ground_truth
    }

    /// Start one task per model; results arrive as each one completes.
    ///
    /// Must be called inside a tokio runtime. The channel closes once every
    /// model has reported.
    pub fn run(&self, models: Vec<String>) -> mpsc::Receiver<ModelResult> {
        let (tx, rx) = mpsc::channel(models.len().max(1));
        let permits = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));

        info!(
            models = models.len(),
            source = self.source.kind(),
            max_concurrency = self.config.max_concurrency,
            "starting comparison"
        );

        for model in models {
            let tx = tx.clone();
            let permits = Arc::clone(&permits);
            let source = Arc::clone(&self.source);
            let ground_truth = Arc::clone(&self.ground_truth);
            let universe = self.universe.clone();
            let evaluator = self.evaluator;

            tokio::spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => {
                        let outcome = source.produce(&model).await;
                        score(outcome, ground_truth, universe, evaluator).await
                    }
                    Err(e) => ModelResult::Failed {
                        model,
                        error: e.to_string(),
                    },
                };

                if tx.send(result).await.is_err() {
                    debug!("comparison receiver dropped; discarding result");
                }
            });
        }

        rx
    }

    /// Run and wait for every model, in completion order.
    pub async fn run_to_completion(&self, models: Vec<String>) -> Vec<ModelResult> {
        let mut rx = self.run(models);
        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results
    }
}

/// Evaluate one outcome on the blocking pool.
async fn score(
    outcome: ClusterOutcome,
    ground_truth: Arc<Partition>,
    universe: Option<Arc<Universe>>,
    evaluator: Evaluator,
) -> ModelResult {
    match outcome {
        ClusterOutcome::FinalClusters { model, clusters } => {
            let name = model.clone();
            let evaluated = tokio::task::spawn_blocking(move || {
                let metrics = evaluator.evaluate(&ground_truth, &clusters, universe.as_deref());
                ModelResult::Completed {
                    model,
                    clusters,
                    metrics,
                }
            })
            .await;

            match evaluated {
                Ok(result) => {
                    if let ModelResult::Completed { metrics, .. } = &result {
                        info!(
                            model = %name,
                            pairwise_f1 = metrics.pairwise.f1,
                            v_measure = metrics.v_measure,
                            "model evaluated"
                        );
                    }
                    result
                }
                Err(e) => {
                    warn!(model = %name, error = %e, "evaluation task failed");
                    ModelResult::Failed {
                        model: name,
                        error: e.to_string(),
                    }
                }
            }
        }
        ClusterOutcome::Error { model, error } => {
            warn!(model = %model, error = %error, "clustering failed");
            ModelResult::Failed { model, error }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
