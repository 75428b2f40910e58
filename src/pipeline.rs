//! Pipeline entrypoint: crawl, normalize and sync in one run
//!
//! A run opens the normalized store, records itself in the `runs` table and executes its
//! stages in order. A failing stage is logged and closes the run as failed; the stages after it
//! are skipped. Nothing escapes [`Pipeline::run_once`] as an error, so a scheduler can call it
//! repeatedly without supervising it.

use crate::config::{load_config_with_hash, Config};
use crate::crawler::run_crawl;
use crate::normalize::{run_normalize, NormalizePolicy, Normalizer};
use crate::renderer::{Renderer, StaticRenderer};
use crate::state::{RunContext, StageTally};
use crate::storage::{open_store, Ledger, NormalizedStore, RunStatus, RunTallies, SqliteStore};
use crate::sync::{run_sync, SyncDispatcher};
use crate::{CarfeedError, Result};
use std::fmt;
use std::path::Path;

/// One stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Stage {
    Crawl,
    Normalize,
    Sync,
}

impl Stage {
    /// Every stage, in execution order
    pub const ALL: [Stage; 3] = [Stage::Crawl, Stage::Normalize, Stage::Sync];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Crawl => "crawl",
            Self::Normalize => "normalize",
            Self::Sync => "sync",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Row id in the `runs` table; None when the store could not be opened
    pub run_id: Option<i64>,
    pub status: RunStatus,
    pub tallies: RunTallies,
    /// Stages that ran to completion
    pub completed: Vec<Stage>,
    pub failed_stage: Option<Stage>,
    pub error: Option<String>,
}

impl RunReport {
    fn new(run_id: Option<i64>) -> Self {
        Self {
            run_id,
            status: RunStatus::Running,
            tallies: RunTallies::default(),
            completed: Vec::new(),
            failed_stage: None,
            error: None,
        }
    }

    fn failed(error: &CarfeedError) -> Self {
        Self {
            status: RunStatus::Failed,
            error: Some(error.to_string()),
            ..Self::new(None)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Tally recorded for `stage`; all zero when it did not run
    pub fn tally(&self, stage: Stage) -> StageTally {
        match stage {
            Stage::Crawl => self.tallies.crawl,
            Stage::Normalize => self.tallies.normalize,
            Stage::Sync => self.tallies.sync,
        }
    }

    fn set_tally(&mut self, stage: Stage, tally: StageTally) {
        match stage {
            Stage::Crawl => self.tallies.crawl = tally,
            Stage::Normalize => self.tallies.normalize = tally,
            Stage::Sync => self.tallies.sync = tally,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.run_id {
            Some(id) => write!(f, "Run {} {}", id, self.status.to_db_string())?,
            None => write!(f, "Run {}", self.status.to_db_string())?,
        }
        for stage in &self.completed {
            write!(f, "; {}: {}", stage, self.tally(*stage))?;
        }
        if let Some(stage) = self.failed_stage {
            write!(f, "; {} failed", stage)?;
        }
        if let Some(error) = &self.error {
            write!(f, " ({})", error)?;
        }
        Ok(())
    }
}

/// A configured pipeline owning its renderer session
pub struct Pipeline {
    config: Config,
    config_hash: String,
    renderer: Box<dyn Renderer>,
}

impl Pipeline {
    /// Creates a pipeline backed by a [`StaticRenderer`]
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `config_hash` - Hash of the configuration file, recorded with every run
    pub fn new(config: Config, config_hash: impl Into<String>) -> Result<Self> {
        let renderer = StaticRenderer::new(&config.renderer)?;
        Ok(Self::with_renderer(config, config_hash, Box::new(renderer)))
    }

    /// Creates a pipeline driving the given renderer session
    pub fn with_renderer(
        config: Config,
        config_hash: impl Into<String>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            config,
            config_hash: config_hash.into(),
            renderer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs crawl, normalize and sync once
    pub async fn run_once(&mut self) -> RunReport {
        self.run_stages(&Stage::ALL).await
    }

    /// Runs the given stages in order, stopping at the first failure
    pub async fn run_stages(&mut self, stages: &[Stage]) -> RunReport {
        let mut store = match open_store(Path::new(&self.config.storage.database_path)) {
            Ok(store) => store,
            Err(e) => {
                let error = CarfeedError::from(e);
                tracing::error!("Cannot open store: {}", error);
                return RunReport::failed(&error);
            }
        };

        let run_id = match store.create_run(&self.config_hash) {
            Ok(id) => id,
            Err(e) => {
                let error = CarfeedError::from(e);
                tracing::error!("Cannot record run: {}", error);
                return RunReport::failed(&error);
            }
        };

        tracing::info!(run_id, "Starting pipeline run");
        let mut report = RunReport::new(Some(run_id));

        for &stage in stages {
            tracing::info!("=== {} ===", stage);
            let outcome = run_stage(
                stage,
                self.renderer.as_mut(),
                &self.config,
                &mut store,
                run_id,
            )
            .await;

            match outcome {
                Ok(tally) => {
                    tracing::info!("{} stage: {}", stage, tally);
                    report.set_tally(stage, tally);
                    report.completed.push(stage);
                }
                Err(e) => {
                    let error = CarfeedError::Stage {
                        stage: stage.name(),
                        message: e.to_string(),
                    };
                    tracing::error!("{}", error);
                    report.failed_stage = Some(stage);
                    report.error = Some(error.to_string());
                    break;
                }
            }
        }

        report.status = if report.failed_stage.is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };

        if let Err(e) = store.finish_run(run_id, report.status, &report.tallies) {
            tracing::warn!("Failed to close run {}: {}", run_id, e);
        }

        tracing::info!("{}", report);
        report
    }
}

async fn run_stage(
    stage: Stage,
    renderer: &mut dyn Renderer,
    config: &Config,
    store: &mut SqliteStore,
    run_id: i64,
) -> Result<StageTally> {
    match stage {
        Stage::Crawl => {
            let mut ledger = Ledger::load(&config.storage.ledger_path);
            let mut ctx = RunContext::new(ledger.seen_urls());
            run_crawl(renderer, config, &mut ledger, &mut ctx).await
        }
        Stage::Normalize => {
            let ledger = Ledger::load_strict(&config.storage.ledger_path)?;
            let normalizer = Normalizer::new(NormalizePolicy::from_config(&config.normalize));
            run_normalize(&ledger, store, &normalizer, run_id)
        }
        Stage::Sync => {
            let dispatcher = SyncDispatcher::new(&config.sync)?;
            run_sync(store, &dispatcher).await
        }
    }
}

/// Loads the configuration at `config_path` and runs the whole pipeline once
///
/// Never fails: configuration, renderer and stage errors all end up in the returned report.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// # async fn scheduled() {
/// let report = carfeed::run_pipeline_once(Path::new("carfeed.toml")).await;
/// println!("{}", report);
/// # }
/// ```
pub async fn run_pipeline_once(config_path: &Path) -> RunReport {
    let (config, hash) = match load_config_with_hash(config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            let error = CarfeedError::from(e);
            tracing::error!("Failed to load configuration: {}", error);
            return RunReport::failed(&error);
        }
    };

    match Pipeline::new(config, hash) {
        Ok(mut pipeline) => pipeline.run_once().await,
        Err(e) => {
            tracing::error!("Failed to start renderer: {}", e);
            RunReport::failed(&e)
        }
    }
}
