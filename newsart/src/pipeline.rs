//! End-to-end generation run: headlines -> summaries -> generated images on disk.
//!
//! One run fetches a batch of headlines, picks the first image pipeline offered by the
//! service, then handles each headline fully before moving to the next. Setup failures end
//! the run; anything going wrong for a single headline is logged and that headline skipped.

use std::path::PathBuf;
use std::time::Duration;

use common::Config;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::images::{GenerationJob, ImageGenerator, JobStatus};
use crate::llm::LlmProvider;
use crate::news::HeadlineSource;
use crate::storage::ImageStore;

/// Run parameters, built once at startup.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub category: String,
    pub language: String,
    pub page_size: u32,
    pub word_limit: u32,
    pub style: Option<String>,
    pub poll_interval: Duration,
    /// Status checks allowed per job; at least one is always made.
    pub max_poll_attempts: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            category: config.news.category.clone(),
            language: config.news.language.clone(),
            page_size: config.news.page_size,
            word_limit: config.llm.word_limit,
            style: Some(config.images.style.clone()).filter(|s| !s.is_empty()),
            poll_interval: Duration::from_secs(config.images.poll_interval_seconds),
            max_poll_attempts: config.images.max_poll_attempts,
        }
    }
}

/// What a run did, for the closing log line and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub headlines: usize,
    pub skipped_empty: usize,
    pub generated: Vec<PathBuf>,
    pub failed: usize,
}

/// Drives one generation run over injected clients.
pub struct Orchestrator<'a> {
    settings: &'a RunSettings,
    headlines: &'a dyn HeadlineSource,
    summarizer: &'a dyn LlmProvider,
    images: &'a dyn ImageGenerator,
    store: &'a ImageStore,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        settings: &'a RunSettings,
        headlines: &'a dyn HeadlineSource,
        summarizer: &'a dyn LlmProvider,
        images: &'a dyn ImageGenerator,
        store: &'a ImageStore,
    ) -> Self {
        Self {
            settings,
            headlines,
            summarizer,
            images,
            store,
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let s = self.settings;
        let headlines = self
            .headlines
            .fetch_top_headlines(&s.category, &s.language, s.page_size)
            .await
            .map_err(|e| PipelineError::upstream("headline fetch", e))?;

        let pipeline_id = self.select_pipeline().await?;
        info!(pipeline_id = %pipeline_id, headlines = headlines.len(), "starting generation run");

        let mut report = RunReport {
            headlines: headlines.len(),
            ..RunReport::default()
        };

        for (index, headline) in headlines.iter().enumerate() {
            let Some(text) = headline.text() else {
                debug!(index, "headline has no text, skipping");
                report.skipped_empty += 1;
                continue;
            };

            match self.illustrate(&pipeline_id, text).await {
                Ok(path) => report.generated.push(path),
                Err(e) => {
                    warn!(index, title = %headline.title, error = %e, "headline skipped");
                    report.failed += 1;
                }
            }
        }

        info!(
            headlines = report.headlines,
            generated = report.generated.len(),
            failed = report.failed,
            skipped_empty = report.skipped_empty,
            "generation run finished"
        );
        Ok(report)
    }

    /// First pipeline the service lists.
    pub async fn select_pipeline(&self) -> Result<String> {
        let pipelines = self
            .images
            .list_pipelines()
            .await
            .map_err(|e| PipelineError::upstream("pipeline listing", e))?;

        pipelines
            .into_iter()
            .next()
            .map(|p| p.id)
            .ok_or(PipelineError::NoPipelines)
    }

    /// Summarize, generate, wait, download and store one headline's image.
    async fn illustrate(&self, pipeline_id: &str, text: &str) -> Result<PathBuf> {
        let summary = self
            .summarizer
            .summarize(text, self.settings.word_limit)
            .await
            .map_err(|e| PipelineError::upstream("summarization", e))?;
        debug!(tokens = summary.usage.total_tokens, summary = %summary.text, "headline summarized");

        let job = self
            .images
            .submit_generation(pipeline_id, &summary.text, self.settings.style.as_deref())
            .await
            .map_err(|e| PipelineError::upstream("generation submit", e))?;

        let url = self.await_job(job).await?;

        let bytes = self
            .images
            .download(&url)
            .await
            .map_err(|e| PipelineError::upstream("image download", e))?;

        self.store
            .persist(&bytes)
            .await
            .map_err(|source| PipelineError::Storage {
                path: self.store.dir().to_path_buf(),
                source,
            })
    }

    /// Poll until the job finishes, sleeping `poll_interval` between checks.
    /// Returns the result image URL.
    pub async fn await_job(&self, job: GenerationJob) -> Result<String> {
        let max_attempts = self.settings.max_poll_attempts.max(1);
        let mut job = job;
        let mut attempts = 0;

        loop {
            job = self
                .images
                .poll_status(&job)
                .await
                .map_err(|e| PipelineError::upstream("status check", e))?;
            attempts += 1;

            match job.status {
                JobStatus::Done => {
                    return job.result_image_url.ok_or(PipelineError::GenerationFailed {
                        job_id: job.job_id,
                    });
                }
                JobStatus::Fail => {
                    return Err(PipelineError::GenerationFailed { job_id: job.job_id });
                }
                JobStatus::Pending => {}
            }

            if attempts >= max_attempts {
                return Err(PipelineError::PollTimeout {
                    job_id: job.job_id,
                    attempts,
                });
            }

            debug!(job_id = %job.job_id, attempts, "job pending");
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}
