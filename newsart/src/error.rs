use std::path::PathBuf;

/// Failure modes of a generation run.
///
/// Setup failures (`Upstream` while fetching headlines or listing pipelines, `NoPipelines`)
/// end the run. Everything raised while handling a single headline only skips that headline.
/// Missing credentials never reach this type: the run is skipped before it starts.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage} failed: {source:#}")]
    Upstream {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("image service returned no pipelines")]
    NoPipelines,

    #[error("generation job {job_id} failed")]
    GenerationFailed { job_id: String },

    #[error("generation job {job_id} still pending after {attempts} status checks")]
    PollTimeout { job_id: String, attempts: u32 },

    #[error("failed to write image into {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn upstream(stage: &'static str, source: anyhow::Error) -> Self {
        PipelineError::Upstream { stage, source }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
