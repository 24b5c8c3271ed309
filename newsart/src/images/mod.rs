use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod fusion_brain;

/// Style sent when the caller does not pick one.
pub const DEFAULT_STYLE: &str = "PHOTO";

/// A generation model/configuration offered by the image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Identifiers arrive as strings or integers depending on the service version.
pub(crate) fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected id: {}", other))),
    }
}

/// Job lifecycle as reported by the status endpoint.
///
/// The service reports intermediate states under several names (`INITIAL`, `PROCESSING`,
/// `PENDING`); all of them are treated as pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Done,
    Fail,
    #[serde(other)]
    Pending,
}

/// One submitted generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub pipeline_id: String,
    pub job_id: String,
    pub status: JobStatus,
    pub result_image_url: Option<String>,
}

impl GenerationJob {
    pub fn pending(pipeline_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            job_id: job_id.into(),
            status: JobStatus::Pending,
            result_image_url: None,
        }
    }
}

/// Client for a text-to-image service with asynchronous jobs.
///
/// `poll_status` performs exactly one status check; looping and pacing belong to the caller.
#[async_trait::async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn list_pipelines(&self) -> Result<Vec<Pipeline>>;

    /// Submit `prompt` to `pipeline_id`. `style` falls back to [`DEFAULT_STYLE`].
    async fn submit_generation(
        &self,
        pipeline_id: &str,
        prompt: &str,
        style: Option<&str>,
    ) -> Result<GenerationJob>;

    async fn poll_status(&self, job: &GenerationJob) -> Result<GenerationJob>;

    /// Fetch the raw bytes of a finished image.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
