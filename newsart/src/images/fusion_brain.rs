use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{id_string, GenerationJob, ImageGenerator, JobStatus, Pipeline, DEFAULT_STYLE};

const API_PREFIX: &str = "key/api/v1/";

/// Client for the Fusion Brain text-to-image API.
///
/// Every call carries `X-Key: Key <api key>` and `X-Secret: Secret <secret key>`.
pub struct FusionBrainClient {
    base_url: Url,
    width: u32,
    height: u32,
    client: Client,
    // Result URLs point at other hosts; this one carries no service credentials.
    download_client: Client,
}

impl FusionBrainClient {
    pub fn new(base_url: &str, api_key: &str, secret_key: &str, timeout_secs: u64) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends with '/'
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)
        } else {
            Url::parse(&format!("{}/", base_url))
        }
        .with_context(|| format!("invalid image service URL: {}", base_url))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Key",
            HeaderValue::from_str(&format!("Key {}", api_key)).context("invalid image API key")?,
        );
        headers.insert(
            "X-Secret",
            HeaderValue::from_str(&format!("Secret {}", secret_key))
                .context("invalid image secret key")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Newsart/0.1.0")
            .default_headers(headers)
            .build()
            .context("failed to build reqwest client")?;

        let download_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Newsart/0.1.0")
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            base_url,
            width: 1024,
            height: 1024,
            client,
            download_client,
        })
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(API_PREFIX)
            .and_then(|u| u.join(path))
            .with_context(|| format!("failed to build image service URL for {}", path))
    }
}

/// Turn non-2xx responses into errors carrying the status and body.
async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{} failed with status {}: {}", what, status, body)
}

#[async_trait::async_trait]
impl ImageGenerator for FusionBrainClient {
    async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        let response = self
            .client
            .get(self.endpoint("pipelines")?)
            .send()
            .await
            .context("pipeline listing request failed")?;
        let response = ensure_success(response, "pipeline listing").await?;

        let body: PipelinesResponse = response
            .json()
            .await
            .context("failed to parse pipeline listing")?;

        info!(count = body.pipelines.len(), "image pipelines listed");
        Ok(body.pipelines)
    }

    async fn submit_generation(
        &self,
        pipeline_id: &str,
        prompt: &str,
        style: Option<&str>,
    ) -> Result<GenerationJob> {
        let params = GenerateParams {
            kind: "GENERATE",
            num_images: 1,
            width: self.width,
            height: self.height,
            generate_params: QueryParams {
                query: prompt,
                style: style.unwrap_or(DEFAULT_STYLE),
            },
        };

        let response = self
            .client
            .post(self.endpoint(&format!("pipeline/{}/run", pipeline_id))?)
            .json(&params)
            .send()
            .await
            .context("generation submit request failed")?;
        let response = ensure_success(response, "generation submit").await?;

        let body: RunResponse = response
            .json()
            .await
            .context("failed to parse generation submit response")?;

        info!(pipeline_id, job_id = %body.id, "generation job submitted");
        Ok(GenerationJob::pending(pipeline_id, body.id))
    }

    async fn poll_status(&self, job: &GenerationJob) -> Result<GenerationJob> {
        let response = self
            .client
            .get(self.endpoint(&format!("pipeline/status/{}", job.job_id))?)
            .send()
            .await
            .context("status request failed")?;
        let response = ensure_success(response, "status check").await?;

        let body: StatusResponse = response
            .json()
            .await
            .context("failed to parse status response")?;

        debug!(job_id = %job.job_id, status = ?body.status, "job status");

        let result_image_url = body
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|r| r.image)
            .filter(|url| !url.is_empty());

        Ok(GenerationJob {
            pipeline_id: job.pipeline_id.clone(),
            job_id: job.job_id.clone(),
            status: body.status,
            result_image_url,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .with_context(|| format!("image download failed: {}", url))?;
        let response = ensure_success(response, "image download").await?;

        let bytes = response.bytes().await.context("failed to read image body")?;
        Ok(bytes.to_vec())
    }
}

// Wire structures
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateParams<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    num_images: u32,
    width: u32,
    height: u32,
    generate_params: QueryParams<'a>,
}

#[derive(Debug, Serialize)]
struct QueryParams<'a> {
    query: &'a str,
    style: &'a str,
}

#[derive(Debug, Deserialize)]
struct PipelinesResponse {
    #[serde(default)]
    pipelines: Vec<Pipeline>,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    #[serde(deserialize_with = "id_string")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: JobStatus,
    #[serde(default)]
    result: Option<Vec<ResultImage>>,
}

#[derive(Debug, Deserialize)]
struct ResultImage {
    image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_joined_under_api_prefix() {
        let client = FusionBrainClient::new("https://api-key.fusionbrain.ai", "k", "s", 5).unwrap();
        assert_eq!(
            client.endpoint("pipelines").unwrap().as_str(),
            "https://api-key.fusionbrain.ai/key/api/v1/pipelines"
        );
        assert_eq!(
            client.endpoint("pipeline/status/abc").unwrap().as_str(),
            "https://api-key.fusionbrain.ai/key/api/v1/pipeline/status/abc"
        );
    }

    #[test]
    fn generate_body_matches_wire_shape() {
        let params = GenerateParams {
            kind: "GENERATE",
            num_images: 1,
            width: 1024,
            height: 1024,
            generate_params: QueryParams {
                query: "a harbour at dawn",
                style: DEFAULT_STYLE,
            },
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "GENERATE",
                "numImages": 1,
                "width": 1024,
                "height": 1024,
                "generateParams": {"query": "a harbour at dawn", "style": "PHOTO"}
            })
        );
    }
}
