use anyhow::Result;
use common::{Config, Credentials};
use tracing::{error, info};

use crate::images::fusion_brain::FusionBrainClient;
use crate::llm::remote::RemoteLlmProvider;
use crate::news::NewsApiClient;
use crate::pipeline::{Orchestrator, RunReport, RunSettings};
use crate::storage::ImageStore;

/// Build the HTTP clients from `config` and run one generation pass.
///
/// Credentials are resolved through `lookup` first. If any is missing the run is skipped
/// before a single client is built: `Ok(None)` and an error log line, not a failure.
pub async fn run_generation<F>(config: &Config, lookup: F) -> Result<Option<RunReport>>
where
    F: Fn(&str) -> Option<String>,
{
    let creds = match Credentials::resolve(config, lookup) {
        Ok(creds) => creds,
        Err(missing) => {
            error!(%missing, "generation run skipped");
            return Ok(None);
        }
    };

    let news = NewsApiClient::new(
        &config.news.api_url,
        &creds.news_api_key,
        config.news.timeout_seconds,
    )?;

    let llm = RemoteLlmProvider::new(&config.llm.api_url, &creds.llm_api_key, &config.llm.model)
        .with_defaults(config.llm.timeout_seconds, config.llm.max_tokens, 0.7);
    info!(model = llm.model(), "LLM provider initialized");

    let images = FusionBrainClient::new(
        &config.images.api_url,
        &creds.image_api_key,
        &creds.image_secret_key,
        config.images.timeout_seconds,
    )?
    .with_size(config.images.width, config.images.height);

    let store = ImageStore::new(&config.images.output_dir);
    let settings = RunSettings::from_config(config);

    let report = Orchestrator::new(&settings, &news, &llm, &images, &store)
        .run()
        .await?;
    Ok(Some(report))
}
