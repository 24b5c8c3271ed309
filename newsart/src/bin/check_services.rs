// Manual connectivity check against the configured services.
// Fetches headlines, summarizes the first usable one and lists image pipelines.
// Submits no generation job, so it costs no image credits.

use common::{Config, Credentials};
use newsart::images::fusion_brain::FusionBrainClient;
use newsart::images::ImageGenerator;
use newsart::llm::remote::RemoteLlmProvider;
use newsart::llm::LlmProvider;
use newsart::news::{HeadlineSource, NewsApiClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let _ = dotenvy::dotenv();
    let config = Config::load_with_defaults(
        Some(std::path::Path::new("config.default.toml")),
        Some(std::path::Path::new("config.toml")),
    )
    .await?;
    let creds = Credentials::from_env(&config)?;

    println!("\n{}", "=".repeat(60));
    println!("Checking services");
    println!("News:   {}", config.news.api_url);
    println!("LLM:    {} ({})", config.llm.api_url, config.llm.model);
    println!("Images: {}", config.images.api_url);
    println!("{}", "=".repeat(60));

    println!("\n[1/3] Fetching headlines...");
    let news = NewsApiClient::new(&config.news.api_url, &creds.news_api_key, config.news.timeout_seconds)?;
    let headlines = match news
        .fetch_top_headlines(&config.news.category, &config.news.language, config.news.page_size)
        .await
    {
        Ok(h) => {
            println!("✓ {} headlines", h.len());
            for (i, headline) in h.iter().take(3).enumerate() {
                println!("    {}. {}", i + 1, headline.title);
            }
            h
        }
        Err(e) => {
            eprintln!("✗ Failed: {:#}", e);
            Vec::new()
        }
    };

    println!("\n[2/3] Summarizing first headline...");
    match headlines.iter().find_map(|h| h.text()) {
        Some(text) => {
            let llm = RemoteLlmProvider::new(&config.llm.api_url, &creds.llm_api_key, &config.llm.model)
                .with_defaults(config.llm.timeout_seconds, config.llm.max_tokens, 0.7);
            match llm.summarize(text, config.llm.word_limit).await {
                Ok(summary) => {
                    println!("✓ {}", summary.text);
                    println!("  Tokens: {}", summary.usage.total_tokens);
                }
                Err(e) => eprintln!("✗ Failed: {:#}", e),
            }
        }
        None => println!("- skipped (no headline text)"),
    }

    println!("\n[3/3] Listing image pipelines...");
    let images = FusionBrainClient::new(
        &config.images.api_url,
        &creds.image_api_key,
        &creds.image_secret_key,
        config.images.timeout_seconds,
    )?;
    match images.list_pipelines().await {
        Ok(pipelines) => {
            println!("✓ {} pipelines", pipelines.len());
            for p in &pipelines {
                println!("    {} {}", p.id, p.name.as_deref().unwrap_or(""));
            }
        }
        Err(e) => eprintln!("✗ Failed: {:#}", e),
    }

    println!("\n{}", "=".repeat(60));
    Ok(())
}
