//! `genweb generate`: run one generation and stream the page to stdout.

use genweb_config::{AgentDirectory, AppConfig};
use genweb_core::{ExtractionOutcome, GenerationRequest, HtmlBlockExtractor, compose};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

pub async fn run(
    config: AppConfig,
    agent: &str,
    query: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  WARNING: No API key configured.");
        eprintln!("  Set GEMINI_API_KEY (or GENWEB_API_KEY), or add api_key to:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
    }

    let directory = AgentDirectory::load(&config.gateway.agents_file).await?;
    let agent_config = directory
        .lookup(agent)
        .ok_or_else(|| format!("Agent not found: {agent}"))?;

    let router = genweb_providers::router::build_from_config(&config);
    let provider = router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not available", config.default_provider))?;

    let request = GenerationRequest::new(config.active_model(), compose(agent_config, query))
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens);

    let mut stream = provider.stream(request).await?;
    info!(run_id = %stream.run_id, provider = %provider.name(), "Generation started");

    let mut extractor = HtmlBlockExtractor::new();
    let mut stdout = tokio::io::stdout();

    while let Some(fragment) = stream.fragments.recv().await {
        if let Some(html) = extractor.push(&fragment?) {
            stdout.write_all(html.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    if let Some(rest) = extractor.finish() {
        stdout.write_all(rest.as_bytes()).await?;
    }
    stdout.flush().await?;

    match extractor.outcome() {
        Some(ExtractionOutcome::Complete) | None => {}
        Some(ExtractionOutcome::Unterminated) => {
            warn!("Model output ended inside the HTML block, page may be incomplete")
        }
        Some(ExtractionOutcome::NoBlock) => {
            return Err("Model output contained no ```html block".into());
        }
    }

    Ok(())
}
