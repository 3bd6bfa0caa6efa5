use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use hotel_rag::inference::{
    format_prompt, HuggingFaceChatClient, InferenceClient, IntentExtractor, LlmIntentExtractor,
};
use hotel_rag::HybridEngine;
use travel_config::AppConfig;
use travel_observability::{init_tracing, TracingConfig};

const USAGE: &str = "usage: hotel_rag [populate [--missing-only] | query <text>]";

enum Mode {
    Populate { force_all: bool },
    Query(String),
    Interactive,
}

fn parse_args(args: &[String]) -> Result<Mode> {
    match args.first().map(String::as_str) {
        None => Ok(Mode::Interactive),
        Some("populate") => match args.get(1).map(String::as_str) {
            None => Ok(Mode::Populate { force_all: true }),
            Some("--missing-only") => Ok(Mode::Populate { force_all: false }),
            Some(other) => anyhow::bail!("unknown populate flag `{}`\n{}", other, USAGE),
        },
        Some("query") if args.len() > 1 => Ok(Mode::Query(args[1..].join(" "))),
        Some(_) => anyhow::bail!(USAGE),
    }
}

/// Intent extraction and answer generation, built only for serving modes.
struct Assistant {
    extractor: LlmIntentExtractor,
    client: Arc<dyn InferenceClient>,
    model: String,
}

impl Assistant {
    fn new(config: &AppConfig) -> Result<Self> {
        let token = config.require_hf_token()?;
        let client: Arc<dyn InferenceClient> = Arc::new(HuggingFaceChatClient::new(token, None)?);
        Ok(Self {
            extractor: LlmIntentExtractor::new(client.clone(), config.inference_model.clone()),
            client,
            model: config.inference_model.clone(),
        })
    }

    async fn answer(&self, engine: &HybridEngine, query: &str) -> Result<String> {
        let (intent, slots) = self.extractor.extract(query).await?;
        info!(%intent, entities = %slots.summary(), "Analyzed request");

        let context = engine
            .retrieve_context(query, intent, &slots)
            .await
            .context("Retrieval failed")?;
        println!("{}", engine.format_context(&context));

        let prompt = format_prompt(query, &context.combined);
        let response = self
            .client
            .complete(&self.model, &prompt)
            .await
            .context("Answer generation failed")?;
        Ok(response)
    }
}

async fn run(mode: Mode, config: &AppConfig, engine: &HybridEngine) -> Result<()> {
    match mode {
        Mode::Populate { force_all } => {
            let report = engine.populate(force_all).await.context("Populate failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Mode::Query(query) => {
            let assistant = Assistant::new(config)?;
            let response = assistant.answer(engine, &query).await?;
            println!("Response: {}", response);
        }
        Mode::Interactive => {
            let assistant = Assistant::new(config)?;
            println!("=== Hotel RAG Travel Assistant ===\nType 'exit' to quit.");

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut stdout = tokio::io::stdout();
            loop {
                stdout.write_all(b"\nUser: ").await?;
                stdout.flush().await?;

                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let input = line.trim();
                if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                    break;
                }
                if input.is_empty() {
                    continue;
                }

                match assistant.answer(engine, input).await {
                    Ok(response) => println!("\nAssistant: {}", response),
                    Err(e) => error!("Request failed: {:#}", e),
                }
                println!("\n{}", "=".repeat(50));
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    init_tracing(TracingConfig::for_service("hotel-rag").with_verbosity(config.verbosity.level()));
    info!(
        strategy = config.index.strategy.as_str(),
        features = ?config.feature_toggles.enabled_features(),
        "Configuration loaded"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = parse_args(&args)?;

    let engine = HybridEngine::connect(&config)
        .await
        .context("Failed to initialize retrieval engine")?;

    let result = run(mode, &config, &engine).await;
    if let Err(e) = engine.close().await {
        error!("Failed to close Neo4j connection: {}", e);
    }
    result
}
