//! HR Assist: HR/IT policy chatbot backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hrassist_chat::{GuardedGenerator, HttpGenerator, LLMConfig};
use hrassist_core::AppConfig;
use hrassist_engine::QaEngine;
use hrassist_server::{build_router, AppState};
use hrassist_store::QaDataset;

fn resolve_data_dir() -> PathBuf {
    std::env::var("HRASSIST_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

/// Strictly check a dataset file. Returns false on any invalid entry.
fn validate_dataset(path: &Path) -> bool {
    match QaDataset::load_strict(path) {
        Ok(dataset) => {
            let stats = dataset.statistics();
            println!("{}: OK", path.display());
            println!("  pairs:     {}", stats.total_qa_pairs);
            println!("  generated: {}", stats.generated_qa_pairs);
            println!("  manual:    {}", stats.manual_qa_pairs);
            for (source, count) in &stats.sources {
                println!("  source {:<30} {}", source, count);
            }
            true
        }
        Err(e) => {
            eprintln!("{}: INVALID", path.display());
            eprintln!("  {}", e);
            false
        }
    }
}

fn build_generator(llm_config: &LLMConfig, hr_email: &str) -> Option<GuardedGenerator> {
    match HttpGenerator::from_config(llm_config) {
        Ok(Some(generator)) => {
            let guarded = GuardedGenerator::new(Arc::new(generator), hr_email);
            info!("LLM generator: {}", guarded.describe());
            Some(guarded)
        }
        Ok(None) => {
            warn!("No LLM API key configured. Unmatched questions get the static fallback.");
            None
        }
        Err(e) => {
            warn!("LLM generator unavailable: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--validate" | "validate" => {
                let path = if args.len() > 2 {
                    PathBuf::from(&args[2])
                } else {
                    resolve_data_dir().join("qa_dataset.json")
                };
                std::process::exit(if validate_dataset(&path) { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                println!("HR Assist: HR/IT policy chatbot backend");
                println!();
                println!("Usage: hrassist [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Start the server");
                println!("  validate [dataset.json]  Strictly check a QA dataset file");
                println!("  help                     Show this help message");
                println!();
                println!("Environment: HRASSIST_DATA_DIR, PORT, EMBEDDER, QA_EXACT_THRESHOLD,");
                println!("  QA_GENERATE_THRESHOLD, COMPANY_NAME, COMPANY_EMAIL, LLM_PROVIDER,");
                println!("  GEMINI_API_KEY, OPENAI_API_KEY, ANTHROPIC_API_KEY, GROQ_API_KEY");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'hrassist help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = AppConfig::from_env(&data_dir)?;
    let port = config.port;
    info!(
        "Thresholds: exact >= {}, generate >= {}",
        config.thresholds.exact, config.thresholds.generate
    );

    let embedder = hrassist_infer::create_embedder(
        config.embedder,
        &config.data_paths.models,
        config.embedding_dim,
    );
    let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
    let generator = build_generator(&llm_config, &config.company.hr_email);

    let engine = QaEngine::new(&config, embedder, generator);
    let loaded = engine.reload().await?;
    info!("Loaded {} QA pairs from {}", loaded, config.data_paths.qa_dataset.display());

    let state = Arc::new(AppState::new(config, engine, llm_config));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HR Assist server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
