//! CLI for Embrace - generational embrace images via Gemini.

use clap::{Args, Parser, Subcommand, ValueEnum};
use embrace::app::{AppState, PreviewRegistry, Session, Slot};
use embrace::{generate_embrace, pick_image, Config, GeminiModel, GeminiProvider, ImageProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "embrace")]
#[command(about = "Create an image of your childhood self embracing your present self (Gemini)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Gemini model to use (overrides EMBRACE_MODEL)
    #[arg(long, global = true, value_enum)]
    model: Option<ModelArg>,

    /// API base URL (overrides EMBRACE_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one embrace from two photos
    Generate(GenerateArgs),

    /// Select photos and generate from an interactive prompt
    Interactive,

    /// Check that the API key and model are usable
    Check,
}

#[derive(Args)]
struct GenerateArgs {
    /// Childhood photo
    childhood: PathBuf,

    /// Recent photo of the same person
    recent: PathBuf,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Also print the result as a data URI
    #[arg(long)]
    data_uri: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    #[value(name = "nano-banana")]
    NanoBanana,
    #[value(name = "nano-banana-pro")]
    NanoBananaPro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::NanoBanana => GeminiModel::NanoBanana,
            ModelArg::NanoBananaPro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(model) = cli.model {
        config = config.with_model(model.into());
    }
    if let Some(url) = cli.base_url {
        config = config.with_base_url(url);
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Generate(args) => {
            generate(args, &config, cli.json).await?;
        }
        Commands::Interactive => {
            interactive(&config).await?;
        }
        Commands::Check => {
            check(&config, cli.json).await?;
        }
    }

    Ok(())
}

async fn generate(args: GenerateArgs, config: &Config, json_output: bool) -> anyhow::Result<()> {
    let mut state = AppState::new(PreviewRegistry::new());
    for (slot, path) in [(Slot::Childhood, &args.childhood), (Slot::Recent, &args.recent)] {
        if let Some(image) = pick_image(path).await? {
            state.select_image(slot, image);
        }
    }

    let inputs = state.begin_generation()?;
    let provider = GeminiProvider::from_config(config)?;
    if !json_output {
        eprintln!("Generating your moment...");
    }
    let outcome = generate_embrace(&provider, &inputs.childhood, &inputs.recent).await;
    state.finish(outcome);

    let image = match state.result() {
        Some(image) => image,
        None => anyhow::bail!(
            "{}",
            state.error().unwrap_or("An unknown error occurred. Please try again.")
        ),
    };
    let size = image.save(&args.output)?;

    if json_output {
        let inputs: Vec<_> = Slot::ALL
            .iter()
            .map(|slot| {
                serde_json::json!({
                    "slot": slot,
                    "file": state.image(*slot).map(|image| image.file_name.as_str()),
                })
            })
            .collect();
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "phase": state.phase(),
            "inputs": inputs,
            "output": args.output.display().to_string(),
            "size_bytes": size,
            "mime_type": image.mime_type,
            "model": image.metadata.model,
            "duration_ms": image.metadata.duration_ms,
            "data_uri": args.data_uri.then(|| image.to_data_url()),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated image: {} ({} bytes, {})",
            args.output.display(),
            size,
            image.mime_type
        );
        if let Some(duration) = image.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
        if args.data_uri {
            println!("{}", image.to_data_url());
        }
    }

    Ok(())
}

async fn interactive(config: &Config) -> anyhow::Result<()> {
    let provider: Arc<dyn ImageProvider> = Arc::new(GeminiProvider::from_config(config)?);
    let mut session = Session::new(provider);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session.run(stdin, tokio::io::stdout()).await?;
    Ok(())
}

async fn check(config: &Config, json_output: bool) -> anyhow::Result<()> {
    let provider = GeminiProvider::from_config(config)?;
    let outcome = provider.health_check().await;

    if json_output {
        let result = serde_json::json!({
            "provider": provider.name(),
            "model": provider.model(),
            "ok": outcome.is_ok(),
            "error": outcome.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match &outcome {
            Ok(()) => println!("✓ {} ({}) is reachable", provider.name(), provider.model()),
            Err(e) => println!("✗ {} ({}): {}", provider.name(), provider.model(), e),
        }
    }

    outcome?;
    Ok(())
}
