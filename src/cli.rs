//! Command-line surface.

use crate::factory::{ConfigOverrides, GeneratorConfig, ProviderFactory};
use crate::generator::DashboardGenerator;
use crate::Error;
use clap::Parser;
use std::path::PathBuf;

/// Generate a Dash dashboard script from a CSV dataset and a prompt.
#[derive(Parser, Debug)]
#[command(name = "dashgen", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the input CSV dataset.
    pub dataset_path: PathBuf,

    /// Text describing the desired dashboard.
    pub prompt: String,

    /// Where to write the generated script.
    #[arg(short, long, default_value = "dashboard.py")]
    pub output: PathBuf,

    /// Model id (default: gemini-2.0-flash, or DASHGEN_MODEL).
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API (default: Gemini, or DASHGEN_BASE_URL).
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key (default: GEMINI_API_KEY).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Number of sample rows to include in the prompt.
    #[arg(long)]
    pub sample_rows: Option<usize>,

    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens in the reply.
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds (default: 120, or DASHGEN_TIMEOUT_SECS).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Overwrite the output file if it exists.
    #[arg(short, long)]
    pub force: bool,

    /// Print the assembled prompt and exit without calling the API.
    #[arg(long)]
    pub dry_run: bool,

    /// More log output (repeat for trace).
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout,
            sample_rows: self.sample_rows,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Default tracing directive for this invocation.
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "dashgen=warn";
        }
        match self.verbose {
            0 => "dashgen=info",
            1 => "dashgen=debug",
            _ => "dashgen=trace",
        }
    }
}

/// Execute the command described by `cli`.
pub async fn run(cli: Cli) -> Result<(), Error> {
    if cli.dry_run {
        // The key is irrelevant without a request.
        let mut overrides = cli.overrides();
        overrides.api_key.get_or_insert_with(|| "dry-run".to_string());
        let config = GeneratorConfig::from_env_with(&overrides)?;
        let provider = ProviderFactory::create(&config)?;
        let generator = DashboardGenerator::new(provider, config);

        let prompt = generator.prepare(&cli.dataset_path, &cli.prompt)?;
        for message in prompt.messages() {
            println!("--- {} ---\n{}\n", message.role.as_str(), message.content);
        }
        return Ok(());
    }

    let config = GeneratorConfig::from_env_with(&cli.overrides())?;
    let provider = ProviderFactory::create(&config)?;
    let generator = DashboardGenerator::new(provider, config);

    let dashboard = generator.generate(&cli.dataset_path, &cli.prompt).await?;
    let path = generator.save(&dashboard, &cli.output, cli.force)?;

    println!("Dashboard script generated successfully as '{}'.", path.display());
    Ok(())
}
