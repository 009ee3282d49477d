use anyhow::Result;
use clap::Parser;
use clap::builder::{NonEmptyStringValueParser, TypedValueParser};
use memegen::commands::GenerateOptions;
use memegen::generate::DEFAULT_DEADLINE_MS;
use memegen::http::{DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_MAX_RETRIES};
use std::path::PathBuf;

/// memegen - AI meme generator
///
/// Turns a text prompt into four images using a hosted Stable Diffusion model.
///
/// The HUGGINGFACE_API_KEY environment variable must hold a Hugging Face access token.
///
/// Examples:
///   memegen generate "a cute dog smiling, cartoon style"
#[derive(Parser, Debug)]
#[command(author, version = env!("MEMEGEN_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Inference endpoint (defaults to the hosted stable-diffusion-v1-4 model)
    #[arg(long = "api-url", env = "MEMEGEN_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Generate four memes from a prompt
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// What the memes should show. Plain English works best.
    #[arg(value_name = "PROMPT", value_parser = NonEmptyStringValueParser::new())]
    pub prompt: String,

    /// Directory to save images to (defaults to the download directory)
    #[arg(long = "out", short = 'o', env = "MEMEGEN_OUT_DIR", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Do not save images, only report progress
    #[arg(long, conflicts_with = "out_dir")]
    pub no_save: bool,

    /// Attempts per image before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
    pub max_retries: usize,

    /// Timeout of a single attempt in milliseconds
    #[arg(long, default_value_t = DEFAULT_ATTEMPT_TIMEOUT_MS, value_name = "MS")]
    pub attempt_timeout_ms: u64,

    /// Hard limit per image in milliseconds, retries included
    #[arg(long, default_value_t = DEFAULT_DEADLINE_MS, value_name = "MS")]
    pub deadline_ms: u64,

    /// Number of images requested at once
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=4).map(|n| n as usize))]
    pub concurrency: usize,

    /// Give up immediately on 400 and 401 responses instead of retrying
    #[arg(long)]
    pub fail_fast: bool,
}

impl GenerateArgs {
    fn options(&self, api_url: Option<String>) -> GenerateOptions {
        GenerateOptions {
            api_url,
            out_dir: self.out_dir.clone(),
            save: !self.no_save,
            max_retries: self.max_retries,
            attempt_timeout_ms: self.attempt_timeout_ms,
            deadline_ms: self.deadline_ms,
            concurrency: self.concurrency,
            fail_fast: self.fail_fast,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = memegen::runtime::RealRuntime;

    match cli.command {
        Commands::Generate(args) => {
            let options = args.options(cli.api_url);
            memegen::commands::generate(runtime, &args.prompt, &options).await?
        }
    }
    Ok(())
}
