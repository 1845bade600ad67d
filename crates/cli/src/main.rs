//! # promptdesk-cli: A CLI for `promptdesk`
//!
//! This is the main entry point for the `promptdesk` command-line interface.

mod commands;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use commands::TemplateSource;
use promptdesk::{
    providers::create_provider, ChatOrchestrator, ChatSession, ContextAssembler, ExtractOptions,
    HistoryStore, PromptCatalog, ProviderConfig, StreamOutcome, TextEncodingPolicy, TokenBudget,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding the prompt category files
    #[arg(long, env = "PROMPTDESK_PROMPTS_DIR", default_value = "prompts", global = true)]
    prompts_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the prompt categories
    Categories,
    /// Sample or author prompt templates for a category and export them
    Generate(GenerateArgs),
    /// Extract the text of a document
    Extract(ExtractArgs),
    /// Send a message, with optional attachments, and stream the reply
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
struct ProviderArgs {
    /// `openai` or `local` (any OpenAI-compatible endpoint)
    #[arg(long, env = "PROMPTDESK_PROVIDER", default_value = "openai")]
    provider: String,
    /// Chat-completions URL; defaults to the public OpenAI endpoint
    #[arg(long, env = "PROMPTDESK_API_URL")]
    api_url: Option<String>,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "PROMPTDESK_MODEL", default_value = promptdesk::constants::DEFAULT_MODEL)]
    model: String,
}

impl ProviderArgs {
    fn to_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            model_name: self.model.clone(),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// The category key, e.g. `meeting`
    #[arg(long)]
    category: String,
    #[arg(long, default_value_t = promptdesk::constants::DEFAULT_SAMPLE_COUNT)]
    count: usize,
    /// Author new templates for this theme instead of sampling the catalog
    #[arg(long)]
    theme: Option<String>,
    /// Write the export here instead of a timestamped file
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
    /// Skip printing the templates
    #[arg(long)]
    no_display: bool,
    #[command(flatten)]
    provider: ProviderArgs,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    file: PathBuf,
    /// Only accept UTF-8 and Shift_JIS for plain text
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct ChatArgs {
    message: String,
    /// Use a template from this category as the system prompt
    #[arg(long, requires = "prompt_id")]
    category: Option<String>,
    #[arg(long, requires = "category")]
    prompt_id: Option<u32>,
    /// Attach a file; may be repeated
    #[arg(long = "attach")]
    attachments: Vec<PathBuf>,
    /// Continue a saved conversation from the history directory
    #[arg(long, conflicts_with = "category")]
    resume: Option<String>,
    /// Save the conversation under this title when the reply finishes
    #[arg(long)]
    save: Option<String>,
    #[arg(long, env = "PROMPTDESK_HISTORY_DIR", default_value = "chat_history")]
    history_dir: PathBuf,
    /// Seconds without a delta before the stream is abandoned
    #[arg(long, default_value_t = 120)]
    idle_timeout: u64,
    #[command(flatten)]
    provider: ProviderArgs,
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Setup logging to a file
    let log_file = File::create("promptdesk-cli.log")?;
    let subscriber = fmt::Subscriber::builder()
        .with_writer(log_file)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let catalog = PromptCatalog::new(&cli.prompts_dir);

    // Handle the command
    match &cli.command {
        Commands::Categories => {
            commands::write_categories(&catalog, &mut io::stdout().lock())?;
        }
        Commands::Generate(args) => {
            if let Err(e) = handle_generate(&catalog, args).await {
                eprintln!("Generate failed: {e:#}");
            }
        }
        Commands::Extract(args) => {
            if let Err(e) = handle_extract(args) {
                eprintln!("Extract failed: {e:#}");
            }
        }
        Commands::Chat(args) => {
            if let Err(e) = handle_chat(&catalog, args).await {
                eprintln!("Chat failed: {e:#}");
            }
        }
    }

    Ok(())
}

// --- Command Handlers ---

async fn handle_generate(catalog: &PromptCatalog, args: &GenerateArgs) -> Result<()> {
    if !PromptCatalog::is_known(&args.category) {
        bail!(
            "Unknown category '{}'. Run `promptdesk categories` to list them.",
            args.category
        );
    }

    let prompts = match &args.theme {
        Some(theme) => {
            info!("Authoring {} templates for theme '{}'", args.count, theme);
            let provider = create_provider(&args.provider.to_config())?;
            let source = TemplateSource::Author {
                provider: provider.as_ref(),
                theme,
            };
            commands::collect_templates(catalog, &args.category, args.count, source).await?
        }
        None => {
            commands::collect_templates(catalog, &args.category, args.count, TemplateSource::Sample)
                .await?
        }
    };

    if !args.no_display {
        commands::display_templates(&prompts, &mut io::stdout().lock())?;
    }
    let count = prompts.len();
    let path = commands::write_export(
        args.output.as_deref(),
        &args.output_dir,
        &args.category,
        prompts,
    )?;
    println!("✅ Exported {count} templates to {}", path.display());
    Ok(())
}

fn handle_extract(args: &ExtractArgs) -> Result<()> {
    let options = ExtractOptions {
        text_encoding: if args.strict {
            TextEncodingPolicy::Strict
        } else {
            TextEncodingPolicy::Permissive
        },
        timeout: None,
    };
    commands::extract_file(
        &args.file,
        &options,
        &TokenBudget::default(),
        &mut io::stdout().lock(),
    )
}

async fn handle_chat(catalog: &PromptCatalog, args: &ChatArgs) -> Result<()> {
    let store = HistoryStore::new(&args.history_dir)?;
    let mut session = match (&args.resume, &args.category, args.prompt_id) {
        (Some(filename), _, _) => ChatSession::from_record(&store.read(filename)?),
        (None, Some(category), Some(id)) => ChatSession::with_prompt(catalog.find(category, id)?),
        _ => ChatSession::new(),
    };

    let provider = create_provider(&args.provider.to_config())?;
    let orchestrator =
        ChatOrchestrator::new(provider).with_idle_timeout(Duration::from_secs(args.idle_timeout));
    let assembler = ContextAssembler::new(
        TokenBudget::default(),
        ExtractOptions {
            timeout: Some(Duration::from_secs(60)),
            ..Default::default()
        },
    );
    let uploads = commands::read_uploads(&args.attachments)?;

    let mut stdout = io::stdout();
    let report = commands::stream_chat(
        &orchestrator,
        &assembler,
        &mut session,
        &args.message,
        uploads,
        &mut stdout,
    )
    .await?;
    stdout.flush()?;

    if let Some(title) = &args.save {
        let (messages, prompt) = session.into_parts();
        let filename = store.save(title, messages, prompt)?;
        println!("✅ Saved conversation as {filename}");
    }

    if let StreamOutcome::Failed(reason) = report.outcome {
        bail!("The reply did not complete: {reason}");
    }
    Ok(())
}
