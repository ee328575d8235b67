mod cli;

use anyhow::Result;
use babble::config::BabbleConfig;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "babble", version, about = "Per-tenant Markov chatter backed by SQLite")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read lines from stdin as one tenant's chat, replying now and then
    Chat {
        #[arg(short, long)]
        tenant: String,
    },
    /// Record a single fragment
    Say {
        #[arg(short, long)]
        tenant: String,
        text: String,
    },
    /// Generate text from a tenant's corpus
    Generate {
        #[arg(short, long)]
        tenant: String,
        /// Override the tenant's generation mode
        #[arg(long, value_enum)]
        quality: Option<Quality>,
        /// Maximum length in characters
        #[arg(long)]
        max_length: Option<usize>,
        /// Number of samples
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Show a tenant's settings and newest fragments
    Inspect {
        #[arg(short, long)]
        tenant: String,
        /// How many fragments to show
        #[arg(long, default_value_t = 10)]
        last: usize,
    },
    /// Change a setting: talk, genMode, speed or lang
    Set {
        #[arg(short, long)]
        tenant: String,
        field: String,
        value: String,
    },
    /// Delete a tenant's whole corpus (settings stay)
    Clear {
        #[arg(short, long)]
        tenant: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Delete every fragment containing a substring
    Remove {
        #[arg(short, long)]
        tenant: String,
        pattern: String,
    },
    /// List known tenants
    Tenants,
    /// Cut every corpus down to its newest fragments
    Trim {
        /// Defaults to corpus.max_corpus_size
        #[arg(long)]
        max: Option<usize>,
    },
    /// Show store statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Export tenants as JSON to stdout
    Export {
        /// Only this tenant
        #[arg(short, long)]
        tenant: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Quality {
    Low,
    High,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = BabbleConfig::load()?;

    // stdout carries command output; logs go to stderr
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = cli::open_store(&config).await?;

    let result = match cli.command {
        Command::Chat { tenant } => cli::chat::chat(&store, &config, &tenant).await,
        Command::Say { tenant, text } => cli::tenant::say(&store, &tenant, &text).await,
        Command::Generate {
            tenant,
            quality,
            max_length,
            count,
        } => {
            let mode = quality.map(|q| match q {
                Quality::Low => babble::corpus::types::GenMode::Default,
                Quality::High => babble::corpus::types::GenMode::Literate,
            });
            let max_length = max_length.unwrap_or(config.generation.max_length);
            cli::generate::generate(&store, &tenant, mode, max_length, count).await
        }
        Command::Inspect { tenant, last } => cli::inspect::inspect(&store, &tenant, last).await,
        Command::Set {
            tenant,
            field,
            value,
        } => cli::tenant::set(&store, &tenant, &field, &value).await,
        Command::Clear { tenant, yes } => cli::tenant::clear(&store, &tenant, yes).await,
        Command::Remove { tenant, pattern } => {
            cli::tenant::remove(&store, &tenant, &pattern).await
        }
        Command::Tenants => cli::maintenance::tenants(&store).await,
        Command::Trim { max } => {
            cli::maintenance::trim(&store, max.unwrap_or(config.corpus.max_corpus_size)).await
        }
        Command::Stats { json } => cli::stats::stats(&store, json).await,
        Command::Export { tenant } => cli::export::export(&store, tenant.as_deref()).await,
    };

    store.close();
    result
}
