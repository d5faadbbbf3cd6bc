use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ringdesk::cli::CommandContext;
use ringdesk::cli::commands;
use ringdesk::overrides::OverrideSection;

#[derive(Parser)]
#[command(name = "ringdesk")]
#[command(
    version,
    about = "Support console for ring wearables: gateway, chat and knowledge base"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Read configuration from this file only")]
    config: Option<PathBuf>,

    #[arg(long, global = true, env = "RINGDESK_GATEWAY_URL", help = "Gateway URL override")]
    gateway_url: Option<String>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API gateway
    Serve {
        #[arg(long, help = "Listen address, e.g. 0.0.0.0:3000")]
        bind: Option<String>,
    },

    /// Send a message and wait for the reply
    Chat {
        #[arg(help = "Message text")]
        message: String,
        #[arg(long, help = "Return once the message is accepted")]
        no_wait: bool,
    },

    /// Show the current conversation
    History {
        #[arg(long, help = "Clear the conversation instead")]
        clear: bool,
        #[arg(long, conflicts_with = "clear", help = "Keep printing new messages")]
        follow: bool,
    },

    /// Browse archived sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },

    /// Inspect and edit agent overrides
    Overrides {
        #[command(subcommand)]
        action: OverridesAction,
    },

    /// Manage the customer context sent to the backend
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Show the customer status panel
    Status {
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Search the knowledge base
    Search {
        #[arg(help = "Search query")]
        query: String,
        #[arg(long, help = "List title suggestions instead of searching")]
        suggest: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List archived sessions
    List {
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Show one session
    Show { id: String },
    /// Archive a session from a JSON body
    Create {
        #[arg(help = "JSON object sent as the session body")]
        body: Option<String>,
    },
    /// Delete a session
    Delete { id: String },
}

#[derive(Subcommand)]
enum OverridesAction {
    /// Show current overrides
    Show {
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Set one override (value parsed as JSON when possible)
    Set {
        section: OverrideSection,
        key: String,
        value: String,
    },
    /// Clear one key, or a whole section
    Clear {
        section: OverrideSection,
        key: Option<String>,
    },
    /// Turn overrides on
    Enable,
    /// Turn overrides off without clearing them
    Disable,
    /// Push the locally cached overrides to the backend
    Save,
    /// List known keys for a section
    Keys {
        section: OverrideSection,
        #[arg(help = "Filter by key or description")]
        filter: Option<String>,
    },
}

#[derive(Subcommand)]
enum ContextAction {
    /// Load a customer payload file and push it with overrides applied
    Push { file: PathBuf },
    /// Show the backend context
    Show,
    /// Clear the cached payload and the backend context
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();
    let load_context = || CommandContext::load(config_path, cli.gateway_url.as_deref());

    match cli.command {
        Commands::Serve { bind } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::serve::run(config_path, bind))?;
        }
        Commands::Chat { message, no_wait } => {
            let ctx = load_context()?;
            let rt = Runtime::new()?;
            rt.block_on(commands::chat::run(&ctx, &message, no_wait))?;
        }
        Commands::History { clear, follow } => {
            let ctx = load_context()?;
            let rt = Runtime::new()?;
            rt.block_on(commands::history::run(&ctx, clear, follow))?;
        }
        Commands::Sessions { action } => {
            let ctx = load_context()?;
            let rt = Runtime::new()?;
            match action {
                SessionsAction::List { format } => {
                    rt.block_on(commands::sessions::list(&ctx, &format))?
                }
                SessionsAction::Show { id } => rt.block_on(commands::sessions::show(&ctx, &id))?,
                SessionsAction::Create { body } => {
                    rt.block_on(commands::sessions::create(&ctx, body.as_deref()))?
                }
                SessionsAction::Delete { id } => {
                    rt.block_on(commands::sessions::delete(&ctx, &id))?
                }
            }
        }
        Commands::Overrides { action } => {
            if let OverridesAction::Keys { section, filter } = &action {
                commands::overrides::keys(*section, filter.as_deref())?;
                return Ok(());
            }

            let ctx = load_context()?;
            let rt = Runtime::new()?;
            match action {
                OverridesAction::Show { format } => {
                    rt.block_on(commands::overrides::show(&ctx, &format))?
                }
                OverridesAction::Set {
                    section,
                    key,
                    value,
                } => rt.block_on(commands::overrides::set(&ctx, section, &key, &value))?,
                OverridesAction::Clear { section, key } => {
                    rt.block_on(commands::overrides::clear(&ctx, section, key.as_deref()))?
                }
                OverridesAction::Enable => {
                    rt.block_on(commands::overrides::set_enabled(&ctx, true))?
                }
                OverridesAction::Disable => {
                    rt.block_on(commands::overrides::set_enabled(&ctx, false))?
                }
                OverridesAction::Save => rt.block_on(commands::overrides::save(&ctx))?,
                OverridesAction::Keys { .. } => {}
            }
        }
        Commands::Context { action } => {
            let ctx = load_context()?;
            let rt = Runtime::new()?;
            match action {
                ContextAction::Push { file } => {
                    rt.block_on(commands::context::push(&ctx, &file))?
                }
                ContextAction::Show => rt.block_on(commands::context::show(&ctx))?,
                ContextAction::Clear => rt.block_on(commands::context::clear(&ctx))?,
            }
        }
        Commands::Status { format } => {
            let ctx = load_context()?;
            let rt = Runtime::new()?;
            rt.block_on(commands::status::run(&ctx, &format))?;
        }
        Commands::Search { query, suggest } => {
            let config = ringdesk::cli::load_config(config_path)?;
            commands::search::run(&config, &query, suggest)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
