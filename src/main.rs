//! Conduit CLI
//!
//! Interactive multi-workflow assistant.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use conduit::extract::extract;
use conduit::images::ImageStore;
use conduit::interactive::{
    install_panic_handler, Prompter, Session, SignalHandler, StdinPrompter, TerminalRenderer,
};
use conduit::provider::{self, EchoGenerator, UnavailableImageGenerator};
use conduit::stages::StageDeps;
use conduit::{Config, Result, WorkflowKind, WorkflowRegistry};

#[derive(Parser)]
#[command(name = "conduit")]
#[command(author, version, about = "Interactive multi-workflow assistant")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CONDUIT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive session (default)
    #[command(alias = "i")]
    Interactive {
        /// Start with a workflow (number or name)
        #[arg(long, short)]
        workflow: Option<WorkflowKind>,
    },

    /// List workflows and their stage chains
    Workflows,

    /// Show what the extractor pulls out of a line of input
    Extract {
        /// Workflow (number or name)
        workflow: WorkflowKind,

        /// Raw input text
        text: String,
    },

    /// Initialize .conduit directory
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the chat
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Loaded per command so `init --force` can repair a broken config file
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Interactive { workflow: None }) {
        Commands::Interactive { workflow } => {
            let config = Config::load(config_path)?;
            install_panic_handler();

            let console: Arc<dyn Prompter> = Arc::new(StdinPrompter::new());
            let deps = StageDeps {
                text: provider::create_text_generator(&config)?,
                image: provider::create_image_generator(&config)?,
                images: Arc::new(ImageStore::new(config.image.output_path())),
                console: console.clone(),
                refinement_attempts: config.session.refinement_attempts,
            };
            let registry = Arc::new(WorkflowRegistry::build(&deps)?);

            let mut session = Session::new(
                registry,
                console,
                Box::new(TerminalRenderer::new(true)),
                config.session.max_history,
            );

            let signal_handler = SignalHandler::new(session.interrupts(), session.shutdown_flag());
            signal_handler.install()?;

            if let Some(kind) = workflow {
                session.activate(kind);
            }

            session.run().await?;

            if signal_handler.is_shutdown() {
                info!("Shut down by signal");
            }
        }

        Commands::Workflows => {
            let config = Config::load(config_path)?;
            // Stage chains do not depend on the backends, so no keys are needed
            let dir = std::env::temp_dir().join("conduit-workflows");
            let deps = StageDeps {
                text: Arc::new(EchoGenerator),
                image: Arc::new(UnavailableImageGenerator),
                images: Arc::new(ImageStore::new(dir)),
                console: Arc::new(StdinPrompter::new()),
                refinement_attempts: config.session.refinement_attempts,
            };
            let registry = WorkflowRegistry::build(&deps)?;

            for definition in registry.iter() {
                let kind = definition.kind();
                let stages: Vec<String> = definition
                    .stage_ids()
                    .iter()
                    .map(|id| id.to_string())
                    .collect();
                println!(
                    "{}. {:<20} {}",
                    kind.menu_number(),
                    kind.title(),
                    stages.join(" → ")
                );
            }
        }

        Commands::Extract { workflow, text } => {
            let (clean, parameters) = extract(&text, workflow);
            println!("text: {}", clean);
            println!("parameters: {}", serde_json::to_string_pretty(&parameters)?);
        }

        Commands::Init { force } => {
            let path = conduit::config::init(force)?;
            println!("Created {}", path.display());
        }

        Commands::Config => {
            let config = Config::load(config_path)?;
            println!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
