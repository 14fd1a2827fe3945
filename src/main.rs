use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use dropwatch::commands::{
    cmd_config_init, cmd_config_path, cmd_config_show, cmd_scan, cmd_watch,
};

#[derive(Parser)]
#[command(name = "dropwatch")]
#[command(about = "Watch a drop folder and dispatch notifications for new documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the folder and dispatch a notification per new document
    #[command(visible_alias = "w")]
    Watch {
        /// Config file (default: the platform config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Watched root, overriding the config file
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Log notifications instead of running the notification command
        #[arg(long)]
        dry_run: bool,
    },

    /// List files under the root with the disposition each would get
    Scan {
        /// Config file (default: the platform config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Watched root, overriding the config file
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Inspect or bootstrap the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the resolved configuration
    Show {
        /// Config file (default: the platform config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a default configuration file for the given root
    Init {
        /// Folder to watch
        root: PathBuf,

        /// Target config file (default: the platform config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Print the default configuration file path
    Path,
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dropwatch=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(atty::is(atty::Stream::Stderr)),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch {
            config,
            root,
            dry_run,
        } => cmd_watch(config.as_deref(), root.as_deref(), dry_run).await,

        Commands::Scan { config, root, json } => {
            cmd_scan(config.as_deref(), root.as_deref(), json)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show { config } => cmd_config_show(config.as_deref()),
            ConfigAction::Init {
                root,
                config,
                force,
            } => cmd_config_init(config.as_deref(), &root, force),
            ConfigAction::Path => cmd_config_path(),
        },

        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "dropwatch",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
