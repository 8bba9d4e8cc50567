use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use agenda_pricing::cli::{
    handle_fix_command, handle_history_command, handle_quote_command, handle_service_command,
    FixCommands, ServiceCommands,
};
use agenda_pricing::config::{paths::AgendaPaths, settings::Settings};
use agenda_pricing::error::AgendaResult;
use agenda_pricing::logging::init_logger;
use agenda_pricing::storage::{initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "agenda",
    version,
    about = "Price consistency checks and repairs for appointment bookings",
    long_about = "Finds appointments whose recorded prices are missing or zero, \
                  repairs them so every total equals the sum of its services, \
                  and manages the catalog prices new bookings start from."
)]
struct Cli {
    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory (defaults to the platform config directory)
    #[arg(long, global = true, env = "AGENDA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory
    Init {
        /// Fill the store with a small demo dataset
        #[arg(long)]
        demo: bool,
    },

    /// Show current configuration and paths
    Config,

    /// Catalog commands
    #[command(subcommand, alias = "svc")]
    Service(ServiceCommands),

    /// Find and repair appointments with missing prices
    #[command(subcommand)]
    Fix(FixCommands),

    /// Price a booking from the catalog
    Quote {
        /// Service name or ID (repeatable)
        #[arg(short, long = "service")]
        services: Vec<String>,
        /// Override as <service>=<price> (repeatable)
        #[arg(short, long = "price")]
        prices: Vec<String>,
    },

    /// Show recent price changes
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let paths = match cli.data_dir {
        Some(dir) => AgendaPaths::with_base_dir(dir),
        None => AgendaPaths::new()?,
    };
    let settings = Settings::load_or_create(&paths)?;

    if let Err(e) = run(cli.command, &paths, &settings) {
        tracing::debug!(error = %e, "command failed");
        anyhow::bail!(e.user_message());
    }

    Ok(())
}

fn run(command: Option<Commands>, paths: &AgendaPaths, settings: &Settings) -> AgendaResult<()> {
    let open_storage = || -> AgendaResult<Storage> {
        let storage = Storage::new(paths.clone())?.with_audit(settings.audit_enabled);
        storage.load_all()?;
        Ok(storage)
    };

    match command {
        Some(Commands::Init { demo }) => {
            println!("Initializing agenda-pricing at: {}", paths.base_dir().display());
            initialize_storage(paths, demo)?;
            settings.save(paths)?;
            println!("Initialization complete!");
            if demo {
                println!();
                println!("A demo salon catalog with a few bookings has been created.");
                println!("Run 'agenda fix scan' to see the appointments with missing prices.");
            }
        }
        Some(Commands::Config) => {
            println!("agenda-pricing configuration");
            println!("============================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Date format:     {}", settings.date_format);
            println!("  Audit enabled:   {}", settings.audit_enabled);
        }
        Some(Commands::Service(cmd)) => {
            handle_service_command(&open_storage()?, settings, cmd)?;
        }
        Some(Commands::Fix(cmd)) => {
            handle_fix_command(&open_storage()?, settings, cmd)?;
        }
        Some(Commands::Quote { services, prices }) => {
            handle_quote_command(&open_storage()?, settings, &services, &prices)?;
        }
        Some(Commands::History { count }) => {
            handle_history_command(&open_storage()?, count)?;
        }
        None => {
            println!("agenda - price consistency for appointment bookings");
            println!();
            println!("Run 'agenda --help' for usage information.");
        }
    }

    Ok(())
}
