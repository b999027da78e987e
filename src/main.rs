use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use budget_planner::cli::{
    handle_backup_command, handle_project_command, handle_tree_command, BackupCommands,
    ProjectCommands, TreeCommands,
};
use budget_planner::config::{paths::PlannerPaths, settings::Settings};
use budget_planner::models::ProjectTemplate;
use budget_planner::storage::Storage;

#[derive(Parser)]
#[command(
    name = "budgetplan",
    version,
    about = "Hierarchical project budgeting from the command line",
    long_about = "budgetplan keeps project budgets as a tree of categories, \
                  subcategories and expense lines. Amounts roll up bottom-up \
                  and the project's total budget is reconciled so a total you \
                  chose is never overwritten by a later sum."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and settings
    Init,

    /// Show current configuration and paths
    Config,

    /// Project management commands
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Budget tree editing commands
    #[command(subcommand)]
    Tree(TreeCommands),

    /// Backup management commands
    #[command(subcommand)]
    Backup(BackupCommands),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = PlannerPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let mut storage = Storage::new(paths.clone(), &settings)?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing budget planner at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            storage.save_all()?;
            println!("Initialization complete!");
            println!();
            println!("Available project templates:");
            for template in ProjectTemplate::all() {
                println!("  - {}", template);
            }
            println!();
            println!("Run 'budgetplan project create <name> --template <template>' to start.");
        }
        Some(Commands::Config) => {
            println!("Budget Planner Configuration");
            println!("============================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Debounce:        {} ms", settings.debounce_ms);
            println!("  Settle delay:    {} ms", settings.settle_ms);
            println!(
                "  Backups kept:    {} daily, {} monthly",
                settings.backup_retention.daily_count, settings.backup_retention.monthly_count
            );
        }
        Some(Commands::Project(cmd)) => {
            handle_project_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Tree(cmd)) => {
            handle_tree_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(&storage, &settings, cmd)?;
        }
        None => {
            println!("budgetplan - hierarchical project budgeting");
            println!();
            println!("Run 'budgetplan --help' for usage information.");
        }
    }

    Ok(())
}
