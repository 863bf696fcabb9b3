use aider_start::paths::AppPaths;
use aider_start::secrets::KeyringStore;
use aider_start::{hello, list_legacy, list_presets, logging, run_legacy, run_preset};
use aider_start::{Context, Executor, LaunchMode, Outcome, Screen};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aider-start", version, about = "Launch aider with saved presets")]
struct Cli {
    /// Database file to use instead of the default location
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log filter, e.g. `debug` or `aider_start=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Open the provider and endpoint configuration
    #[arg(long)]
    config: bool,
    /// Launch a legacy profile or quick preset by name
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,
    /// List legacy profiles and quick presets
    #[arg(long)]
    list: bool,
    /// Print the command for --profile instead of running it
    #[arg(long)]
    dry_run: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the preset manager (default)
    Tui,
    /// Check the installation
    Hello {
        #[arg(default_value = "World")]
        name: String,
    },
    /// List saved presets
    Presets,
    /// Run a saved preset without the TUI
    Run {
        name: String,
        /// Print the command instead of running it
        #[arg(long)]
        dry_run: bool,
    },
}

fn open_context(cli: &Cli) -> Result<Context> {
    let mut paths = AppPaths::resolve();
    if let Some(db) = &cli.db {
        paths = paths.with_db_path(db);
    }
    logging::init(&paths.log_dir(), cli.log_level.as_deref());
    tracing::info!(db = %paths.db_path.display(), "Starting aider-start");
    Context::open(paths, Box::new(KeyringStore::new())).context("Failed to open the preset database")
}

fn exit_with(code: i32) -> Result<()> {
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

async fn tui(ctx: Context, start: Screen) -> Result<()> {
    match aider_start::tui::run(ctx, start).await? {
        Outcome::Quit => Ok(()),
        Outcome::Launch { command, env } => {
            println!("Running: {command}");
            let code = Executor::new(LaunchMode::default())
                .launch(&command, &env)
                .context("Failed to launch aider")?;
            exit_with(code)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Hello { name }) = &cli.command {
        return hello(name);
    }

    let ctx = open_context(&cli)?;

    if cli.list {
        return list_legacy(&ctx);
    }
    if let Some(name) = &cli.profile {
        let code = run_legacy(&ctx, name, cli.dry_run, LaunchMode::default())?;
        return exit_with(code);
    }
    if cli.config {
        return tui(ctx, Screen::Providers).await;
    }

    match cli.command {
        Some(Commands::Presets) => list_presets(&ctx),
        Some(Commands::Run { name, dry_run }) => {
            let code = run_preset(&ctx, &name, dry_run, LaunchMode::default())?;
            exit_with(code)
        }
        Some(Commands::Tui) | Some(Commands::Hello { .. }) | None => tui(ctx, Screen::PresetList).await,
    }
}
