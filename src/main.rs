//! # modforge CLI Entry Point
//!
//! This is the main executable for the `mf` command-line tool.
//! It parses CLI arguments using clap, resolves the build configuration once,
//! and hands the requested operation to the orchestrator.
//!
//! ## Operations
//!
//! - **Build**: `all` (default), `libs`, `bin`, `server`
//! - **Rebuild**: `rebuild`, `rebuild-libs`, `rebuild-exe`
//! - **Clean**: `clean`, `clean-libs`, `clean-exe`, `clean-all`
//! - **Other**: `run-exe`, `list`, `completion`, `help`

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use modforge::build::{Backend, MakeBackend};
use modforge::config::{self, BuildConfig, BuildOverrides, Mode};
use modforge::naming;
use modforge::ui;
use modforge::{Orchestrator, Target};

#[derive(Parser)]
#[command(name = "mf")]
#[command(about = "Builds every module library, then links the aggregate executable", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    directory: Option<PathBuf>,
    /// Build mode passed to every subordinate build [default: release]
    #[arg(long, global = true, value_enum)]
    mode: Option<Mode>,
    /// Pass VERBOSE=1 down and show build decisions
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Name of the linked executable [default: main]
    #[arg(long, global = true, value_name = "NAME")]
    main_name: Option<String>,
    /// Modules built in parallel [default: 1]
    #[arg(short, long, global = true)]
    jobs: Option<usize>,
    /// Keep building other modules after one fails
    #[arg(long, global = true)]
    keep_going: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Build libraries, the executable and the server
    All,
    /// Build the dedicated server only
    Server,
    /// Build every module library and promote changed artifacts
    Libs,
    /// Build libraries, then link the executable
    Bin,
    /// clean-all, then all
    Rebuild,
    /// clean-libs, then libs
    RebuildLibs,
    /// Build libraries, then force a fresh link of the executable
    RebuildExe,
    /// Remove the build directory
    Clean,
    /// Clean every module and remove the shared library directory
    CleanLibs,
    /// Remove the executable directory
    CleanExe,
    /// clean, then clean every module
    CleanAll,
    /// Run the built executable
    RunExe,
    /// List discovered modules and their artifact state
    List,
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

impl Commands {
    fn target(self) -> Option<Target> {
        Some(match self {
            Commands::All => Target::All,
            Commands::Server => Target::Server,
            Commands::Libs => Target::Libs,
            Commands::Bin => Target::Bin,
            Commands::Rebuild => Target::Rebuild,
            Commands::RebuildLibs => Target::RebuildLibs,
            Commands::RebuildExe => Target::RebuildExe,
            Commands::Clean => Target::Clean,
            Commands::CleanLibs => Target::CleanLibs,
            Commands::CleanExe => Target::CleanExe,
            Commands::CleanAll => Target::CleanAll,
            Commands::RunExe => Target::RunExe,
            Commands::List | Commands::Completion { .. } => return None,
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        ui::error(format!("{e:#}"));
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "modforge=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::All);

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let root = match &cli.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("Project root {} not found", root.display()))?;

    let file_config = config::load_config(&root)?;
    let overrides = BuildOverrides {
        mode: cli.mode,
        verbose: cli.verbose,
        main_name: cli.main_name.clone(),
        jobs: cli.jobs,
        keep_going: cli.keep_going,
    };
    let build = BuildConfig::resolve(&file_config.build, &overrides);
    let backend = MakeBackend::new(file_config.tool.make.clone());
    let orchestrator = Orchestrator::new(&root, file_config, build, backend);

    match command.target() {
        Some(target) => orchestrator.run(target)?,
        None => list_modules(&orchestrator)?,
    }
    Ok(())
}

fn list_modules<B: Backend>(orchestrator: &Orchestrator<B>) -> Result<()> {
    let modules = orchestrator.modules()?;
    if modules.is_empty() {
        println!("{} No modules found.", "ℹ".blue());
        return Ok(());
    }

    let layout = orchestrator.layout();
    let mut table = ui::Table::new(&["Module", "Library", "API Header", "Makefile", "Shared"]);
    for module in &modules {
        let header = if module.header_source().is_file() {
            module.header.green().to_string()
        } else {
            module.header.dimmed().to_string()
        };
        let buildable = if orchestrator.backend().is_buildable(&module.dir) {
            "✓".green().to_string()
        } else {
            "x".red().to_string()
        };
        let shared = if module.shared_library(layout).is_file() {
            module.archive.cyan().to_string()
        } else {
            "-".dimmed().to_string()
        };
        table.add_row(vec![
            module.name.bold().to_string(),
            module.library.clone(),
            header,
            buildable,
            shared,
        ]);
    }
    table.print();

    if let Err(e) = naming::check_collisions(&modules) {
        ui::warn(e);
    }
    Ok(())
}
