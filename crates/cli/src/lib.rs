//! # Compact CLI
//!
//! Offline front-end over the compact tracker core: build key tables from
//! snapshot files, resolve keys back to ids, encode response documents and
//! rewrite references in free text.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use compact_schema::EntityKind;

pub mod commands;
pub mod config;

use commands::Outcome;
use config::CompactConfig;

#[derive(Parser)]
#[command(name = "compact-tracker")]
#[command(about = "Token-efficient keys and encodings for issue tracker responses", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./compact-tracker.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the URL host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Override the workspace URL key
    #[arg(long, global = true)]
    workspace: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every short key as encoded lookup tables
    Keys(SnapshotArgs),

    /// Resolve short keys (or UUIDs) to canonical ids
    Resolve(ResolveArgs),

    /// Encode a JSON response document
    Encode(EncodeArgs),

    /// Expand issue identifiers and project keys into URLs
    Link(TextArgs),

    /// Compact workspace URLs back into identifiers and project keys
    Strip(TextArgs),
}

#[derive(Args)]
struct SnapshotArgs {
    /// JSON file with `users`, `states`, `projects` and `teams` arrays
    #[arg(long)]
    snapshots: PathBuf,

    /// Team whose states get unprefixed keys (id or key)
    #[arg(long)]
    default_team: Option<String>,
}

#[derive(Args)]
struct ResolveArgs {
    #[command(flatten)]
    registry: SnapshotArgs,

    /// Entity kind: user, state, project or team
    #[arg(long)]
    kind: EntityKind,

    /// Keys to resolve
    #[arg(required = true)]
    keys: Vec<String>,
}

#[derive(Args)]
struct EncodeArgs {
    /// JSON document with `meta`, `lookups` and `data`
    #[arg(long)]
    document: PathBuf,
}

#[derive(Args)]
struct TextArgs {
    #[command(flatten)]
    registry: SnapshotArgs,

    /// Markdown input (default: stdin)
    #[arg(long)]
    text: Option<PathBuf>,
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

/// Config file values with command-line overrides applied.
fn resolve_config(cli: &Cli, default_team: Option<&str>) -> Result<CompactConfig> {
    let mut config = CompactConfig::load(cli.config.as_deref())?;
    if let Some(host) = &cli.host {
        config.url_host.clone_from(host);
    }
    if let Some(workspace) = &cli.workspace {
        config.workspace_key = Some(workspace.clone());
    }
    if let Some(team) = default_team {
        config.default_team = Some(team.to_string());
    }
    config
        .validate()
        .map_err(|err| anyhow!("Invalid configuration: {err}"))?;
    Ok(config)
}

pub fn main_entry() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli);

    let outcome = match &cli.command {
        Commands::Keys(args) => {
            let config = resolve_config(&cli, args.default_team.as_deref())?;
            commands::run_keys(&config, &args.snapshots)?
        }
        Commands::Resolve(args) => {
            let config = resolve_config(&cli, args.registry.default_team.as_deref())?;
            commands::run_resolve(&config, &args.registry.snapshots, args.kind, &args.keys)?
        }
        Commands::Encode(args) => commands::run_encode(&args.document)?,
        Commands::Link(args) => {
            let config = resolve_config(&cli, args.registry.default_team.as_deref())?;
            commands::run_link(&config, &args.registry.snapshots, args.text.as_deref())?
        }
        Commands::Strip(args) => {
            let config = resolve_config(&cli, args.registry.default_team.as_deref())?;
            commands::run_strip(&config, &args.registry.snapshots, args.text.as_deref())?
        }
    };

    Ok(finish(&outcome))
}

fn finish(outcome: &Outcome) -> ExitCode {
    if outcome.output.ends_with('\n') {
        print!("{}", outcome.output);
    } else {
        println!("{}", outcome.output);
    }
    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
