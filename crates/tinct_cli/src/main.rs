//! tinct - resolve design-token files from the command line

mod config;
mod output;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tinct_tokens::{ResolveOptions, TokenSet};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{OutputFormat, TinctConfig};

#[derive(Parser)]
#[command(name = "tinct", version, about = "Resolve design-token dictionaries")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to tinct.toml (defaults to ./tinct.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve token files and print the result
    Resolve {
        #[command(flatten)]
        input: InputArgs,

        /// Output format (overrides tinct.toml)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Key leaves by `dot.path` instead of nesting them
        #[arg(long)]
        flat: bool,

        /// Disable pretty printing
        #[arg(long)]
        compact: bool,
    },

    /// Print the dependency-first order of all tokens, one per line
    Order {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Validate token files; fails on cycles and missing references
    Check {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write a default tinct.toml into the current directory
    Init {
        /// Overwrite an existing tinct.toml
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Token files (json, yaml, toml), layered in order after configured layers
    files: Vec<PathBuf>,

    /// Keep unresolved references instead of failing
    #[arg(long)]
    non_strict: bool,

    /// Allow `$group.token` dot-path references
    #[arg(long)]
    dot_path: bool,
}

impl InputArgs {
    fn options(&self, config: &TinctConfig) -> ResolveOptions {
        let mut options = config.resolve;
        if self.non_strict {
            options.strict = false;
        }
        if self.dot_path {
            options.allow_dot_path = true;
        }
        options
    }

    fn load(&self, config: &TinctConfig) -> Result<TokenSet> {
        let paths: Vec<PathBuf> = config
            .layer_paths()
            .into_iter()
            .chain(self.files.iter().cloned())
            .collect();
        if paths.is_empty() {
            bail!("No token files given. Pass files or list them under [layers] in tinct.toml.");
        }

        let mut tokens = TokenSet::new();
        for path in &paths {
            let layer = TokenSet::load(path)
                .with_context(|| format!("Failed to load tokens from {}", path.display()))?;
            tokens.layer(layer);
        }
        info!(files = paths.len(), tokens = tokens.len(), "loaded token layers");
        Ok(tokens)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Resolve {
            input,
            format,
            flat,
            compact,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let tokens = input.load(&config)?;
            let resolution = tokens.resolve(&input.options(&config))?;
            let format = format.unwrap_or(config.output.format);
            let pretty = config.output.pretty && !compact;
            print!("{}", output::render(&resolution.resolved, format, pretty, flat)?);
        }
        Commands::Order { input } => {
            let config = load_config(cli.config.as_deref())?;
            let tokens = input.load(&config)?;
            let options = input.options(&config).with_topo_order(true);
            let resolution = tokens.resolve(&options)?;
            for key in resolution.topo_order.unwrap_or_default() {
                println!("{key}");
            }
        }
        Commands::Check { input } => {
            let config = load_config(cli.config.as_deref())?;
            let tokens = input.load(&config)?;
            println!("{}", check(&tokens, input.options(&config))?);
        }
        Commands::Init { force } => {
            let path = init(&std::env::current_dir()?, force)?;
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<TinctConfig> {
    match path {
        Some(path) => TinctConfig::load(path),
        None => TinctConfig::discover(&std::env::current_dir()?),
    }
}

/// Strict resolution; cycles and missing references are errors
fn check(tokens: &TokenSet, options: ResolveOptions) -> Result<String> {
    let options = options.with_strict(true).with_topo_order(true);
    let resolution = tokens.resolve(&options)?;
    let evaluated = resolution.topo_order.map(|order| order.len()).unwrap_or(0);
    Ok(format!(
        "ok: {} tokens, {} evaluated, no cycles or missing references",
        resolution.resolved.len(),
        evaluated
    ))
}

/// Write a default tinct.toml into `dir`
fn init(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(TinctConfig::FILE_NAME);
    if path.exists() && !force {
        bail!("{} already exists. Use --force to overwrite it.", path.display());
    }
    fs::write(&path, TinctConfig::default().to_toml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
