//! Compose prompts from a layout file on the command line.
//!
//! # Examples
//!
//! ```sh
//! # Select fragments by name and print the composed prompts
//! promptloom compose --layout layout.txt --select hair --select "Hair - Blonde"
//!
//! # Apply a preset, then splice onto an existing prompt with a BREAK
//! promptloom compose --layout layout.txt --presets presets.txt \
//!   --preset Portrait --prompt "masterpiece" --use-break
//!
//! # Seeded randomize of a dropdown, JSON output with warnings
//! promptloom compose --layout layout.txt --randomize "Hair colour" --seed 7 --json
//!
//! # Drop this tool's keys from a host config file
//! promptloom clear-config ui-config.json
//! ```

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use promptloom::config::DEFAULT_PLUGIN_TAG;
use promptloom::host::{self, HostPrompt, SpliceOptions};
use promptloom::{Composer, EngineConfig, Error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Interactive prompt composition engine, driven from the command line.
#[derive(Parser)]
#[command(name = "promptloom", version)]
struct Cli {
    /// Log engine activity at info level (RUST_LOG overrides)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a layout, apply selections and print the composed prompts
    Compose(ComposeArgs),

    /// Remove every key containing the plugin tag from a JSON config file
    ClearConfig {
        /// Host config file to rewrite
        file: PathBuf,

        /// Key tag to remove
        #[arg(long, default_value = DEFAULT_PLUGIN_TAG)]
        tag: String,
    },
}

#[derive(clap::Args)]
struct ComposeArgs {
    // ── Inputs ─────────────────────────────────────────────────
    /// Layout DSL file
    #[arg(long)]
    layout: PathBuf,

    /// Presets DSL file
    #[arg(long)]
    presets: Option<PathBuf>,

    /// Engine config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    // ── Interactions, applied in this order ────────────────────
    /// Preset to apply (repeatable)
    #[arg(long = "preset")]
    presets_to_apply: Vec<String>,

    /// Fragment to select (repeatable)
    #[arg(long = "select")]
    selections: Vec<String>,

    /// Label of a dropdown or container to randomize (repeatable)
    #[arg(long = "randomize")]
    randomize: Vec<String>,

    /// Seed for randomize (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    // ── Host splice ────────────────────────────────────────────
    /// Host positive prompt to splice onto
    #[arg(long, default_value = "")]
    prompt: String,

    /// Host negative prompt to splice onto
    #[arg(long, default_value = "")]
    negative: String,

    /// Put the composed text before the host text
    #[arg(long)]
    prepend: bool,

    /// Separate host and composed text with BREAK
    #[arg(long)]
    use_break: bool,

    // ── Output ─────────────────────────────────────────────────
    /// Print JSON including warnings
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Command::Compose(args) => compose(args),
        Command::ClearConfig { file, tag } => host::clear_config(&file, &tag).map(|removed| {
            println!("removed {removed} key(s) from {}", file.display());
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn compose(args: ComposeArgs) -> Result<(), Error> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let mut composer = Composer::open(config, &args.layout, args.presets.as_deref())?;

    for name in &args.presets_to_apply {
        composer.apply_preset(name)?;
    }
    for name in &args.selections {
        composer.select_fragment(name)?;
    }
    for label in &args.randomize {
        let Some(node) = composer.find_node(label) else {
            eprintln!("Warning: no dropdown or container labelled '{label}'");
            continue;
        };
        composer.randomize(node)?;
    }

    let composed = composer.composed();
    let mut spliced = HostPrompt {
        prompt: args.prompt,
        negative_prompt: args.negative,
    };
    host::splice(
        &mut spliced,
        &composed,
        SpliceOptions {
            prepend: args.prepend,
            use_break: args.use_break,
        },
    );

    if args.json {
        let warnings: Vec<String> = composer.warnings().iter().map(ToString::to_string).collect();
        let out = serde_json::json!({
            "prompt": spliced.prompt,
            "negative_prompt": spliced.negative_prompt,
            "composed": composed,
            "warnings": warnings,
        });
        match serde_json::to_string_pretty(&out) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Error: failed to serialize output: {e}"),
        }
    } else {
        println!("{}", spliced.prompt);
        println!("{}", spliced.negative_prompt);
    }
    Ok(())
}
