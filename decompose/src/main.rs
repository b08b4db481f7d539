//! Rule-driven decomposition CLI.
//!
//! Loads a gate library (`decompose.toml`) and rewrites operations into
//! finer-grained operations until they are kept or cannot be rewritten.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use decompose::exit_codes;
use decompose::io::config::{DEFAULT_RULES_PATH, RulesFile, StuckMode, write_rules};
use decompose::library::Op;
use decompose::logging;
use decompose::run::{RunOutcome, run_ops};
use decompose::validate::validate_rules;

#[derive(Parser)]
#[command(
    name = "decompose",
    version,
    about = "Recursively decompose operations using a rule library"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a starter rule library.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
        #[arg(long, default_value = DEFAULT_RULES_PATH)]
        rules: PathBuf,
    },
    /// Check the rule library (known gates, arities, target ranges).
    Validate {
        #[arg(long, default_value = DEFAULT_RULES_PATH)]
        rules: PathBuf,
    },
    /// Decompose operations such as `"TOFFOLI a b c"`.
    Run {
        #[arg(long, default_value = DEFAULT_RULES_PATH)]
        rules: PathBuf,
        /// Gate names to keep; overrides `settings.keep`.
        #[arg(long, value_delimiter = ',')]
        keep: Option<Vec<String>>,
        /// Overrides `settings.on_stuck`.
        #[arg(long, value_enum)]
        on_stuck: Option<StuckMode>,
        /// Expand each operation exactly one level.
        #[arg(long)]
        once: bool,
        /// Print a JSON array instead of one operation per line.
        #[arg(long)]
        json: bool,
        #[arg(required = true)]
        ops: Vec<String>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force, rules } => cmd_init(&rules, force),
        Command::Validate { rules } => cmd_validate(&rules),
        Command::Run {
            rules,
            keep,
            on_stuck,
            once,
            json,
            ops,
        } => cmd_run(&rules, keep, on_stuck, once, json, &ops),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if !force && path.exists() {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_rules(path, &RulesFile::sample())?;
    println!("{}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_validate(path: &Path) -> Result<i32> {
    let outcome = validate_rules(path)?.outcome;
    println!(
        "ok: {} gates, {} intercepts, {} fallbacks",
        outcome.gates, outcome.intercepts, outcome.fallbacks
    );
    Ok(exit_codes::OK)
}

fn cmd_run(
    path: &Path,
    keep: Option<Vec<String>>,
    on_stuck: Option<StuckMode>,
    once: bool,
    json: bool,
    ops: &[String],
) -> Result<i32> {
    let loaded = validate_rules(path)?;
    let mut settings = loaded.settings;
    if keep.is_some() {
        settings.keep = keep;
    }
    if on_stuck.is_some() {
        settings.on_stuck = on_stuck;
    }

    match run_ops(&loaded.library, &settings, ops, once)? {
        RunOutcome::Complete(output) => {
            print_ops(&output, json)?;
            Ok(exit_codes::OK)
        }
        RunOutcome::Stuck(message) => {
            eprintln!("{message}");
            Ok(exit_codes::STUCK)
        }
        RunOutcome::NotExpandable(message) => {
            eprintln!("{message}");
            Ok(exit_codes::NOT_EXPANDABLE)
        }
    }
}

fn print_ops(ops: &[Op], json: bool) -> Result<()> {
    if json {
        let payload = serde_json::to_string_pretty(ops).context("serialize operations")?;
        println!("{payload}");
        return Ok(());
    }
    for op in ops {
        println!("{op}");
    }
    Ok(())
}
