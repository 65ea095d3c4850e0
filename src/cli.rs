//! CLI: docs tree → (ir | summary)
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::Config;
use crate::ir::Ir;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// extract a typed IR (structures, enums, flags, endpoints, gateway catalogs, aliases) from a markdown API docs tree
#[derive(Parser, Debug)]
#[command(name = "apidoc-ir", version)]
pub struct CommandLineInterface {
    /// more logging on stderr (-v debug, -vv trace); APIDOC_IR_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// extract and print the merged IR as JSON
    Ir(IrOut),
    /// extract and print per-collection counts
    Summary(SummaryOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// root of the docs tree (paths below it key the per-file rename tables)
    #[arg(long)]
    docs: PathBuf,

    /// JSON config with rename tables, blacklists, seeds and partitions (built-in defaults if omitted)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct IrOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct SummaryOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// also list every identifier
    #[arg(long)]
    list: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_config(&self) -> anyhow::Result<Config> {
        let config = match self.config.as_ref() {
            Some(path) => Config::from_path(path)?,
            None => Config::default(),
        };
        config.validate().context("config rejected")?;
        Ok(config)
    }

    fn extract(&self) -> anyhow::Result<Ir> {
        if !self.docs.is_dir() {
            bail!("docs root {} is not a directory", self.docs.display());
        }
        let config = self.load_config()?;
        let ir = crate::source::extract_tree(&self.docs, &config)
            .with_context(|| format!("failed to extract {}", self.docs.display()))?;
        Ok(ir)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// stderr fmt subscriber; `APIDOC_IR_LOG` takes a full filter directive.
    pub fn init_tracing(&self) {
        let level = match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        let filter = std::env::var("APIDOC_IR_LOG")
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new(format!("apidoc_ir={level}")));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(filter);
        if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
            eprintln!("Warning: tracing subscriber already initialized");
        }
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Ir(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let ir = target.input_settings.extract()?;
                let ir_src = if target.compact {
                    serde_json::to_string(&ir)?
                } else {
                    serde_json::to_string_pretty(&ir)?
                };
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(out, &ir_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    eprintln!("{} {}", "wrote".green().bold(), out.display());
                } else {
                    println!("{ir_src}");
                }
            }
            Command::Summary(target) => {
                let ir = target.input_settings.extract()?;
                print_summary(&ir, target.list);
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn summary_rows(ir: &Ir) -> Vec<(&'static str, Vec<&str>)> {
    vec![
        ("structures", ir.structures.iter().map(|x| x.identifier.as_str()).collect()),
        ("enums", ir.enums.iter().map(|x| x.identifier.as_str()).collect()),
        ("flags", ir.flags.iter().map(|x| x.identifier.as_str()).collect()),
        ("endpoints", ir.endpoints.iter().map(|x| x.route.as_str()).collect()),
        ("gateway", ir.gateway.iter().map(|x| x.identifier.as_str()).collect()),
        ("aliases", ir.aliases.iter().map(|x| x.identifier.as_str()).collect()),
        ("id maps", ir.id_maps.iter().map(|x| x.identifier.as_str()).collect()),
    ]
}

fn print_summary(ir: &Ir, list: bool) {
    for (label, ids) in summary_rows(ir) {
        let count = if ids.is_empty() { ids.len().to_string().yellow() } else { ids.len().to_string().green() };
        println!("{:<12} {}", label.bold(), count);
        if list {
            for id in ids {
                println!("  {}", id.dimmed());
            }
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
