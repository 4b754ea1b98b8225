//! Linkenv CLI Binary
//!
//! Thin shell over the library: decodes flags, gathers dependency roots,
//! and delegates to the assembly pipeline.

use anyhow::Context;
use clap::Parser;
use linkenv::assemble::{assemble, AssembleOptions};
use linkenv::fixup;
use linkenv::logging::init_logging;
use linkenv::materialize::wrapper::CcRedirectWriter;
use std::collections::HashSet;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "linkenv", version, about = "Assemble a relocatable environment from read-only dependency trees")]
struct Cli {
    /// Environment output directory (must hold the bootstrapped skeleton)
    out: PathBuf,

    /// Interpreter installation to link the environment to
    #[arg(long)]
    python: PathBuf,

    /// Dependency roots as a colon separated list (repeatable)
    #[arg(long)]
    deps: Vec<String>,

    /// Read dependency roots from an environment variable (repeatable)
    #[arg(long)]
    env: Vec<String>,

    /// Skip linking path into the environment (glob, repeatable)
    #[arg(long)]
    skip: Vec<String>,

    /// Ignore collisions for path, linking the first root encountered (glob, repeatable)
    #[arg(long = "ignore-collisions")]
    ignore_collisions: Vec<String>,

    /// Build-time interpreter prefix to rewrite in OUT/pyvenv.cfg
    #[arg(long)]
    build_prefix: Option<PathBuf>,

    /// Secondary base prefix to rewrite when cross building
    #[arg(long, requires = "build_prefix")]
    base_prefix: Option<PathBuf>,

    /// Enable logging (filter via LINKENV_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    init_logging(if cli.verbose { "info" } else { "off" });
    info!("linkenv starting");

    if let Err(e) = run(&cli) {
        error!("assembly failed: {:#}", e);
        eprintln!("linkenv: {:#}", e);
        process::exit(1);
    }
    info!("linkenv finished");
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = AssembleOptions {
        out_root: cli.out.clone(),
        interpreter_root: cli.python.clone(),
        roots: collect_roots(&cli.deps, &cli.env),
        skip: cli.skip.clone(),
        ignore_collisions: cli.ignore_collisions.clone(),
    };

    let writer = CcRedirectWriter::from_env();
    assemble(&options, &writer)
        .with_context(|| format!("failed to assemble {}", cli.out.display()))?;

    if let Some(build_prefix) = &cli.build_prefix {
        fixup::rewrite_prefixes(
            &cli.out.join("pyvenv.cfg"),
            build_prefix,
            cli.base_prefix.as_deref(),
            &cli.python,
        )
        .context("failed to rewrite interpreter prefixes")?;
    }

    Ok(())
}

/// Gather dependency roots from `--deps` lists and `--env` variables,
/// dropping duplicates while preserving first-seen order. A missing
/// environment variable contributes nothing.
fn collect_roots(deps: &[String], env_vars: &[String]) -> Vec<PathBuf> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut roots = Vec::new();

    fn extend(list: &str, seen: &mut HashSet<String>, roots: &mut Vec<PathBuf>) {
        for item in list.split(':').filter(|s| !s.is_empty()) {
            if seen.insert(item.to_string()) {
                roots.push(PathBuf::from(item));
            }
        }
    }

    for list in deps {
        extend(list, &mut seen, &mut roots);
    }
    for var in env_vars {
        if let Ok(value) = std::env::var(var) {
            extend(&value, &mut seen, &mut roots);
        }
    }

    roots
}
