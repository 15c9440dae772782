use anyhow::{Context, Result};
use clap::Parser;
use gcj_sample::{init_tracing_once, load_config, GcjSampler};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

/// Sample Code Jam archive submissions into a per-task directory tree.
#[derive(Parser, Debug)]
#[command(version, about, override_usage = "gcj-sample [OPTIONS] <CONFIG> <INPUT>...\n       gcj-sample --builtin [OPTIONS] <INPUT>...")]
struct Args {
    /// Configuration file followed by input CSV files (or directories of CSVs).
    /// With --builtin every path is an input.
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Use the built-in task table instead of a configuration file.
    #[arg(long)]
    builtin: bool,

    /// Output root directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Contestants sampled per bucket (0 = all).
    #[arg(long)]
    pick_random: Option<usize>,

    /// Compile-check Java submissions.
    #[arg(long)]
    do_compile: bool,

    /// Worker count for extraction.
    #[arg(long)]
    poolsize: Option<usize>,

    /// Seed for reproducible sampling.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the run summary as JSON.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Disable progress bars.
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let (config, inputs) = if args.builtin {
        (None, args.paths.clone())
    } else {
        match args.paths.split_first() {
            Some((cfg, rest)) => (Some(cfg.clone()), rest.to_vec()),
            None => (None, Vec::new()),
        }
    };
    if inputs.is_empty() {
        let prog = std::env::args().next().unwrap_or_else(|| "gcj-sample".to_string());
        eprintln!("usage: {prog} <configuration> <files...>");
        eprintln!("       {prog} --builtin <files...>");
        return Ok(ExitCode::from(2));
    }
    init_tracing_once();

    let (registry, mut opts) = load_config(config.as_deref())?;
    if let Some(dir) = &args.output {
        opts = opts.with_output_root(dir);
    }
    if let Some(n) = args.pick_random {
        opts = opts.with_pick_random(n);
    }
    if args.do_compile {
        opts = opts.with_do_compile(true);
    }
    if let Some(n) = args.poolsize {
        opts = opts.with_pool_size(n);
    }
    if args.seed.is_some() {
        opts = opts.with_seed(args.seed);
    }
    opts = opts.with_progress(!args.no_progress);

    let summary = GcjSampler::with_options(registry, opts).run(&inputs)?;

    if let Some(path) = &args.report {
        let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(f), &summary)
            .with_context(|| format!("write {}", path.display()))?;
    }
    Ok(ExitCode::SUCCESS)
}
