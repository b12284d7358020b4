use anyhow::Result;
use brc::{AsciiProgress, CombineMode, NoProgress, ProgressReporter, RunConfig, RuntimePipeline};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "brc", about = "Per-key min/avg/max over a key;value file")]
struct Args {
    /// Input file, one `key;value` record per line
    input: PathBuf,
    /// Bytes read per chunk
    #[arg(long)]
    chunk_bytes: Option<usize>,
    /// Worker threads (defaults to the number of cores)
    #[arg(long)]
    workers: Option<usize>,
    /// Chunks allowed in flight before reading pauses
    #[arg(long)]
    max_in_flight: Option<usize>,
    /// How chunk results are combined: chunk-average or exact
    #[arg(long)]
    combine: Option<CombineMode>,
    /// Draw a progress bar on stderr
    #[arg(long)]
    progress: bool,
}

impl Args {
    fn run_config(&self) -> RunConfig {
        let mut cfg = RunConfig::from_env();
        if let Some(n) = self.chunk_bytes { cfg = cfg.with_chunk_bytes(n); }
        if let Some(n) = self.workers { cfg = cfg.with_workers(n); }
        if let Some(n) = self.max_in_flight { cfg = cfg.with_max_in_flight(n); }
        if let Some(mode) = self.combine { cfg = cfg.with_combine(mode); }
        cfg
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    let args = Args::parse();

    let pipeline = RuntimePipeline::new(args.run_config());
    let mut bar;
    let mut quiet = NoProgress;
    let progress: &mut dyn ProgressReporter = if args.progress {
        bar = AsciiProgress::stderr()?;
        &mut bar
    } else {
        &mut quiet
    };

    let report = pipeline.run_path(&args.input, progress)?;
    info!("Processing completed in {:.2} seconds.", report.stats.wall_secs());
    println!("{}", report.render());
    Ok(())
}
