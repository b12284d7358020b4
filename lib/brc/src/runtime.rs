use crate::chunker::{estimate_windows, Chunker};
use crate::config::RunConfig;
use crate::format::format_table;
use crate::io::open_input;
use crate::pool::{ChunkOutput, WorkerPool};
use crate::progress::{NoProgress, ProgressReporter};
use crate::reducer::{GlobalTable, SequencedFold};
use crate::stats::RunStats;
use anyhow::Result;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of one run: the global table plus what it took to build it.
#[derive(Debug)]
pub struct RunReport {
    pub table: GlobalTable,
    pub stats: RunStats,
}

impl RunReport {
    pub fn render(&self) -> String { format_table(&self.table) }
}

/// Chunk -> map -> reduce coordinator.
///
/// The calling thread reads windows and dispatches them; workers only ever see
/// their own chunk. Results are folded on the calling thread as they come back.
pub struct RuntimePipeline {
    config: RunConfig,
}

impl RuntimePipeline {
    pub fn new(config: RunConfig) -> Self { Self { config } }

    pub fn config(&self) -> &RunConfig { &self.config }

    pub fn run_path(&self, path: impl AsRef<Path>, progress: &mut dyn ProgressReporter) -> Result<RunReport> {
        let path = path.as_ref();
        let (reader, len) = open_input(path)?;
        info!(path = %path.display(), bytes = len, "brc starting");
        self.run_reader(reader, len, progress)
    }

    /// Runs over any byte stream. `total_len` only feeds progress and logging.
    pub fn run_reader<R: Read>(&self, reader: R, total_len: u64, progress: &mut dyn ProgressReporter) -> Result<RunReport> {
        self.config.validate()?;
        let cfg = &self.config;
        let started = Instant::now();
        let max_in_flight = cfg.max_in_flight();
        let mut pool = WorkerPool::new(cfg.workers, max_in_flight, cfg.combine)?;
        info!(
            workers = pool.workers(),
            chunk_bytes = cfg.chunk_bytes,
            max_in_flight,
            combine = %cfg.combine,
            expected_windows = estimate_windows(total_len, cfg.chunk_bytes),
            "map phase starting"
        );

        let mut stats = RunStats::new(pool.workers(), total_len);
        let mut fold = SequencedFold::new();
        let mut sink = |out: ChunkOutput| -> Result<usize> {
            stats.record_chunk(&out);
            fold.accept(out);
            Ok(fold.pending())
        };

        let mut chunker = Chunker::new(reader, cfg.chunk_bytes);
        while let Some(chunk) = chunker.next_chunk()? {
            debug!(seq = chunk.seq, bytes = chunk.len(), tail = chunk.is_tail, "chunk ready");
            pool.submit(chunk, &mut sink)?;
            if total_len > 0 {
                progress.update(chunker.bytes_read() as f64 / total_len as f64);
            }
        }
        pool.drain(&mut sink)?;
        progress.update(1.0);
        progress.finish();

        let max_pending = fold.max_pending();
        let (table, counts) = fold.finish();
        stats.windows = chunker.windows_read();
        stats.input_bytes = stats.input_bytes.max(chunker.bytes_read());
        stats.record_reduce(counts, table.len(), max_pending);
        stats.record_wall(started.elapsed());

        info!(phase = "map",
              chunks = stats.map.chunks, lines = stats.map.lines, parsed = stats.map.parsed,
              skipped = stats.map.skipped,
              min_chunk_ms = stats.map.min_chunk_ms, max_chunk_ms = stats.map.max_chunk_ms,
              "Map phase complete");
        info!(phase = "reduce",
              decoded = stats.reduce.decoded, skipped = stats.reduce.skipped, keys = stats.reduce.keys,
              max_pending = stats.reduce.max_pending, wall_ms = stats.wall_ms,
              "Reduce phase complete");

        Ok(RunReport { table, stats })
    }
}

/// Runs the whole pipeline over a file and returns the formatted summary line.
pub fn summarize_file(path: impl AsRef<Path>, config: RunConfig) -> Result<String> {
    let report = RuntimePipeline::new(config).run_path(path, &mut NoProgress)?;
    Ok(report.render())
}

/// Same as [`summarize_file`] for an in-memory input.
pub fn summarize_bytes(input: &[u8], config: RunConfig) -> Result<String> {
    let report = RuntimePipeline::new(config).run_reader(input, input.len() as u64, &mut NoProgress)?;
    Ok(report.render())
}
