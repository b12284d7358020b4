use crate::accumulator::{summarize_chunk, ChunkCounts};
use crate::chunker::Chunk;
use crate::config::CombineMode;
use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel as channel;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// What a worker hands back for one chunk.
#[derive(Clone, Debug)]
pub struct ChunkOutput {
    pub seq: usize,
    /// Encoded partial records, one JSON object per line.
    pub partials: Vec<u8>,
    pub counts: ChunkCounts,
    pub bytes: u64,
    pub elapsed: Duration,
}

enum WorkerMsg {
    Done(ChunkOutput),
    Failed { seq: usize, reason: String },
}

/// Fixed-size set of workers running the chunk accumulator.
///
/// Workers share nothing: each job owns its chunk and builds its own table, and
/// the only way out is the result channel. Chunks still running and outputs the
/// sink reports as held back together stay within `max_in_flight`; `submit`
/// blocks on results once that bound is hit.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    mode: CombineMode,
    tx: channel::Sender<WorkerMsg>,
    rx: channel::Receiver<WorkerMsg>,
    in_flight: usize,
    held: usize,
    max_in_flight: usize,
}

impl WorkerPool {
    pub fn new(workers: usize, max_in_flight: usize, mode: CombineMode) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("brc-worker-{}", i))
            .build()
            .context("build worker pool")?;
        let (tx, rx) = channel::unbounded();
        Ok(Self { pool, mode, tx, rx, in_flight: 0, held: 0, max_in_flight: max_in_flight.max(1) })
    }

    pub fn workers(&self) -> usize { self.pool.current_num_threads() }

    pub fn in_flight(&self) -> usize { self.in_flight }

    /// Outputs the sink last reported as not yet consumed.
    pub fn held(&self) -> usize { self.held }

    /// Dispatches one chunk. Finished results are handed to `sink` as they are
    /// collected, either because the bound was reached or because they were
    /// already waiting. The sink returns how many outputs it is still holding.
    pub fn submit<F>(&mut self, chunk: Chunk, sink: &mut F) -> Result<()>
    where
        F: FnMut(ChunkOutput) -> Result<usize>,
    {
        // with nothing running, held outputs cannot be released by waiting
        while self.in_flight > 0 && self.in_flight + self.held >= self.max_in_flight {
            let out = self.recv()?;
            self.held = sink(out)?;
        }
        let seq = chunk.seq;
        let tx = self.tx.clone();
        let mode = self.mode;
        self.pool.spawn(move || {
            let started = Instant::now();
            let bytes = chunk.data.len() as u64;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| summarize_chunk(&chunk.data, mode)));
            let msg = match outcome {
                Ok(Ok((partials, counts))) => {
                    WorkerMsg::Done(ChunkOutput { seq, partials, counts, bytes, elapsed: started.elapsed() })
                }
                Ok(Err(e)) => WorkerMsg::Failed { seq, reason: format!("{:#}", e) },
                Err(payload) => WorkerMsg::Failed { seq, reason: panic_message(payload.as_ref()) },
            };
            // The receiver only goes away when the pool is dropped mid-run.
            let _ = tx.send(msg);
        });
        self.in_flight += 1;
        debug!(seq, in_flight = self.in_flight, "chunk dispatched");
        while let Ok(msg) = self.rx.try_recv() {
            let out = self.accept(msg)?;
            self.held = sink(out)?;
        }
        Ok(())
    }

    /// Blocks until every outstanding chunk has reported.
    pub fn drain<F>(&mut self, sink: &mut F) -> Result<()>
    where
        F: FnMut(ChunkOutput) -> Result<usize>,
    {
        while self.in_flight > 0 {
            let out = self.recv()?;
            self.held = sink(out)?;
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<ChunkOutput> {
        let msg = self.rx.recv().context("worker result channel closed")?;
        self.accept(msg)
    }

    fn accept(&mut self, msg: WorkerMsg) -> Result<ChunkOutput> {
        self.in_flight -= 1;
        match msg {
            WorkerMsg::Done(out) => Ok(out),
            WorkerMsg::Failed { seq, reason } => {
                error!(seq, %reason, "worker failed");
                Err(anyhow!("worker failed on chunk {}: {}", seq, reason))
            }
        }
    }

    /// Runs a batch of chunks to completion and returns outputs in completion order.
    pub fn run_all<I>(&mut self, chunks: I) -> Result<Vec<ChunkOutput>>
    where
        I: IntoIterator<Item = Chunk>,
    {
        let mut outputs = Vec::new();
        let mut sink = |out: ChunkOutput| -> Result<usize> {
            outputs.push(out);
            Ok(0)
        };
        for chunk in chunks { self.submit(chunk, &mut sink)?; }
        self.drain(&mut sink)?;
        if self.in_flight != 0 { bail!("{} chunks still outstanding after drain", self.in_flight); }
        Ok(outputs)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
