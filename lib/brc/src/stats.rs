use crate::accumulator::ChunkCounts;
use crate::pool::ChunkOutput;
use crate::reducer::ReduceCounts;
use serde::Serialize;
use std::time::Duration;

#[derive(Default, Clone, Debug, Serialize)]
pub struct MapStats {
    pub chunks: u64,
    pub bytes: u64,
    pub lines: u64,
    pub parsed: u64,
    pub skipped: u64,
    pub min_chunk_ms: u64,
    pub max_chunk_ms: u64,
    pub total_chunk_ms: u64,
}

#[derive(Default, Clone, Debug, Serialize)]
pub struct ReduceStats {
    pub chunks: u64,
    pub decoded: u64,
    pub skipped: u64,
    pub keys: u64,
    pub max_pending: u64,
}

/// Numbers gathered over one run, logged at the end and returned to callers.
#[derive(Default, Clone, Debug, Serialize)]
pub struct RunStats {
    pub workers: usize,
    pub input_bytes: u64,
    pub windows: u64,
    pub map: MapStats,
    pub reduce: ReduceStats,
    pub wall_ms: u64,
}

impl RunStats {
    pub fn new(workers: usize, input_bytes: u64) -> Self {
        Self { workers, input_bytes, ..Self::default() }
    }

    pub fn record_chunk(&mut self, output: &ChunkOutput) {
        let ChunkCounts { lines, parsed, skipped, .. } = output.counts;
        let ms = output.elapsed.as_millis() as u64;
        let m = &mut self.map;
        m.min_chunk_ms = if m.chunks == 0 { ms } else { m.min_chunk_ms.min(ms) };
        m.max_chunk_ms = m.max_chunk_ms.max(ms);
        m.total_chunk_ms += ms;
        m.chunks += 1;
        m.bytes += output.bytes;
        m.lines += lines;
        m.parsed += parsed;
        m.skipped += skipped;
    }

    pub fn record_reduce(&mut self, counts: ReduceCounts, keys: usize, max_pending: usize) {
        self.reduce = ReduceStats {
            chunks: counts.chunks,
            decoded: counts.decoded,
            skipped: counts.skipped,
            keys: keys as u64,
            max_pending: max_pending as u64,
        };
    }

    pub fn record_wall(&mut self, wall: Duration) { self.wall_ms = wall.as_millis() as u64; }

    pub fn wall_secs(&self) -> f64 { self.wall_ms as f64 / 1000.0 }
}
