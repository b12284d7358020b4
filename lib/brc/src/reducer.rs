use crate::partial::{record_lines, PartialRecord};
use crate::pool::ChunkOutput;
use crate::statistics::Statistics;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Final key -> statistics mapping for one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlobalTable {
    entries: HashMap<String, Statistics>,
}

impl GlobalTable {
    pub fn get(&self, key: &str) -> Option<&Statistics> { self.entries.get(key) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Statistics)> { self.entries.iter() }

    pub fn into_inner(self) -> HashMap<String, Statistics> { self.entries }
}

impl FromIterator<(String, Statistics)> for GlobalTable {
    fn from_iter<I: IntoIterator<Item = (String, Statistics)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReduceCounts {
    pub chunks: u64,
    pub decoded: u64,
    pub skipped: u64,
}

/// Folds encoded partial results into the global table.
///
/// An `average` record counts as one reading of that value; a `summary`
/// record is merged tuple-wise. Records that fail to decode are skipped.
#[derive(Debug, Default)]
pub struct Reducer {
    table: HashMap<String, Statistics>,
    counts: ReduceCounts,
}

impl Reducer {
    pub fn new() -> Self { Self::default() }

    pub fn fold_record(&mut self, record: PartialRecord) {
        match record {
            PartialRecord::Average { key, average } => {
                self.table.entry(key).or_default().add(average);
            }
            PartialRecord::Summary { key, min, max, sum, count } => {
                self.table.entry(key).or_default().merge(&Statistics { min, max, sum, count });
            }
        }
    }

    /// Folds every record of one chunk's encoded output.
    pub fn fold_block(&mut self, block: &[u8]) {
        self.counts.chunks += 1;
        for line in record_lines(block) {
            match PartialRecord::decode(line) {
                Ok(record) => {
                    self.fold_record(record);
                    self.counts.decoded += 1;
                }
                Err(e) => {
                    trace!(error = %e, "skipping partial record");
                    self.counts.skipped += 1;
                }
            }
        }
    }

    pub fn counts(&self) -> ReduceCounts { self.counts }

    pub fn finish(self) -> (GlobalTable, ReduceCounts) {
        (GlobalTable { entries: self.table }, self.counts)
    }
}

/// Buffers chunk outputs that arrive early and releases them in sequence
/// order, so the fold (and its floating point rounding) is the same on every run.
#[derive(Debug, Default)]
pub struct SequencedFold {
    reducer: Reducer,
    pending: BTreeMap<usize, ChunkOutput>,
    next_seq: usize,
    max_pending: usize,
}

impl SequencedFold {
    pub fn new() -> Self { Self::default() }

    /// Takes one output and folds every buffered output that is now in
    /// sequence. Returns how many were folded.
    pub fn accept(&mut self, output: ChunkOutput) -> usize {
        self.pending.insert(output.seq, output);
        self.max_pending = self.max_pending.max(self.pending.len());
        let mut folded = 0;
        while let Some(ready) = self.pending.remove(&self.next_seq) {
            self.reducer.fold_block(&ready.partials);
            self.next_seq += 1;
            folded += 1;
        }
        folded
    }

    /// Outputs buffered while an earlier sequence number is outstanding.
    pub fn pending(&self) -> usize { self.pending.len() }

    /// Largest number of outputs ever held back at once.
    pub fn max_pending(&self) -> usize { self.max_pending }

    /// Folds anything still buffered (gaps in the sequence are tolerated) and
    /// returns the finished table.
    pub fn finish(mut self) -> (GlobalTable, ReduceCounts) {
        for (_, output) in std::mem::take(&mut self.pending) {
            self.reducer.fold_block(&output.partials);
        }
        self.reducer.finish()
    }
}
