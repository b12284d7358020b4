use crate::config::CombineMode;
use crate::io::split_lines;
use crate::partial::PartialRecord;
use crate::record::parse_line;
use crate::statistics::Statistics;
use anyhow::Result;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkCounts {
    pub lines: u64,
    pub parsed: u64,
    pub skipped: u64,
    pub keys: u64,
}

/// Per-chunk table of raw statistics, keyed by the borrowed key text.
#[derive(Debug, Default)]
pub struct ChunkAccumulator<'a> {
    table: HashMap<&'a str, Statistics>,
    counts: ChunkCounts,
}

impl<'a> ChunkAccumulator<'a> {
    pub fn new() -> Self { Self::default() }

    /// Folds one line in. Lines that are not records only bump the skip counter.
    pub fn push_line(&mut self, line: &'a [u8]) {
        self.counts.lines += 1;
        match parse_line(line) {
            Some(rec) => {
                self.table.entry(rec.key).or_default().add(rec.value);
                self.counts.parsed += 1;
            }
            None => self.counts.skipped += 1,
        }
    }

    pub fn extend_lines<I: IntoIterator<Item = &'a [u8]>>(&mut self, lines: I) {
        for line in lines { self.push_line(line); }
    }

    pub fn get(&self, key: &str) -> Option<&Statistics> { self.table.get(key) }

    pub fn len(&self) -> usize { self.table.len() }

    pub fn is_empty(&self) -> bool { self.table.is_empty() }

    /// Serializes one partial record per key. Iteration order is the hash
    /// map's and carries no meaning.
    pub fn encode(self, mode: CombineMode) -> Result<(Vec<u8>, ChunkCounts)> {
        let mut out = Vec::with_capacity(self.table.len() * 48);
        for (key, stats) in &self.table {
            let record = match mode {
                CombineMode::ChunkAverage => PartialRecord::average(*key, stats),
                CombineMode::Exact => PartialRecord::summary(*key, stats),
            };
            record.encode_into(&mut out)?;
        }
        let counts = ChunkCounts { keys: self.table.len() as u64, ..self.counts };
        Ok((out, counts))
    }
}

/// Runs a whole chunk (a block of complete lines) through the accumulator.
pub fn summarize_chunk(data: &[u8], mode: CombineMode) -> Result<(Vec<u8>, ChunkCounts)> {
    let mut acc = ChunkAccumulator::new();
    acc.extend_lines(split_lines(data));
    acc.encode(mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partial::record_lines;

    fn decode_all(block: &[u8]) -> Vec<PartialRecord> {
        let mut recs: Vec<PartialRecord> = record_lines(block).map(|l| PartialRecord::decode(l).unwrap()).collect();
        recs.sort_by(|a, b| a.key().cmp(b.key()));
        recs
    }

    #[test]
    fn builds_raw_statistics_per_key() {
        let mut acc = ChunkAccumulator::new();
        acc.extend_lines(split_lines(b"A;1.0\nB;5.0\nA;3.0\nnoise\nA;-1.0\n"));
        let a = acc.get("A").unwrap();
        assert_eq!((a.min, a.max, a.sum, a.count), (-1.0, 3.0, 3.0, 3));
        assert_eq!(acc.get("B").unwrap().count, 1);
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn chunk_average_mode_emits_only_averages() {
        let (block, counts) = summarize_chunk(b"StationA;10.0\nStationB;20.0\nStationA;20.0\nStationB;10.0\n", CombineMode::ChunkAverage).unwrap();
        assert_eq!(counts, ChunkCounts { lines: 4, parsed: 4, skipped: 0, keys: 2 });
        assert_eq!(
            decode_all(&block),
            vec![
                PartialRecord::Average { key: "StationA".into(), average: 15.0 },
                PartialRecord::Average { key: "StationB".into(), average: 15.0 },
            ]
        );
    }

    #[test]
    fn exact_mode_emits_full_tuples() {
        let (block, _) = summarize_chunk(b"K;2.5\nK;-0.5\n", CombineMode::Exact).unwrap();
        assert_eq!(
            decode_all(&block),
            vec![PartialRecord::Summary { key: "K".into(), min: -0.5, max: 2.5, sum: 2.0, count: 2 }]
        );
    }

    #[test]
    fn malformed_lines_contribute_nothing() {
        let (block, counts) = summarize_chunk(b"garbage_no_semicolon\nStationC;not_a_number\n\n", CombineMode::ChunkAverage).unwrap();
        assert!(block.is_empty());
        assert_eq!(counts, ChunkCounts { lines: 3, parsed: 0, skipped: 3, keys: 0 });
    }

    #[test]
    fn empty_chunk_emits_nothing() {
        let (block, counts) = summarize_chunk(b"", CombineMode::Exact).unwrap();
        assert!(block.is_empty());
        assert_eq!(counts, ChunkCounts::default());
    }
}
