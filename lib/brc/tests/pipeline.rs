use brc::reducer::SequencedFold;
use brc::{
    format_table, summarize_bytes, summarize_chunk, summarize_file, Chunk, ChunkOutput, CombineMode, NoProgress,
    Reducer, RunConfig, RuntimePipeline, WorkerPool,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io::Write;

const FOUR_LINES: &[u8] = b"StationA;10.0\nStationB;20.0\nStationA;20.0\nStationB;10.0\n";

fn config(chunk_bytes: usize, workers: usize) -> RunConfig {
    RunConfig::new().with_chunk_bytes(chunk_bytes).with_workers(workers)
}

#[test]
fn single_chunk_reports_raw_statistics() {
    let out = summarize_bytes(FOUR_LINES, config(4 * 1024 * 1024, 4)).unwrap();
    assert_eq!(out, "{StationA=10.0/15.0/20.0,StationB=10.0/15.0/20.0}");
}

#[test]
fn two_chunks_report_statistics_of_chunk_averages() {
    // 28 bytes is exactly the first two lines, so each chunk sees one reading per key.
    let split = summarize_bytes(FOUR_LINES, config(28, 2)).unwrap();
    assert_eq!(split, "{StationA=15.0/15.0/15.0,StationB=15.0/15.0/15.0}");

    let whole = summarize_bytes(FOUR_LINES, config(1024, 2)).unwrap();
    assert_ne!(split, whole, "chunk-average combination depends on chunk size");
}

#[test]
fn exact_combination_is_chunk_size_independent() {
    for chunk_bytes in [1, 7, 28, 1024] {
        let cfg = config(chunk_bytes, 3).with_combine(CombineMode::Exact);
        assert_eq!(summarize_bytes(FOUR_LINES, cfg).unwrap(), "{StationA=10.0/15.0/20.0,StationB=10.0/15.0/20.0}");
    }
}

#[test]
fn malformed_lines_are_dropped() {
    let input = b"garbage_no_semicolon\nStationC;not_a_number\nStationA;1.5\n\n   \n";
    assert_eq!(summarize_bytes(input, config(1024, 2)).unwrap(), "{StationA=1.5/1.5/1.5}");
}

#[test]
fn empty_input_renders_empty_braces() {
    assert_eq!(summarize_bytes(b"", config(1024, 2)).unwrap(), "{}");
    let file = tempfile::NamedTempFile::new().unwrap();
    assert_eq!(summarize_file(file.path(), config(1024, 2)).unwrap(), "{}");
}

#[test]
fn missing_trailing_newline_still_counts_last_record() {
    let out = summarize_bytes(b"A;1.0\nB;2.0", config(1024, 1).with_combine(CombineMode::Exact)).unwrap();
    assert_eq!(out, "{A=1.0/1.0/1.0,B=2.0/2.0/2.0}");
}

#[test]
fn missing_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = summarize_file(dir.path().join("nope.txt"), RunConfig::new()).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.txt"));
}

fn synthetic_input(rows: usize) -> Vec<u8> {
    let names = ["Abha", "Accra", "Bulawayo", "Hamburg", "Oslo", "Zürich", "St. John's"];
    let mut out = Vec::new();
    for i in 0..rows {
        let value = ((i * 37) % 999) as f64 / 10.0 - 49.9;
        writeln!(out, "{};{:.1}", names[i % names.len()], value).unwrap();
    }
    out
}

#[test]
fn reruns_are_byte_identical() {
    let input = synthetic_input(5000);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&input).unwrap();
    for mode in [CombineMode::ChunkAverage, CombineMode::Exact] {
        let cfg = config(997, 4).with_combine(mode);
        let first = summarize_file(file.path(), cfg.clone()).unwrap();
        for _ in 0..3 {
            assert_eq!(summarize_file(file.path(), cfg.clone()).unwrap(), first);
        }
    }
}

#[test]
fn worker_count_does_not_change_results() {
    let input = synthetic_input(3000);
    let one = summarize_bytes(&input, config(512, 1)).unwrap();
    let many = summarize_bytes(&input, config(512, 8).with_max_in_flight(3)).unwrap();
    assert_eq!(one, many);
}

#[test]
fn reduce_order_does_not_matter() {
    // Quarter-degree values and four readings per key per chunk keep every sum
    // and every chunk average exact, so any fold order agrees bit for bit.
    let chunks: Vec<Vec<u8>> = (0..40)
        .map(|c| {
            let mut data = Vec::new();
            for i in 0..24 {
                writeln!(data, "K{};{}", (c + i) % 6, ((c * 24 + i) % 80) as f64 * 0.25 - 10.0).unwrap();
            }
            data
        })
        .collect();

    for mode in [CombineMode::ChunkAverage, CombineMode::Exact] {
        let blocks: Vec<Vec<u8>> = chunks.iter().map(|c| summarize_chunk(c, mode).unwrap().0).collect();

        let mut in_order = Reducer::new();
        for b in &blocks { in_order.fold_block(b); }
        let (expected, _) = in_order.finish();

        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..10 {
            let mut shuffled: Vec<&Vec<u8>> = blocks.iter().collect();
            shuffled.shuffle(&mut rng);
            let mut r = Reducer::new();
            for b in shuffled { r.fold_block(b); }
            let (table, _) = r.finish();
            assert_eq!(table, expected);
            assert_eq!(format_table(&table), format_table(&expected));
        }
    }
}

fn line_chunks(input: &[u8], lines_per_chunk: usize) -> Vec<Vec<u8>> {
    let lines: Vec<&[u8]> = input.split_inclusive(|b| *b == b'\n').collect();
    lines.chunks(lines_per_chunk).map(|group| group.concat()).collect()
}

fn fold_through_pool(chunks: Vec<Chunk>, mode: CombineMode) -> brc::GlobalTable {
    let mut pool = WorkerPool::new(4, 3, mode).unwrap();
    let mut fold = SequencedFold::new();
    let mut sink = |out: ChunkOutput| -> anyhow::Result<usize> {
        fold.accept(out);
        Ok(fold.pending())
    };
    for chunk in chunks { pool.submit(chunk, &mut sink).unwrap(); }
    pool.drain(&mut sink).unwrap();
    fold.finish().0
}

#[test]
fn dispatch_order_does_not_change_the_table() {
    // Tenth-degree values keep the sums inexact, so only a fold in sequence
    // order reproduces the in-order table bit for bit.
    let chunks = line_chunks(&synthetic_input(2000), 37);
    for mode in [CombineMode::ChunkAverage, CombineMode::Exact] {
        let mut in_order = Reducer::new();
        for c in &chunks { in_order.fold_block(&summarize_chunk(c, mode).unwrap().0); }
        let (expected, _) = in_order.finish();

        let mut rng = StdRng::seed_from_u64(0xc0ffee);
        for _ in 0..5 {
            let mut shuffled: Vec<Chunk> = chunks
                .iter()
                .enumerate()
                .map(|(seq, data)| Chunk { seq, data: data.clone(), is_tail: false })
                .collect();
            shuffled.shuffle(&mut rng);
            assert_eq!(fold_through_pool(shuffled, mode), expected);
        }

        // Gaps in the sequence leave outputs buffered until the final flush.
        let gapped: Vec<Chunk> = chunks
            .iter()
            .enumerate()
            .map(|(i, data)| Chunk { seq: 2 * i, data: data.clone(), is_tail: false })
            .collect();
        let table = fold_through_pool(gapped, mode);
        assert_eq!(table, expected);
        assert_eq!(format_table(&table), format_table(&expected));
    }
}

#[test]
fn overflowing_sums_keep_their_key() {
    let input = b"Big;1e308\nBig;1e308\nSmall;1.0\n";
    for mode in [CombineMode::ChunkAverage, CombineMode::Exact] {
        let out = summarize_bytes(input, config(1024, 2).with_combine(mode)).unwrap();
        assert!(out.starts_with("{Big="), "{}", out);
        assert!(out.contains("/inf/"), "{}", out);
        assert!(out.ends_with(",Small=1.0/1.0/1.0}"), "{}", out);
    }
    // Across chunks the overflow happens in the reducer instead.
    let out = summarize_bytes(input, config(10, 2).with_combine(CombineMode::Exact)).unwrap();
    assert!(out.contains("/inf/") && out.contains("Small=1.0/1.0/1.0"), "{}", out);
}

#[test]
fn report_exposes_table_and_stats() {
    let input = synthetic_input(700);
    let report = RuntimePipeline::new(config(256, 2)).run_reader(&input[..], input.len() as u64, &mut NoProgress).unwrap();
    assert_eq!(report.table.len(), 7);
    assert_eq!(report.stats.map.parsed, 700);
    assert_eq!(report.stats.map.chunks, report.stats.reduce.chunks);
    assert_eq!(report.stats.reduce.skipped, 0);
    assert!(report.render().starts_with("{Abha="));
}
