pub mod accumulator;
pub mod chunker;
pub mod config;
pub mod constants;
pub mod format;
pub mod io;
pub mod partial;
pub mod pool;
pub mod progress;
pub mod record;
pub mod reducer;
pub mod runtime;
pub mod statistics;
pub mod stats;

pub use accumulator::{summarize_chunk, ChunkAccumulator, ChunkCounts};
pub use chunker::{Chunk, Chunker};
pub use config::{CombineMode, RunConfig};
pub use format::format_table;
pub use partial::PartialRecord;
pub use pool::{ChunkOutput, WorkerPool};
pub use progress::{AsciiProgress, NoProgress, ProgressReporter};
pub use record::{parse_line, Record};
pub use reducer::{GlobalTable, Reducer};
pub use runtime::{summarize_bytes, summarize_file, RunReport, RuntimePipeline};
pub use statistics::Statistics;
pub use stats::RunStats;
