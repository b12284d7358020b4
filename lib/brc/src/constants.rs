//! Tuning knobs and wire bytes shared across the crate.
//!
//! `BRC_*` variables override the defaults below; CLI flags override both.

pub const ENV_CHUNK_BYTES: &str = "BRC_CHUNK_BYTES";
pub const ENV_WORKERS: &str = "BRC_WORKERS";
pub const ENV_MAX_IN_FLIGHT: &str = "BRC_MAX_IN_FLIGHT";
pub const ENV_COMBINE: &str = "BRC_COMBINE";

pub const DEFAULT_CHUNK_BYTES: usize = 4 * 1024 * 1024;
/// Chunks per worker allowed between dispatch and fold before reading pauses.
pub const DEFAULT_IN_FLIGHT_PER_WORKER: usize = 2;

/// Width of the ASCII progress bar in cells.
pub const PROGRESS_BAR_WIDTH: usize = 50;

pub const KEY_SEPARATOR: u8 = b';';
pub const LINE_TERMINATOR: u8 = b'\n';
