use crate::constants::{
    DEFAULT_CHUNK_BYTES, DEFAULT_IN_FLIGHT_PER_WORKER, ENV_CHUNK_BYTES, ENV_COMBINE, ENV_MAX_IN_FLIGHT, ENV_WORKERS,
};
use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// How per-chunk results are combined across chunks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CombineMode {
    /// Each chunk contributes only its average, which the reducer treats as a
    /// single reading. Results depend on the chunk size.
    #[default]
    ChunkAverage,
    /// Each chunk contributes its raw min/max/sum/count tuple.
    Exact,
}

impl FromStr for CombineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chunk-average" | "chunk_average" | "average" => Ok(CombineMode::ChunkAverage),
            "exact" | "summary" => Ok(CombineMode::Exact),
            other => Err(format!("unknown combine mode '{}' (expected chunk-average or exact)", other)),
        }
    }
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombineMode::ChunkAverage => f.write_str("chunk-average"),
            CombineMode::Exact => f.write_str("exact"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub chunk_bytes: usize,
    pub workers: usize,
    /// Explicit bound; `None` scales with `workers`.
    pub max_in_flight: Option<usize>,
    pub combine: CombineMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            workers: num_cpus::get().max(1),
            max_in_flight: None,
            combine: CombineMode::default(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self { Self::default() }

    /// Defaults overlaid with `BRC_*` environment overrides. Values that do not
    /// parse are ignored.
    pub fn from_env() -> Self { Self::from_lookup(|name| std::env::var(name).ok()) }

    /// Same as [`RunConfig::from_env`] with variables read through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(n) = parse_var::<usize>(&lookup, ENV_CHUNK_BYTES) { cfg.chunk_bytes = n; }
        if let Some(n) = parse_var::<usize>(&lookup, ENV_WORKERS) { cfg.workers = n; }
        if let Some(n) = parse_var::<usize>(&lookup, ENV_MAX_IN_FLIGHT) { cfg.max_in_flight = Some(n); }
        if let Some(mode) = parse_var::<CombineMode>(&lookup, ENV_COMBINE) { cfg.combine = mode; }
        cfg
    }

    /// Effective in-flight bound.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.unwrap_or_else(|| self.workers.saturating_mul(DEFAULT_IN_FLIGHT_PER_WORKER))
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes;
        self
    }

    /// Sets the worker count. An explicit in-flight bound is left alone.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = Some(max_in_flight);
        self
    }

    pub fn with_combine(mut self, combine: CombineMode) -> Self {
        self.combine = combine;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_bytes == 0 { bail!("chunk size must be at least 1 byte"); }
        if self.workers == 0 { bail!("worker count must be at least 1"); }
        if self.max_in_flight() == 0 { bail!("max in-flight chunks must be at least 1"); }
        Ok(())
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}
