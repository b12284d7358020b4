//! Transport form for per-chunk results.
//!
//! A chunk's partial result is a block of newline-delimited JSON objects, one
//! per key. Each line decodes on its own, so a damaged line costs only that key's
//! contribution from that chunk.

use crate::constants::LINE_TERMINATOR;
use crate::io::split_lines;
use crate::statistics::Statistics;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartialRecord {
    /// Chunk-local average only.
    Average {
        key: String,
        #[serde(with = "float_repr")]
        average: f64,
    },
    /// Chunk-local raw statistics.
    Summary {
        key: String,
        #[serde(with = "float_repr")]
        min: f64,
        #[serde(with = "float_repr")]
        max: f64,
        #[serde(with = "float_repr")]
        sum: f64,
        count: u64,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed partial record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid partial record: {0}")]
    Invalid(&'static str),
}

/// JSON has no infinities, so a sum that overflows is written as the string
/// `"Infinity"`, `"-Infinity"` or `"NaN"` instead of the number.
mod float_repr {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            s.serialize_f64(*value)
        } else if value.is_nan() {
            s.serialize_str("NaN")
        } else if *value > 0.0 {
            s.serialize_str("Infinity")
        } else {
            s.serialize_str("-Infinity")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(t) => match t.as_str() {
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("expected a number, got '{}'", other))),
            },
        }
    }
}

impl PartialRecord {
    pub fn average(key: impl Into<String>, stats: &Statistics) -> Self {
        PartialRecord::Average { key: key.into(), average: stats.average() }
    }

    pub fn summary(key: impl Into<String>, stats: &Statistics) -> Self {
        PartialRecord::Summary { key: key.into(), min: stats.min, max: stats.max, sum: stats.sum, count: stats.count }
    }

    pub fn key(&self) -> &str {
        match self {
            PartialRecord::Average { key, .. } | PartialRecord::Summary { key, .. } => key,
        }
    }

    /// Appends this record as one JSON line.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        serde_json::to_writer(&mut *buf, self)?;
        buf.push(LINE_TERMINATOR);
        Ok(())
    }

    pub fn decode(line: &[u8]) -> Result<Self, DecodeError> {
        let record: PartialRecord = serde_json::from_slice(line)?;
        record.validate()?;
        Ok(record)
    }

    /// Readings are finite, so min and max always are; only an overflowing sum
    /// (and the average derived from it) may be infinite.
    fn validate(&self) -> Result<(), DecodeError> {
        if let PartialRecord::Summary { min, max, count, .. } = self {
            if *count == 0 { return Err(DecodeError::Invalid("zero count")); }
            if !(min.is_finite() && max.is_finite()) {
                return Err(DecodeError::Invalid("non-finite bound"));
            }
            if min > max { return Err(DecodeError::Invalid("min greater than max")); }
        }
        Ok(())
    }
}

/// Splits an encoded block into its record lines, skipping empty ones.
pub fn record_lines(block: &[u8]) -> impl Iterator<Item = &[u8]> + '_ {
    split_lines(block).filter(|line| !line.is_empty())
}
