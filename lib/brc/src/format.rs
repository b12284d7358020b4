use crate::reducer::GlobalTable;
use crate::statistics::Statistics;
use rayon::prelude::*;

/// Rounds to one decimal place, ties toward positive infinity.
pub fn round_tenth(value: f64) -> f64 {
    // beyond 2^52 every f64 is already whole, and scaling could overflow
    if !value.is_finite() || value.abs() >= 4_503_599_627_370_496.0 {
        return value + 0.0;
    }
    let r = (value * 10.0 + 0.5).floor() / 10.0;
    // normalize -0.0
    r + 0.0
}

/// Entries sorted by key bytes.
pub fn sorted_entries(table: &GlobalTable) -> Vec<(&str, &Statistics)> {
    let mut entries: Vec<(&str, &Statistics)> = table.iter().map(|(k, v)| (k.as_str(), v)).collect();
    entries.par_sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    entries
}

/// Renders `{key=min/avg/max,...}` with keys ascending and one decimal per number.
pub fn format_table(table: &GlobalTable) -> String {
    let entries = sorted_entries(table);
    let mut out = String::with_capacity(2 + entries.len() * 32);
    out.push('{');
    for (i, (key, stats)) in entries.into_iter().enumerate() {
        if i > 0 { out.push(','); }
        out.push_str(&format!(
            "{}={:.1}/{:.1}/{:.1}",
            key,
            round_tenth(stats.min),
            round_tenth(stats.average()),
            round_tenth(stats.max)
        ));
    }
    out.push('}');
    out
}
