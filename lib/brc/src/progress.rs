use crate::constants::PROGRESS_BAR_WIDTH;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Position resolution of the bar; fractions are scaled onto this range.
const TICKS: u64 = 10_000;

/// Receives the fraction of input consumed so far.
pub trait ProgressReporter {
    fn update(&mut self, fraction: f64);
    fn finish(&mut self) {}
}

/// Discards all progress updates.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn update(&mut self, _fraction: f64) {}
}

/// Fixed-width `[=====-----] 50%` bar. Draws nothing when the target is not a
/// terminal.
pub struct AsciiProgress {
    bar: ProgressBar,
}

impl AsciiProgress {
    pub fn stderr() -> Result<Self> { Self::new(ProgressDrawTarget::stderr(), PROGRESS_BAR_WIDTH) }

    pub fn new(target: ProgressDrawTarget, width: usize) -> Result<Self> {
        let style = ProgressStyle::with_template(&format!("[{{bar:{}}}] {{percent}}%", width))?.progress_chars("==-");
        let bar = ProgressBar::with_draw_target(Some(TICKS), target).with_style(style);
        Ok(Self { bar })
    }

    /// Current position in ticks out of `TICKS`.
    pub fn position(&self) -> u64 { self.bar.position() }

    pub fn is_finished(&self) -> bool { self.bar.is_finished() }
}

fn ticks(fraction: f64) -> u64 {
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    (fraction * TICKS as f64).round() as u64
}

impl ProgressReporter for AsciiProgress {
    fn update(&mut self, fraction: f64) { self.bar.set_position(ticks(fraction)); }

    fn finish(&mut self) { self.bar.finish(); }
}
