/// Running min/max/sum/count for one key.
///
/// The same type serves both accumulation passes: inside a chunk it is fed raw
/// readings, and in the reducer it is fed one value per chunk (either that
/// chunk's average via [`Statistics::add`] or its full tuple via
/// [`Statistics::merge`]).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: u64,
}

impl Default for Statistics {
    fn default() -> Self {
        Self { min: f64::INFINITY, max: f64::NEG_INFINITY, sum: 0.0, count: 0 }
    }
}

impl Statistics {
    pub fn new() -> Self { Self::default() }

    #[inline]
    pub fn add(&mut self, value: f64) {
        if value < self.min { self.min = value; }
        if value > self.max { self.max = value; }
        self.sum += value;
        self.count += 1;
    }

    /// Tuple-wise combination of two independently built statistics.
    pub fn merge(&mut self, other: &Statistics) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// `sum / count`, or `0.0` while nothing has been added.
    pub fn average(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum / self.count as f64 }
    }

    pub fn is_empty(&self) -> bool { self.count == 0 }
}
