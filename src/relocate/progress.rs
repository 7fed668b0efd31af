//! Byte-to-percent conversion for progress notifications.

/// Number of progress units in a run.
pub const PROGRESS_UNITS: u8 = 100;

/// Converts copied bytes into whole-percent ticks.
///
/// One unit is `total_bytes / 100` bytes (at least 1). Bytes beyond a full
/// unit carry over to the next call so many small files are not undercounted.
/// The percentage saturates at 100 even when files grew after measurement.
#[derive(Debug, Clone)]
pub struct ProgressMeter {
    bytes_per_unit: u64,
    carried: u64,
    percent: u8,
}

impl ProgressMeter {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            bytes_per_unit: (total_bytes / u64::from(PROGRESS_UNITS)).max(1),
            carried: 0,
            percent: 0,
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn bytes_per_unit(&self) -> u64 {
        self.bytes_per_unit
    }

    /// Account for `bytes` written and return the percentages newly reached,
    /// in increasing order (empty when no unit boundary was crossed).
    pub fn advance(&mut self, bytes: u64) -> std::ops::RangeInclusive<u8> {
        self.carried = self.carried.saturating_add(bytes);
        let units = self.carried / self.bytes_per_unit;
        self.carried %= self.bytes_per_unit;

        let from = self.percent;
        let headroom = u64::from(PROGRESS_UNITS - from);
        self.percent = from + units.min(headroom) as u8;
        (from + 1)..=self.percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_carries_across_calls() {
        let mut m = ProgressMeter::new(1000); // 10 bytes per unit
        assert!(m.advance(7).is_empty());
        assert_eq!(m.advance(7).collect::<Vec<_>>(), vec![1]);
        assert_eq!(m.advance(6).collect::<Vec<_>>(), vec![2]);
        assert_eq!(m.percent(), 2);
    }

    #[test]
    fn large_chunk_emits_every_unit() {
        let mut m = ProgressMeter::new(1000);
        assert_eq!(m.advance(35).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn caps_at_one_hundred() {
        let mut m = ProgressMeter::new(100);
        assert_eq!(m.advance(100).count(), 100);
        assert!(m.advance(50).is_empty());
        assert_eq!(m.percent(), 100);
    }

    #[test]
    fn tiny_totals_use_one_byte_units() {
        let m = ProgressMeter::new(42);
        assert_eq!(m.bytes_per_unit(), 1);
    }

    #[test]
    fn full_run_ticks_close_to_one_hundred() {
        let total = 1_234_567u64;
        let mut m = ProgressMeter::new(total);
        let mut ticks = 0usize;
        let mut left = total;
        while left > 0 {
            let n = left.min(8192);
            ticks += m.advance(n).count();
            left -= n;
        }
        assert_eq!(ticks, 100);
    }
}
