mod unit;

use std::ops::Range;

use chrono::{DateTime, Duration, Utc};

use crate::table::SampleTable;

pub use unit::{TimeUnit, UnknownTimeUnit};

/// Lazy iterator over the legs of a table, in chronological order.
///
/// Each step takes the next pending row range, finds its largest gap and
/// either splits the range there or yields it as a leg.
pub struct Legs<'a> {
    table: &'a SampleTable,
    times: Vec<DateTime<Utc>>,
    gap: Duration,
    // ranges still to examine, the earliest on top
    pending: Vec<Range<usize>>,
}

impl<'a> Legs<'a> {
    pub fn new(table: &'a SampleTable, gap: Duration) -> Self {
        Self {
            table,
            times: table.timestamps(),
            gap,
            pending: vec![0..table.len()],
        }
    }
}

impl Iterator for Legs<'_> {
    type Item = SampleTable;

    fn next(&mut self) -> Option<SampleTable> {
        while let Some(range) = self.pending.pop() {
            match largest_gap(&self.times[range.clone()]) {
                Some((at, gap)) if gap > self.gap => {
                    let cut = range.start + at;
                    self.pending.push(cut..range.end);
                    self.pending.push(range.start..cut);
                }
                _ => {
                    log::debug!("leg of {} samples at rows {:?}", range.len(), range);
                    return Some(self.table.slice(range));
                }
            }
        }
        None
    }
}

/// Position and size of the largest difference between consecutive
/// timestamps. The position is the index of the later sample; ties resolve
/// to the earliest gap.
fn largest_gap(timestamps: &[DateTime<Utc>]) -> Option<(usize, Duration)> {
    timestamps
        .windows(2)
        .enumerate()
        .map(|(i, w)| (i + 1, w[1] - w[0]))
        .fold(None, |best, (i, d)| match best {
            Some((_, b)) if b >= d => best,
            _ => Some((i, d)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn table(offsets: &[i64]) -> SampleTable {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let times: Vec<DateTime<Utc>> = offsets.iter().map(|s| t0 + Duration::seconds(*s)).collect();
        let idx = (0..offsets.len()).map(|i| Some(i as f64)).collect();
        SampleTable::new(times).unwrap().with_floats("row", idx).unwrap()
    }

    fn rows(leg: &SampleTable) -> Vec<f64> {
        leg.floats("row").unwrap().into_iter().flatten().collect()
    }

    #[test]
    fn test_largest_gap_prefers_first_tie() {
        let t = table(&[0, 10, 20, 21]);
        assert_eq!(
            largest_gap(&t.timestamps()),
            Some((1, Duration::seconds(10)))
        );
        assert_eq!(largest_gap(&t.timestamps()[..1]), None);
    }

    #[test]
    fn test_several_gaps_in_order() {
        let t = table(&[0, 1, 1000, 1001, 1002, 5000, 9000, 9001]);
        let legs: Vec<Vec<f64>> = Legs::new(&t, Duration::minutes(10))
            .map(|leg| rows(&leg))
            .collect();
        assert_eq!(
            legs,
            vec![
                vec![0.0, 1.0],
                vec![2.0, 3.0, 4.0],
                vec![5.0],
                vec![6.0, 7.0]
            ]
        );
    }

    #[test]
    fn test_gap_equal_to_threshold_does_not_split() {
        let t = table(&[0, 600, 1200]);
        assert_eq!(Legs::new(&t, Duration::minutes(10)).count(), 1);
    }

    #[test]
    fn test_degenerate_tables() {
        let empty = table(&[]);
        let legs: Vec<_> = Legs::new(&empty, Duration::seconds(1)).collect();
        assert_eq!(legs.len(), 1);
        assert!(legs[0].is_empty());

        let single = table(&[0]);
        assert_eq!(Legs::new(&single, Duration::seconds(1)).count(), 1);
    }
}
