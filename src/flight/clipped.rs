use crate::clip::TimeWindow;
use crate::table::TableError;

use super::Flight;

/// Outcome of clipping a flight that overlaps the shape.
pub enum Clipped<'a> {
    /// The path enters the shape once.
    Single(Flight),
    /// The path enters the shape several times; one flight per visit.
    Multiple(ClipLegs<'a>),
}

impl Clipped<'_> {
    pub fn into_flights(self) -> Result<Vec<Flight>, TableError> {
        match self {
            Clipped::Single(flight) => Ok(vec![flight]),
            Clipped::Multiple(legs) => legs.collect(),
        }
    }
}

/// Lazily cuts one flight per time window, in chronological order.
pub struct ClipLegs<'a> {
    flight: &'a Flight,
    windows: std::vec::IntoIter<TimeWindow>,
}

impl<'a> ClipLegs<'a> {
    pub(super) fn new(flight: &'a Flight, windows: Vec<TimeWindow>) -> Self {
        Self {
            flight,
            windows: windows.into_iter(),
        }
    }
}

impl Iterator for ClipLegs<'_> {
    type Item = Result<Flight, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.windows.next()?;
        Some(
            self.flight
                .data()
                .time_window(window.start, window.stop)
                .map(Flight::new),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.windows.size_hint()
    }
}
