mod clipped;
mod error;
mod identity;

use chrono::{DateTime, Duration, Utc};
use geo::LineString;
use log::warn;

use crate::clip::{clip_windows, ClipShape};
use crate::config::{ResampleConfig, SplitConfig};
use crate::filter::OutlierFilter;
use crate::resample::resample;
use crate::split::{Legs, TimeUnit};
use crate::table::{Sample, SampleTable, TableError};

pub use clipped::{ClipLegs, Clipped};
pub use error::FlightError;
pub use identity::{AircraftInfo, AircraftRegistry, Identity};

#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    data: SampleTable,
}

impl From<SampleTable> for Flight {
    fn from(data: SampleTable) -> Self {
        Self::new(data)
    }
}

impl Flight {
    pub fn new(data: SampleTable) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &SampleTable {
        &self.data
    }

    pub fn into_data(self) -> SampleTable {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.data.timestamps()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.data.time_bounds().map(|(start, _)| start)
    }

    pub fn stop(&self) -> Option<DateTime<Utc>> {
        self.data.time_bounds().map(|(_, stop)| stop)
    }

    pub fn duration(&self) -> Option<Duration> {
        Some(self.stop()? - self.start()?)
    }

    /// Altitude column used for geometry: `baro_altitude` when present.
    pub fn altitude_column(&self) -> Option<&'static str> {
        ["baro_altitude", "altitude"]
            .into_iter()
            .find(|c| self.data.has_column(c))
    }

    /// `(longitude, latitude, altitude)` for every positioned row.
    pub fn coords(&self) -> Result<Vec<(f64, f64, Option<f64>)>, TableError> {
        let altitude = match self.altitude_column() {
            Some(c) => Some(self.data.floats(c)?),
            None => None,
        };
        Ok(self
            .positions()?
            .into_iter()
            .map(|(i, lon, lat)| (lon, lat, altitude.as_ref().and_then(|a| a[i])))
            .collect())
    }

    /// `(longitude, latitude, timestamp)` for every positioned row.
    pub fn xy_time(&self) -> Result<Vec<(f64, f64, DateTime<Utc>)>, TableError> {
        let times = self.timestamps();
        Ok(self
            .positions()?
            .into_iter()
            .map(|(i, lon, lat)| (lon, lat, times[i]))
            .collect())
    }

    pub fn linestring(&self) -> Result<Option<LineString<f64>>, TableError> {
        let points: Vec<(f64, f64)> = self
            .positions()?
            .into_iter()
            .map(|(_, x, y)| (x, y))
            .collect();
        if points.len() < 2 {
            return Ok(None);
        }
        Ok(Some(LineString::from(points)))
    }

    fn positions(&self) -> Result<Vec<(usize, f64, f64)>, TableError> {
        let lon = self.data.floats("longitude")?;
        let lat = self.data.floats("latitude")?;
        Ok(lon
            .into_iter()
            .zip(lat)
            .enumerate()
            .filter_map(|(i, (x, y))| Some((i, x?, y?)))
            .collect())
    }

    /// Rows with a known altitude, i.e. the flight without its ground phases.
    pub fn airborne(&self) -> Result<Flight, TableError> {
        let column = self
            .altitude_column()
            .ok_or_else(|| TableError::ColumnNotFound("altitude".to_string()))?;
        let mask: Vec<bool> = self.data.floats(column)?.iter().map(Option::is_some).collect();
        Ok(Flight::new(self.data.filter(&mask)?))
    }

    // -- Filtering --

    /// Despiked copy of the flight, with the default kernel sizes.
    pub fn filter(
        &self,
        features: Option<&[&str]>,
        kernel_sizes: Option<&[usize]>,
    ) -> Result<Flight, FlightError> {
        self.filter_with(&OutlierFilter::default(), features, kernel_sizes)
    }

    pub fn filter_with(
        &self,
        filter: &OutlierFilter,
        features: Option<&[&str]>,
        kernel_sizes: Option<&[usize]>,
    ) -> Result<Flight, FlightError> {
        Ok(Flight::new(filter.apply(&self.data, features, kernel_sizes)?))
    }

    /// Same as [`Flight::filter`], but overwrites this flight's samples.
    pub fn filter_in_place(
        &mut self,
        features: Option<&[&str]>,
        kernel_sizes: Option<&[usize]>,
    ) -> Result<&mut Self, FlightError> {
        self.filter_in_place_with(&OutlierFilter::default(), features, kernel_sizes)
    }

    pub fn filter_in_place_with(
        &mut self,
        filter: &OutlierFilter,
        features: Option<&[&str]>,
        kernel_sizes: Option<&[usize]>,
    ) -> Result<&mut Self, FlightError> {
        self.data = filter.apply(&self.data, features, kernel_sizes)?;
        Ok(self)
    }

    // -- Segmentation and resampling --

    /// Splits the flight wherever no sample is seen for more than
    /// `value` `unit`s. Legs come out in chronological order.
    pub fn split(&self, value: i64, unit: TimeUnit) -> impl Iterator<Item = Flight> + '_ {
        self.split_by(unit.duration(value))
    }

    pub fn split_by(&self, gap: Duration) -> impl Iterator<Item = Flight> + '_ {
        Legs::new(&self.data, gap).map(Flight::new)
    }

    pub fn split_with(&self, config: &SplitConfig) -> impl Iterator<Item = Flight> + '_ {
        self.split_by(config.gap)
    }

    pub fn resample(&self, period: Duration) -> Result<Flight, FlightError> {
        Ok(Flight::new(resample(&self.data, period)?))
    }

    pub fn resample_with(&self, config: &ResampleConfig) -> Result<Flight, FlightError> {
        self.resample(config.period)
    }

    // -- Time selection --

    /// First sample taken exactly at `time`.
    pub fn at(&self, time: DateTime<Utc>) -> Option<Sample> {
        let index = self.timestamps().iter().position(|t| *t == time)?;
        self.data.row(index)
    }

    /// Samples strictly between `before` and `after`.
    pub fn between(&self, before: DateTime<Utc>, after: DateTime<Utc>) -> Result<Flight, TableError> {
        let mask: Vec<bool> = self
            .timestamps()
            .iter()
            .map(|t| before < *t && *t < after)
            .collect();
        Ok(Flight::new(self.data.filter(&mask)?))
    }

    pub fn between_for(&self, before: DateTime<Utc>, duration: Duration) -> Result<Flight, TableError> {
        self.between(before, before + duration)
    }

    // -- Geometry --

    /// Restricts the flight to the time windows during which its airborne
    /// path lies inside `shape`. A window may hold no sample when the shape
    /// fits between two of them.
    ///
    /// Returns `None` when the path never enters the shape.
    pub fn clip<S: ClipShape + ?Sized>(&self, shape: &S) -> Result<Option<Clipped<'_>>, FlightError> {
        let path = self.airborne()?.xy_time()?;
        if path.len() < 2 {
            return Ok(None);
        }

        let windows = clip_windows(shape, &path);
        Ok(match windows.len() {
            0 => None,
            1 => Some(Clipped::Single(Flight::new(
                self.data.time_window(windows[0].start, windows[0].stop)?,
            ))),
            _ => Some(Clipped::Multiple(ClipLegs::new(self, windows))),
        })
    }

    // -- Identity --

    pub fn callsign(&self) -> Option<Identity> {
        self.identity("callsign", "callsigns")
    }

    /// Transponder address(es) of the aircraft.
    pub fn icao24(&self) -> Option<Identity> {
        self.identity("icao24", "icao24")
    }

    pub fn number(&self) -> Option<Identity> {
        self.identity("number", "numbers")
    }

    pub fn flight_id(&self) -> Option<Identity> {
        self.identity("flight_id", "ids")
    }

    pub fn origin(&self) -> Option<Identity> {
        self.identity("origin", "origins")
    }

    pub fn destination(&self) -> Option<Identity> {
        self.identity("destination", "destinations")
    }

    fn identity(&self, column: &str, plural: &str) -> Option<Identity> {
        let identity = Identity::from_values(&self.data.texts(column).ok()?)?;
        if let Identity::Ambiguous(_) = identity {
            warn!("Several {} for one flight, consider splitting", plural);
        }
        Some(identity)
    }

    pub fn registration(&self, registry: &impl AircraftRegistry) -> Option<String> {
        let icao24 = self.icao24()?;
        registry
            .lookup(icao24.unique()?)
            .map(|info| info.registration)
    }

    /// `icao24 / registration (model)`, or the bare icao24 when the
    /// registry does not know the aircraft.
    pub fn aircraft(&self, registry: &impl AircraftRegistry) -> Option<String> {
        let icao24 = self.icao24()?;
        let icao24 = icao24.unique()?;
        Some(match registry.lookup(icao24) {
            Some(info) => format!("{} / {} ({})", icao24, info.registration, info.model),
            None => icao24.to_string(),
        })
    }
}
