mod error;

use arrow::datatypes::DataType;
use chrono::{DateTime, Duration, Utc};
use interp1d::Interp1d;

use crate::table::{seconds_between, SampleTable};

pub use error::ResampleError;

/// Reindexes `table` onto the grid `start, start + period, ...` up to the
/// last point not after `stop`.
///
/// Numeric columns are linearly interpolated in time. Text columns carry
/// the latest known value forward. Grid points before the first known value
/// of a column take that first value, so only all-null columns produce nulls.
pub fn resample(table: &SampleTable, period: Duration) -> Result<SampleTable, ResampleError> {
    if period <= Duration::zero() {
        return Err(ResampleError::InvalidPeriod(period));
    }
    if table.len() < 2 {
        return Err(ResampleError::TooFewSamples(table.len()));
    }

    let sorted = table.sort_by_timestamp()?;
    let times = sorted.timestamps();
    let start = times[0];
    let stop = times[times.len() - 1];

    let grid = build_grid(start, stop, period);
    log::debug!(
        "resampling {} samples onto {} grid points every {}",
        sorted.len(),
        grid.len(),
        period
    );

    let offsets: Vec<f64> = times.iter().map(|t| seconds_between(start, *t)).collect();
    let grid_offsets: Vec<f64> = grid.iter().map(|t| seconds_between(start, *t)).collect();

    let mut out = SampleTable::new(grid)?;
    for (name, column) in sorted.columns() {
        out = match column.data_type() {
            DataType::Float64 => {
                let values = interpolate(&offsets, &sorted.floats(name)?, &grid_offsets)?;
                out.with_floats(name, values)?
            }
            _ => out.with_texts(
                name,
                carry_forward(&offsets, &sorted.texts(name)?, &grid_offsets),
            )?,
        };
    }
    Ok(out)
}

fn build_grid(start: DateTime<Utc>, stop: DateTime<Utc>, step: Duration) -> Vec<DateTime<Utc>> {
    let mut cursor = start;
    let mut points = Vec::new();

    while cursor <= stop {
        points.push(cursor);
        cursor += step;
    }

    points
}

fn interpolate(
    offsets: &[f64],
    values: &[Option<f64>],
    grid: &[f64],
) -> Result<Vec<Option<f64>>, ResampleError> {
    let mut xs: Vec<f64> = Vec::new();
    let mut ys: Vec<f64> = Vec::new();
    for (t, v) in offsets.iter().zip(values) {
        // first value wins on repeated timestamps
        if let Some(v) = v {
            if xs.last() != Some(t) {
                xs.push(*t);
                ys.push(*v);
            }
        }
    }

    let (Some(&first_t), Some(&last_t)) = (xs.first(), xs.last()) else {
        return Ok(vec![None; grid.len()]);
    };
    let (first, last) = (ys[0], ys[ys.len() - 1]);
    if xs.len() == 1 {
        return Ok(vec![Some(first); grid.len()]);
    }

    let interp = Interp1d::new_unsorted(xs, ys)
        .map_err(|e| ResampleError::Interpolation(format!("{:?}", e)))?;
    Ok(grid
        .iter()
        .map(|&g| {
            Some(if g <= first_t {
                first
            } else if g >= last_t {
                last
            } else {
                interp.interpolate(g)
            })
        })
        .collect())
}

fn carry_forward(
    offsets: &[f64],
    values: &[Option<String>],
    grid: &[f64],
) -> Vec<Option<String>> {
    let known: Vec<(f64, &String)> = offsets
        .iter()
        .zip(values)
        .filter_map(|(t, v)| v.as_ref().map(|v| (*t, v)))
        .collect();

    grid.iter()
        .map(|&g| {
            let idx = known.partition_point(|(t, _)| *t <= g);
            known
                .get(idx.saturating_sub(1))
                .map(|(_, v)| (*v).clone())
        })
        .collect()
}
