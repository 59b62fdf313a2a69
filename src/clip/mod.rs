mod shape;

use chrono::{DateTime, Duration, Utc};
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line};

use crate::table::seconds_between;

pub use shape::ClipShape;

const PARAM_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedCoord {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

impl TimedCoord {
    fn xy(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    fn lerp(&self, other: &TimedCoord, s: f64) -> TimedCoord {
        if s == 0.0 {
            return *self;
        }
        if s == 1.0 {
            return *other;
        }
        TimedCoord {
            x: self.x + (other.x - self.x) * s,
            y: self.y + (other.y - self.y) * s,
            t: self.t + (other.t - self.t) * s,
        }
    }
}

/// Closed time interval covered by one piece of an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

/// Pieces of `path` lying inside `shape`, in path order.
///
/// Consecutive covered stretches merge into a single piece. Pieces made of
/// a single point (the path only touching the shape) are dropped.
pub fn intersect_path<S: ClipShape + ?Sized>(shape: &S, path: &[TimedCoord]) -> Vec<Vec<TimedCoord>> {
    let edges = shape.edges();
    let mut pieces = Vec::new();
    let mut current: Vec<TimedCoord> = Vec::new();

    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let degenerate = a.xy() == b.xy();
        let params = if degenerate {
            vec![0.0, 1.0]
        } else {
            cut_params(&edges, &a, &b)
        };

        for span in params.windows(2) {
            let (s0, s1) = (span[0], span[1]);
            let midpoint = if degenerate {
                a.xy()
            } else {
                a.lerp(&b, (s0 + s1) / 2.0).xy()
            };

            if shape.covers(midpoint) {
                push_distinct(&mut current, a.lerp(&b, s0));
                push_distinct(&mut current, a.lerp(&b, s1));
            } else if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }

    pieces.retain(|p| p.len() >= 2);
    pieces
}

/// Time windows, in chronological order, during which a path sampled at
/// `(longitude, latitude, timestamp)` lies inside `shape`.
pub fn clip_windows<S: ClipShape + ?Sized>(
    shape: &S,
    points: &[(f64, f64, DateTime<Utc>)],
) -> Vec<TimeWindow> {
    let Some(&(_, _, base)) = points.first() else {
        return Vec::new();
    };
    let path: Vec<TimedCoord> = points
        .iter()
        .map(|&(x, y, t)| TimedCoord {
            x,
            y,
            t: seconds_between(base, t),
        })
        .collect();

    let mut windows: Vec<TimeWindow> = intersect_path(shape, &path)
        .iter()
        .map(|piece| {
            let (lo, hi) = piece
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
                    (lo.min(c.t), hi.max(c.t))
                });
            TimeWindow {
                start: time_at(&path, points, lo),
                stop: time_at(&path, points, hi),
            }
        })
        .collect();
    windows.sort_by_key(|w| w.start);

    log::debug!("path of {} points clipped into {} windows", points.len(), windows.len());
    windows
}

/// Timestamp of a path time. Times falling on a sample map back to that
/// sample's own timestamp.
fn time_at(path: &[TimedCoord], points: &[(f64, f64, DateTime<Utc>)], t: f64) -> DateTime<Utc> {
    path.iter()
        .zip(points)
        .find(|(c, _)| c.t == t)
        .map(|(_, &(_, _, sample))| sample)
        .unwrap_or_else(|| points[0].2 + Duration::nanoseconds((t * 1e9).round() as i64))
}

/// Sorted positions along `a -> b`, in `[0, 1]`, where the segment meets
/// a shape edge. Always starts at 0 and ends at 1.
fn cut_params(edges: &[Line<f64>], a: &TimedCoord, b: &TimedCoord) -> Vec<f64> {
    let segment = Line::new(a.xy(), b.xy());
    let mut params = vec![0.0, 1.0];

    for edge in edges {
        match line_intersection(segment, *edge) {
            Some(LineIntersection::SinglePoint { intersection, .. }) => {
                params.push(param_of(a, b, intersection));
            }
            Some(LineIntersection::Collinear { intersection }) => {
                params.push(param_of(a, b, intersection.start));
                params.push(param_of(a, b, intersection.end));
            }
            None => {}
        }
    }

    params.sort_by(|x, y| x.total_cmp(y));
    params.dedup_by(|x, y| (*x - *y).abs() < PARAM_EPSILON);
    params
}

fn param_of(a: &TimedCoord, b: &TimedCoord, p: Coord<f64>) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
}

fn push_distinct(piece: &mut Vec<TimedCoord>, point: TimedCoord) {
    if piece.last() != Some(&point) {
        piece.push(point);
    }
}
