use geo::{Coord, Intersects, Line, LinesIter, MultiPolygon, Polygon, Rect};

/// A planar region a flight path can be clipped against.
pub trait ClipShape {
    /// Every boundary segment, interior rings included.
    fn edges(&self) -> Vec<Line<f64>>;

    /// Whether `coord` lies inside the region or on its boundary.
    fn covers(&self, coord: Coord<f64>) -> bool;
}

impl ClipShape for Polygon<f64> {
    fn edges(&self) -> Vec<Line<f64>> {
        self.lines_iter().collect()
    }

    fn covers(&self, coord: Coord<f64>) -> bool {
        self.intersects(&coord)
    }
}

impl ClipShape for MultiPolygon<f64> {
    fn edges(&self) -> Vec<Line<f64>> {
        self.lines_iter().collect()
    }

    fn covers(&self, coord: Coord<f64>) -> bool {
        self.0.iter().any(|p| p.intersects(&coord))
    }
}

impl ClipShape for Rect<f64> {
    fn edges(&self) -> Vec<Line<f64>> {
        self.to_polygon().lines_iter().collect()
    }

    fn covers(&self, coord: Coord<f64>) -> bool {
        let (min, max) = (self.min(), self.max());
        coord.x >= min.x && coord.x <= max.x && coord.y >= min.y && coord.y <= max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon};

    #[test]
    fn test_boundary_is_covered() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)];
        assert!(square.covers(coord! { x: 1.0, y: 1.0 }));
        assert!(square.covers(coord! { x: 2.0, y: 1.0 }));
        assert!(!square.covers(coord! { x: 3.0, y: 1.0 }));
        assert_eq!(square.edges().len(), 4);
    }

    #[test]
    fn test_rect_matches_polygon() {
        let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 2.0 });
        assert!(rect.covers(coord! { x: 0.0, y: 2.0 }));
        assert!(!rect.covers(coord! { x: -0.1, y: 1.0 }));
        assert_eq!(rect.edges().len(), 4);
    }
}
