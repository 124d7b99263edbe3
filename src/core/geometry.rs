//! Position resolution along a primary axis.
//!
//! Overlay paths are described as distances along one axis (how far across the region a
//! banner has travelled) plus a fixed offset on the perpendicular axis. [`resolve`] turns
//! that pair into a 2-D [`Point`].

/// A point in region coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Primary direction of travel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

/// An axis paired with the fixed coordinate on the perpendicular dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisOrth {
    pub axis: Axis,
    pub offset: f64,
}

impl AxisOrth {
    /// Travel along x at height `y`.
    pub const fn horizontal(y: f64) -> Self {
        Self {
            axis: Axis::Horizontal,
            offset: y,
        }
    }

    /// Travel along y at column `x`.
    pub const fn vertical(x: f64) -> Self {
        Self {
            axis: Axis::Vertical,
            offset: x,
        }
    }

    pub fn resolve(self, distance: Option<f64>) -> Option<Point> {
        resolve(distance, self.axis, self.offset)
    }
}

/// Maps a distance along `axis` and an orthogonal offset to a point.
///
/// `None` means "no explicit position"; the render surface picks its default.
pub fn resolve(distance: Option<f64>, axis: Axis, orthogonal: f64) -> Option<Point> {
    let distance = distance?;
    Some(match axis {
        Axis::Horizontal => Point::new(distance, orthogonal),
        Axis::Vertical => Point::new(orthogonal, distance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_puts_distance_on_x() {
        assert_eq!(
            resolve(Some(100.0), Axis::Horizontal, 50.0),
            Some(Point::new(100.0, 50.0))
        );
    }

    #[test]
    fn vertical_puts_distance_on_y() {
        assert_eq!(
            resolve(Some(100.0), Axis::Vertical, 50.0),
            Some(Point::new(50.0, 100.0))
        );
    }

    #[test]
    fn missing_distance_resolves_to_none() {
        assert_eq!(resolve(None, Axis::Horizontal, 50.0), None);
        assert_eq!(resolve(None, Axis::Vertical, -3.0), None);
    }

    #[test]
    fn axis_orth_carries_its_offset() {
        assert_eq!(
            AxisOrth::vertical(12.0).resolve(Some(-40.0)),
            Some(Point::new(12.0, -40.0))
        );
        assert_eq!(AxisOrth::horizontal(0.0).resolve(None), None);
    }
}
