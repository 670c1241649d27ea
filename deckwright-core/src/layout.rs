//! Mapping between the virtual editing canvas and the package's physical
//! coordinate space, plus drop hit-testing for the editor surface.
//!
//! The mapping is a per-axis scale with a shared origin (top-left), so it is
//! exactly invertible up to floating point error.

use crate::types::{Extent, Position, Rect, Size};

/// Tolerance, in physical units, for a virtual/physical round trip
pub const ROUND_TRIP_EPSILON: f64 = 1e-3;

pub const EMU_PER_INCH: f64 = 914_400.0;
pub const EMU_PER_POINT: f64 = 12_700.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutTransform {
    virtual_extent: Extent,
    physical_extent: Extent,
}

impl LayoutTransform {
    /// Non-positive extents are replaced by the defaults (1920x1080 canvas,
    /// widescreen package) so the scale is always finite.
    pub fn new(virtual_extent: Extent, physical_extent: Extent) -> Self {
        Self {
            virtual_extent: usable_or(virtual_extent, Extent::new(1920.0, 1080.0)),
            physical_extent: usable_or(physical_extent, Extent::default()),
        }
    }

    pub fn virtual_extent(&self) -> Extent {
        self.virtual_extent
    }

    pub fn physical_extent(&self) -> Extent {
        self.physical_extent
    }

    fn scale_x(&self) -> f64 {
        self.physical_extent.width / self.virtual_extent.width
    }

    fn scale_y(&self) -> f64 {
        self.physical_extent.height / self.virtual_extent.height
    }

    pub fn to_physical_point(&self, point: Position) -> Position {
        Position::new(point.x * self.scale_x(), point.y * self.scale_y())
    }

    pub fn to_virtual_point(&self, point: Position) -> Position {
        Position::new(point.x / self.scale_x(), point.y / self.scale_y())
    }

    pub fn to_physical_size(&self, size: Size) -> Size {
        Size::new(size.width * self.scale_x(), size.height * self.scale_y())
    }

    pub fn to_virtual_size(&self, size: Size) -> Size {
        Size::new(size.width / self.scale_x(), size.height / self.scale_y())
    }

    pub fn to_physical(&self, rect: Rect) -> Rect {
        Rect::from_parts(
            self.to_physical_point(rect.position()),
            self.to_physical_size(rect.size()),
        )
    }

    pub fn to_virtual(&self, rect: Rect) -> Rect {
        Rect::from_parts(
            self.to_virtual_point(rect.position()),
            self.to_virtual_size(rect.size()),
        )
    }

    /// Physical rect rounded to whole EMU for emission: (x, y, cx, cy)
    pub fn to_emu(&self, rect: Rect) -> (i64, i64, i64, i64) {
        let physical = self.to_physical(rect);
        (
            physical.x.round() as i64,
            physical.y.round() as i64,
            physical.width.round().max(1.0) as i64,
            physical.height.round().max(1.0) as i64,
        )
    }
}

fn usable_or(extent: Extent, fallback: Extent) -> Extent {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if usable(extent.width) && usable(extent.height) {
        extent
    } else {
        fallback
    }
}

/// Round a coordinate to the nearest grid line; a non-positive grid disables snapping
pub fn snap(coord: f64, grid: f64) -> f64 {
    if grid > 0.0 && grid.is_finite() {
        (coord / grid).round() * grid
    } else {
        coord
    }
}

pub fn snap_position(position: Position, grid: f64) -> Position {
    Position::new(snap(position.x, grid), snap(position.y, grid))
}

/// Insertion point for a drop at `pointer` onto `surface`, relative to the
/// surface origin and snapped when a grid is given. `None` when the pointer
/// is not over the surface.
pub fn drop_target(pointer: Position, surface: Rect, grid: Option<f64>) -> Option<Position> {
    if !surface.contains(pointer) {
        return None;
    }

    let local = Position::new(pointer.x - surface.x, pointer.y - surface.y);
    Some(match grid {
        Some(grid) => snap_position(local, grid),
        None => local,
    })
}

/// Points to EMU, rounded
pub fn points_to_emu(points: f64) -> i64 {
    (points * EMU_PER_POINT).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> LayoutTransform {
        LayoutTransform::new(Extent::new(1920.0, 1080.0), Extent::default())
    }

    #[test]
    fn round_trip_stays_within_epsilon() {
        let t = transform();
        let samples = [
            Rect::new(0.0, 0.0, 1.0, 1.0),
            Rect::new(123.456, 789.012, 345.678, 90.123),
            Rect::new(-50.5, -10.25, 1920.0, 1080.0),
            Rect::new(1919.999, 1079.999, 0.001, 0.001),
        ];

        for rect in samples {
            let physical = t.to_physical(rect);
            let back = t.to_physical(t.to_virtual(physical));
            assert!((back.x - physical.x).abs() < ROUND_TRIP_EPSILON);
            assert!((back.y - physical.y).abs() < ROUND_TRIP_EPSILON);
            assert!((back.width - physical.width).abs() < ROUND_TRIP_EPSILON);
            assert!((back.height - physical.height).abs() < ROUND_TRIP_EPSILON);
        }
    }

    #[test]
    fn virtual_coordinates_survive_a_physical_trip() {
        let t = transform();
        for rect in [
            Rect::new(0.0, 0.0, 1.0, 1.0),
            Rect::new(123.456, 789.012, 345.678, 90.123),
            Rect::new(1919.999, 1079.999, 0.001, 0.001),
        ] {
            let back = t.to_virtual(t.to_physical(rect));
            assert!((back.x - rect.x).abs() < ROUND_TRIP_EPSILON);
            assert!((back.y - rect.y).abs() < ROUND_TRIP_EPSILON);
            assert!((back.width - rect.width).abs() < ROUND_TRIP_EPSILON);
            assert!((back.height - rect.height).abs() < ROUND_TRIP_EPSILON);
        }
    }

    #[test]
    fn full_canvas_maps_to_full_slide() {
        let t = transform();
        let physical = t.to_physical(Rect::new(0.0, 0.0, 1920.0, 1080.0));
        assert_eq!(physical.width, 12_192_000.0);
        assert_eq!(physical.height, 6_858_000.0);
        assert_eq!(t.to_emu(Rect::new(960.0, 540.0, 960.0, 540.0)), (6_096_000, 3_429_000, 6_096_000, 3_429_000));
    }

    #[test]
    fn degenerate_extent_falls_back() {
        let t = LayoutTransform::new(Extent::new(0.0, 1080.0), Extent::new(-1.0, f64::NAN));
        assert_eq!(t.virtual_extent(), Extent::new(1920.0, 1080.0));
        assert_eq!(t.physical_extent(), Extent::default());
    }

    #[test]
    fn snap_rounds_to_nearest_grid_line() {
        assert_eq!(snap(14.0, 10.0), 10.0);
        assert_eq!(snap(15.0, 10.0), 20.0);
        assert_eq!(snap(-14.0, 10.0), -10.0);
        assert_eq!(snap(14.0, 0.0), 14.0);
    }

    #[test]
    fn drop_target_is_relative_and_snapped() {
        let surface = Rect::new(100.0, 50.0, 1920.0, 1080.0);

        let unsnapped = drop_target(Position::new(233.0, 97.0), surface, None).unwrap();
        assert_eq!(unsnapped, Position::new(133.0, 47.0));

        let snapped = drop_target(Position::new(233.0, 97.0), surface, Some(10.0)).unwrap();
        assert_eq!(snapped, Position::new(130.0, 50.0));

        assert!(drop_target(Position::new(10.0, 10.0), surface, Some(10.0)).is_none());
    }
}
