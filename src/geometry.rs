//! Placement geometry for footprints.
//!
//! All coordinates are board millimetres with Y pointing up, so a positive
//! angle rotates counter-clockwise on screen. Every function here is pure.
//!
//! A placement is described by an [`Orientation`]: a rotation, the user's
//! horizontal flip toggle, and the board side being edited. Flip and bottom
//! side each mirror X on their own; a flipped pad placed on the bottom is
//! mirrored twice and therefore differs from one that is only side-mirrored.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::model::{Footprint, Pad, PadShape, Side, Technology, Testability};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl FromStr for Point {
    type Err = String;

    /// Parse `"x,y"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected 'x,y', got '{s}'"))?;
        let x = x.trim().parse::<f64>().map_err(|e| format!("bad x in '{s}': {e}"))?;
        let y = y.trim().parse::<f64>().map_err(|e| format!("bad y in '{s}': {e}"))?;
        Ok(Point::new(x, y))
    }
}

/// Rotate `point` about `center` by `angle_deg` (counter-clockwise positive).
pub fn rotate(point: Point, center: Point, angle_deg: f64) -> Point {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(center.x + dx * c - dy * s, center.y + dx * s + dy * c)
}

/// Reflect the X coordinate of `point` about `center.x`.
pub fn mirror_x(point: Point, center: Point) -> Point {
    Point::new(2.0 * center.x - point.x, point.y)
}

/// Rotation, flip toggle and side of a placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub rotation_deg: f64,
    pub flipped: bool,
    pub side: Side,
}

impl Orientation {
    pub fn new(rotation_deg: f64, flipped: bool, side: Side) -> Self {
        Self {
            rotation_deg,
            flipped,
            side,
        }
    }

    /// Add `delta_deg` to the rotation, normalised to `[0, 360)`.
    pub fn rotate_by(&mut self, delta_deg: f64) {
        self.rotation_deg = (self.rotation_deg + delta_deg).rem_euclid(360.0);
    }

    pub fn toggle_flip(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Same flip and side, rotation negated.
    pub fn inverse_rotation(&self) -> Orientation {
        Orientation {
            rotation_deg: -self.rotation_deg,
            ..*self
        }
    }
}

/// Absolute position and angle of one placed pad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedPosition {
    pub x_mm: f64,
    pub y_mm: f64,
    pub angle_deg: f64,
}

/// Transform one pad of a footprint to its absolute position at `target`.
pub fn apply_placement(
    pad: &Pad,
    footprint_center: Point,
    target: Point,
    orientation: &Orientation,
) -> PlacedPosition {
    let origin = Point::default();
    let rel = Point::new(pad.x_mm - footprint_center.x, pad.y_mm - footprint_center.y);
    let mut p = rotate(rel, origin, orientation.rotation_deg);
    if orientation.flipped {
        p = mirror_x(p, origin);
    }
    if orientation.side.is_mirrored() {
        p = mirror_x(p, origin);
    }
    PlacedPosition {
        x_mm: target.x + p.x,
        y_mm: target.y + p.y,
        angle_deg: (pad.angle_deg + orientation.rotation_deg).rem_euclid(360.0),
    }
}

/// Exact inverse of [`apply_placement`]: map an absolute position back into
/// the footprint frame.
pub fn revert_placement(
    placed: Point,
    footprint_center: Point,
    target: Point,
    orientation: &Orientation,
) -> Point {
    let origin = Point::default();
    let mut p = Point::new(placed.x - target.x, placed.y - target.y);
    if orientation.side.is_mirrored() {
        p = mirror_x(p, origin);
    }
    if orientation.flipped {
        p = mirror_x(p, origin);
    }
    let p = rotate(p, origin, -orientation.rotation_deg);
    Point::new(footprint_center.x + p.x, footprint_center.y + p.y)
}

/// A pad after placement, carrying every field a board object needs except
/// component identity and channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedPadRecord {
    pub pin: String,
    pub prefix: Option<String>,
    pub x_mm: f64,
    pub y_mm: f64,
    pub angle_deg: f64,
    pub shape: PadShape,
    pub testability: Testability,
    pub technology: Technology,
    pub side: Side,
}

/// Place every pad of `footprint` at `target`, in footprint order.
pub fn compute_placement(
    footprint: &Footprint,
    target: Point,
    orientation: &Orientation,
) -> Vec<PlacedPadRecord> {
    let center = Point::new(footprint.center_x, footprint.center_y);
    footprint
        .pads
        .iter()
        .map(|pad| {
            let placed = apply_placement(pad, center, target, orientation);
            PlacedPadRecord {
                pin: pad.pin.clone(),
                prefix: pad.prefix.clone(),
                x_mm: placed.x_mm,
                y_mm: placed.y_mm,
                angle_deg: placed.angle_deg,
                shape: pad.shape,
                testability: pad.testability,
                technology: pad.technology,
                side: orientation.side,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_rotate_quarter_turn_is_counter_clockwise() {
        let p = rotate(Point::new(1.0, 0.0), Point::default(), 90.0);
        assert!(close(p, Point::new(0.0, 1.0)));
        let p = rotate(Point::new(3.0, 2.0), Point::new(2.0, 2.0), 180.0);
        assert!(close(p, Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_mirror_x() {
        let p = mirror_x(Point::new(3.0, 5.0), Point::new(1.0, 0.0));
        assert!(close(p, Point::new(-1.0, 5.0)));
    }

    #[test]
    fn test_flip_and_bottom_are_not_collapsed() {
        let pad = Pad::new("1", 1.0, 0.0);
        let c = Point::default();
        let t = Point::new(10.0, 10.0);
        let side_only = apply_placement(&pad, c, t, &Orientation::new(0.0, false, Side::Bottom));
        let flip_and_side = apply_placement(&pad, c, t, &Orientation::new(0.0, true, Side::Bottom));
        let flip_only = apply_placement(&pad, c, t, &Orientation::new(0.0, true, Side::Top));
        assert!((side_only.x_mm - 9.0).abs() < 1e-12);
        assert!((flip_and_side.x_mm - 11.0).abs() < 1e-12);
        assert!((flip_only.x_mm - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_final_angle_wraps() {
        let mut pad = Pad::new("1", 0.0, 0.0);
        pad.angle_deg = 270.0;
        let placed = apply_placement(
            &pad,
            Point::default(),
            Point::default(),
            &Orientation::new(180.0, false, Side::Top),
        );
        assert!((placed.angle_deg - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_orientation_rotate_by_normalises() {
        let mut o = Orientation::default();
        o.rotate_by(-90.0);
        assert_eq!(o.rotation_deg, 270.0);
        o.rotate_by(180.0);
        assert_eq!(o.rotation_deg, 90.0);
    }

    #[test]
    fn test_point_from_str() {
        assert_eq!("1.5, -2".parse::<Point>(), Ok(Point::new(1.5, -2.0)));
        assert!("1.5".parse::<Point>().is_err());
    }
}
