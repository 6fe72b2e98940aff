use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process-unique identifier of a placed pad.
pub type Channel = u32;

// ────────────────────────────────────────────────────────────────────────────
// Enumerations
// ────────────────────────────────────────────────────────────────────────────

/// Which face of the board a pad is placed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Top,
    Bottom,
    Both,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Both => "both",
        }
    }

    /// True when placement on this side mirrors X.
    pub fn is_mirrored(self) -> bool {
        matches!(self, Side::Bottom)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" | "t" => Ok(Side::Top),
            "bottom" | "b" => Ok(Side::Bottom),
            "both" | "o" => Ok(Side::Both),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technology {
    #[default]
    #[serde(rename = "SMD")]
    Smd,
    #[serde(rename = "Through Hole")]
    ThroughHole,
    Mechanical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Testability {
    Forced,
    Testable,
    #[default]
    #[serde(rename = "Not Testable")]
    NotTestable,
    Terminal,
}

/// Geometric kind of a pad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    Round,
    #[serde(rename = "Round with Hole")]
    RoundWithHole,
    Ellipse,
    #[serde(rename = "Square/rectangle")]
    Rectangle,
    #[serde(rename = "Square/rectangle with Hole")]
    RectangleWithHole,
    Hole,
}

impl ShapeKind {
    pub fn has_hole(self) -> bool {
        matches!(
            self,
            ShapeKind::RoundWithHole | ShapeKind::RectangleWithHole | ShapeKind::Hole
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shape / Pad / Footprint
// ────────────────────────────────────────────────────────────────────────────

/// Shape descriptor shared by templates and placed pads. Dimensions in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PadShape {
    pub kind: ShapeKind,
    pub width_mm: f64,
    pub height_mm: f64,
    #[serde(default)]
    pub hole_mm: f64,
}

impl Default for PadShape {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Round,
            width_mm: 0.5,
            height_mm: 0.5,
            hole_mm: 0.0,
        }
    }
}

impl PadShape {
    pub fn new(kind: ShapeKind, width_mm: f64, height_mm: f64, hole_mm: f64) -> Self {
        Self {
            kind,
            width_mm,
            height_mm,
            hole_mm,
        }
    }

    /// Axis-aligned half extents `(hx, hy)` of the pad rotated by `angle_deg`.
    pub fn half_extents(&self, angle_deg: f64) -> (f64, f64) {
        let (s, c) = angle_deg.to_radians().sin_cos();
        let (w, h) = (self.width_mm, self.height_mm);
        (
            0.5 * (w * c.abs() + h * s.abs()),
            0.5 * (w * s.abs() + h * c.abs()),
        )
    }
}

/// A pad template: not yet placed, positioned in its footprint's frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub pin: String,
    pub x_mm: f64,
    pub y_mm: f64,
    #[serde(default)]
    pub shape: PadShape,
    #[serde(default)]
    pub angle_deg: f64,
    #[serde(default)]
    pub testability: Testability,
    #[serde(default)]
    pub technology: Technology,
    #[serde(default)]
    pub prefix: Option<String>,
    /// Explicit copy order; when every pad of a source carries one the
    /// footprint is sorted by it.
    #[serde(default)]
    pub order: Option<usize>,
}

impl Pad {
    pub fn new(pin: impl Into<String>, x_mm: f64, y_mm: f64) -> Self {
        Self {
            pin: pin.into(),
            x_mm,
            y_mm,
            shape: PadShape::default(),
            angle_deg: 0.0,
            testability: Testability::default(),
            technology: Technology::default(),
            prefix: None,
            order: None,
        }
    }

    pub fn with_shape(mut self, shape: PadShape) -> Self {
        self.shape = shape;
        self
    }

    /// Numeric value of the pin label, if it is a plain integer.
    pub fn pin_number(&self) -> Option<u32> {
        parse_pin(&self.pin)
    }
}

/// Ordered pads sharing a geometric centre.
///
/// Order is meaningful: it is the precedence used when pins are merged into an
/// existing component and, for generated grids, the numbering traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub pads: Vec<Pad>,
    pub center_x: f64,
    pub center_y: f64,
}

impl Footprint {
    /// Build a footprint centred on the bounding-box midpoint of its pads.
    pub fn new(pads: Vec<Pad>) -> Self {
        let (center_x, center_y) = bbox_center(pads.iter().map(|p| (p.x_mm, p.y_mm)));
        Self {
            pads,
            center_x,
            center_y,
        }
    }

    pub fn with_center(pads: Vec<Pad>, center_x: f64, center_y: f64) -> Self {
        Self {
            pads,
            center_x,
            center_y,
        }
    }

    pub fn len(&self) -> usize {
        self.pads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pads.is_empty()
    }
}

/// Midpoint of the bounding box of `points`, `(0, 0)` when empty.
pub fn bbox_center(points: impl IntoIterator<Item = (f64, f64)>) -> (f64, f64) {
    let mut it = points.into_iter();
    let Some((x0, y0)) = it.next() else {
        return (0.0, 0.0);
    };
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (x0, x0, y0, y0);
    for (x, y) in it {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
}

/// Parse a pin label as a positive-or-zero integer. Anything else is `None`.
pub fn parse_pin(pin: &str) -> Option<u32> {
    pin.trim().parse::<u32>().ok()
}

// ────────────────────────────────────────────────────────────────────────────
// BoardObject
// ────────────────────────────────────────────────────────────────────────────

/// A placed pad.
///
/// `x_coord_mm_original` / `y_coord_mm_original` are captured at creation and
/// only rewritten by a committed placement (move), never by previews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardObject {
    pub component_name: String,
    pub pin: String,
    /// `None` until the store assigns one.
    pub channel: Option<Channel>,
    #[serde(default)]
    pub signal: String,
    #[serde(rename = "test_position")]
    pub side: Side,
    pub testability: Testability,
    pub technology: Technology,
    pub x_coord_mm: f64,
    pub y_coord_mm: f64,
    pub x_coord_mm_original: f64,
    pub y_coord_mm_original: f64,
    pub shape: PadShape,
    pub angle_deg: f64,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl BoardObject {
    pub fn new(component_name: impl Into<String>, pin: impl Into<String>, x_mm: f64, y_mm: f64) -> Self {
        Self {
            component_name: component_name.into(),
            pin: pin.into(),
            channel: None,
            signal: String::new(),
            side: Side::Top,
            testability: Testability::default(),
            technology: Technology::default(),
            x_coord_mm: x_mm,
            y_coord_mm: y_mm,
            x_coord_mm_original: x_mm,
            y_coord_mm_original: y_mm,
            shape: PadShape::default(),
            angle_deg: 0.0,
            prefix: None,
            visible: true,
        }
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_signal(mut self, signal: impl Into<String>) -> Self {
        self.signal = signal.into();
        self
    }

    /// Update the live (display) coordinates. Originals are left untouched.
    pub fn update_coordinates(&mut self, x_mm: f64, y_mm: f64) {
        self.x_coord_mm = x_mm;
        self.y_coord_mm = y_mm;
    }

    /// Commit a new position: live and original coordinates both move.
    pub fn commit_position(&mut self, x_mm: f64, y_mm: f64) {
        self.update_coordinates(x_mm, y_mm);
        self.x_coord_mm_original = x_mm;
        self.y_coord_mm_original = y_mm;
    }

    pub fn pin_number(&self) -> Option<u32> {
        parse_pin(&self.pin)
    }

    pub fn is_component(&self, name: &str) -> bool {
        self.component_name.to_lowercase() == name.to_lowercase()
    }
}

/// Signal assigned automatically to a pad without an explicit one.
pub fn default_signal(channel: Channel) -> String {
    format!("S{channel}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_center() {
        assert_eq!(bbox_center(vec![(0.0, 0.0), (4.0, 2.0), (1.0, -2.0)]), (2.0, 0.0));
        assert_eq!(bbox_center(Vec::new()), (0.0, 0.0));
    }

    #[test]
    fn test_side_parse() {
        assert_eq!("Bottom".parse::<Side>(), Ok(Side::Bottom));
        assert_eq!(" TOP ".parse::<Side>(), Ok(Side::Top));
        assert_eq!("o".parse::<Side>(), Ok(Side::Both));
        assert!("left".parse::<Side>().is_err());
    }

    #[test]
    fn test_half_extents_rotated() {
        let shape = PadShape::new(ShapeKind::Rectangle, 2.0, 1.0, 0.0);
        let (hx, hy) = shape.half_extents(90.0);
        assert!((hx - 0.5).abs() < 1e-12);
        assert!((hy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_serde_names() {
        let obj = BoardObject::new("U1", "1", 1.0, 2.0).with_side(Side::Bottom);
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["test_position"], "bottom");
        assert_eq!(json["testability"], "Not Testable");
        assert_eq!(json["technology"], "SMD");
        assert_eq!(json["shape"]["kind"], "Round");
    }

    #[test]
    fn test_commit_position_moves_originals() {
        let mut obj = BoardObject::new("U1", "1", 1.0, 2.0);
        obj.update_coordinates(5.0, 6.0);
        assert_eq!((obj.x_coord_mm_original, obj.y_coord_mm_original), (1.0, 2.0));
        obj.commit_position(7.0, 8.0);
        assert_eq!((obj.x_coord_mm_original, obj.y_coord_mm_original), (7.0, 8.0));
    }
}
