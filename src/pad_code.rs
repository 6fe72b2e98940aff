//! Compact codes used when pads are exchanged with line-oriented board files.
//!
//! The pad token encodes shape, size (mils), hole and angle, e.g. `R55H28`
//! or `X79Y59H35A270`. Side, technology and testability each map to one
//! letter.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::model::{PadShape, ShapeKind, Side, Technology, Testability};

const MILS_PER_MM: f64 = 39.37;

static TOKEN_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([XYRAH])([0-9]+(?:\.[0-9]+)?)").expect("static regex"));

pub fn mils_to_mm(mils: f64) -> f64 {
    mils / MILS_PER_MM
}

pub fn mm_to_mils(mm: f64) -> f64 {
    mm * MILS_PER_MM
}

impl PadShape {
    /// Encode this shape (plus the pad angle) as a pad token in mils.
    pub fn code(&self, angle_deg: f64) -> String {
        let w = mm_to_mils(self.width_mm).round() as i64;
        let h = mm_to_mils(self.height_mm).round() as i64;
        let hole = mm_to_mils(self.hole_mm).round() as i64;
        let angle = if angle_deg != 0.0 {
            format!("A{}", angle_deg as i64)
        } else {
            String::new()
        };
        match self.kind {
            ShapeKind::Round => format!("R{w}"),
            ShapeKind::RoundWithHole | ShapeKind::Hole if hole > 0 => format!("R{w}H{hole}"),
            ShapeKind::RoundWithHole | ShapeKind::Hole => format!("R{w}"),
            ShapeKind::RectangleWithHole => format!("X{w}Y{h}H{hole}{angle}"),
            ShapeKind::Rectangle => format!("X{w}Y{h}{angle}"),
            ShapeKind::Ellipse => format!("R{w}Y{h}{angle}"),
        }
    }
}

/// Decode a pad token into a shape (mm) and angle (degrees).
///
/// Letters may appear in any order; a lone `X` or `Y` means a square. A token
/// carrying none of `X`, `Y`, `R` is rejected.
pub fn parse_pad_code(code: &str) -> Result<(PadShape, f64)> {
    let upper = code.trim().to_ascii_uppercase();
    let mut x = None;
    let mut y = None;
    let mut r = None;
    let mut hole = 0.0;
    let mut angle = 0.0;
    for cap in TOKEN_GROUP.captures_iter(&upper) {
        let value: f64 = cap[2].parse().unwrap_or(0.0);
        match &cap[1] {
            "X" => x = Some(value),
            "Y" => y = Some(value),
            "R" => r = Some(value),
            "H" => hole = value,
            "A" => angle = value,
            _ => {}
        }
    }

    let (rect, round) = if hole > 0.0 {
        (ShapeKind::RectangleWithHole, ShapeKind::RoundWithHole)
    } else {
        (ShapeKind::Rectangle, ShapeKind::Round)
    };
    let (kind, w, h) = match (x, y, r) {
        (Some(w), Some(h), _) => (rect, w, h),
        (Some(w), None, _) => (rect, w, w),
        // `R{w}Y{h}` is what ellipses encode to.
        (None, Some(h), Some(w)) => (ShapeKind::Ellipse, w, h),
        (None, Some(h), None) => (rect, h, h),
        (None, None, Some(w)) => (round, w, w),
        (None, None, None) => return Err(Error::InvalidPadCode(code.to_string())),
    };

    Ok((
        PadShape::new(kind, mils_to_mm(w), mils_to_mm(h), mils_to_mm(hole)),
        angle,
    ))
}

impl Side {
    pub fn code(self) -> char {
        match self {
            Side::Top => 'T',
            Side::Bottom => 'B',
            Side::Both => 'O',
        }
    }
}

impl Technology {
    pub fn code(self) -> char {
        match self {
            Technology::Smd => 'S',
            Technology::ThroughHole => 'T',
            Technology::Mechanical => 'M',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'S' => Some(Technology::Smd),
            'T' => Some(Technology::ThroughHole),
            'M' => Some(Technology::Mechanical),
            _ => None,
        }
    }
}

impl Testability {
    pub fn code(self) -> char {
        match self {
            Testability::Forced => 'F',
            Testability::Testable => 'T',
            Testability::NotTestable => 'N',
            Testability::Terminal => 'E',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'F' => Some(Testability::Forced),
            'T' => Some(Testability::Testable),
            'N' => Some(Testability::NotTestable),
            'E' => Some(Testability::Terminal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mils(mm: f64) -> f64 {
        mm_to_mils(mm).round()
    }

    #[test]
    fn test_parse_rectangle_with_hole() {
        let (shape, angle) = parse_pad_code("X79Y59A270H35").unwrap();
        assert_eq!(shape.kind, ShapeKind::RectangleWithHole);
        assert_eq!(mils(shape.width_mm), 79.0);
        assert_eq!(mils(shape.height_mm), 59.0);
        assert_eq!(mils(shape.hole_mm), 35.0);
        assert_eq!(angle, 270.0);
    }

    #[test]
    fn test_parse_round_and_square() {
        let (round, _) = parse_pad_code("r55h28").unwrap();
        assert_eq!(round.kind, ShapeKind::RoundWithHole);
        assert_eq!(mils(round.height_mm), 55.0);

        let (square, _) = parse_pad_code("X55").unwrap();
        assert_eq!(square.kind, ShapeKind::Rectangle);
        assert_eq!(mils(square.height_mm), 55.0);

        let (ellipse, _) = parse_pad_code("R40Y20").unwrap();
        assert_eq!(ellipse.kind, ShapeKind::Ellipse);
        assert_eq!(mils(ellipse.width_mm), 40.0);
        assert_eq!(mils(ellipse.height_mm), 20.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_pad_code("H12").is_err());
        assert!(parse_pad_code("").is_err());
    }

    #[test]
    fn test_code_shapes() {
        let rect = PadShape::new(ShapeKind::Rectangle, mils_to_mm(79.0), mils_to_mm(59.0), 0.0);
        assert_eq!(rect.code(90.0), "X79Y59A90");
        let round = PadShape::new(ShapeKind::Round, mils_to_mm(55.0), mils_to_mm(55.0), mils_to_mm(20.0));
        assert_eq!(round.code(45.0), "R55");
        let drilled = PadShape::new(ShapeKind::RoundWithHole, mils_to_mm(55.0), mils_to_mm(55.0), mils_to_mm(28.0));
        assert_eq!(drilled.code(45.0), "R55H28");
        let ellipse = PadShape::new(ShapeKind::Ellipse, mils_to_mm(40.0), mils_to_mm(20.0), 0.0);
        assert_eq!(ellipse.code(0.0), "R40Y20");
    }

    #[test]
    fn test_letter_codes() {
        assert_eq!(Side::Both.code(), 'O');
        assert_eq!(Technology::ThroughHole.code(), 'T');
        assert_eq!(Testability::from_code('e'), Some(Testability::Terminal));
        assert_eq!(Technology::from_code('x'), None);
    }
}
