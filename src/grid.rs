//! Quick-creation pad grids.
//!
//! Two anchors span a rectangle that is filled with a `rows × cols` grid of
//! identical pads. The grid is then renumbered with one of the
//! [`NumberingScheme`]s such that the pad under anchor A is always pin 1.
//!
//! ```rust,ignore
//! let spec = GridSpec::new(Point::new(0.0, 0.0), Point::new(2.54, -5.08), 2, 3);
//! let fp = generate_grid(&spec, &default_prefix_table())?;
//! assert_eq!(fp.pads[0].pin, "1");
//! ```

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::model::{Footprint, Pad, PadShape, Side, Technology, Testability};

/// Pin order applied to a generated grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingScheme {
    /// IC-style snake that alternates direction on every column (or row).
    #[default]
    Circular,
    ByRows,
    ByColumns,
}

impl NumberingScheme {
    /// Scheme by dialog index (0 circular, 1 rows, 2 columns). Unknown
    /// indices fall back to columns, the last entry.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => NumberingScheme::Circular,
            1 => NumberingScheme::ByRows,
            _ => NumberingScheme::ByColumns,
        }
    }
}

impl FromStr for NumberingScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circular" | "snake" => Ok(NumberingScheme::Circular),
            "rows" | "by_rows" | "by-rows" => Ok(NumberingScheme::ByRows),
            "columns" | "by_columns" | "by-columns" => Ok(NumberingScheme::ByColumns),
            other => Err(format!("unknown numbering scheme '{other}'")),
        }
    }
}

/// Geometry and flags shared by every pad of a generated grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadTemplate {
    pub shape: PadShape,
    pub testability: Testability,
    pub technology: Technology,
}

impl Default for PadTemplate {
    fn default() -> Self {
        Self {
            shape: PadShape::default(),
            testability: Testability::Forced,
            technology: Technology::Smd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub anchor_a: Point,
    pub anchor_b: Point,
    pub cols: usize,
    pub rows: usize,
    #[serde(default)]
    pub scheme: NumberingScheme,
    #[serde(default)]
    pub pad: PadTemplate,
    #[serde(default)]
    pub create_prefix: bool,
}

impl GridSpec {
    pub fn new(anchor_a: Point, anchor_b: Point, cols: usize, rows: usize) -> Self {
        Self {
            anchor_a,
            anchor_b,
            cols,
            rows,
            scheme: NumberingScheme::default(),
            pad: PadTemplate::default(),
            create_prefix: false,
        }
    }

    pub fn with_scheme(mut self, scheme: NumberingScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_pad(mut self, pad: PadTemplate) -> Self {
        self.pad = pad;
        self
    }

    pub fn with_prefix(mut self, create_prefix: bool) -> Self {
        self.create_prefix = create_prefix;
        self
    }
}

/// Row letters used for alphanumeric prefixes (I, O, Q, S, X, Z are skipped).
pub fn default_prefix_table() -> Vec<String> {
    [
        "A", "B", "C", "D", "E", "F", "G", "H", "J", "K", "L", "M", "N", "P", "R", "T", "U", "V",
        "W", "Y", "AA", "AB", "AC", "AD", "AE", "AF", "AG", "AH",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// IC-style snake over a `rows × cols` grid, as `(row, col)` pairs.
///
/// With `rows >= cols` the walk goes down column 0, up column 1, and so on;
/// otherwise it goes right along row 0, left along row 1, and so on.
pub fn snake_circular(rows: usize, cols: usize) -> Vec<(usize, usize)> {
    let mut order = Vec::with_capacity(rows * cols);
    if rows >= cols {
        for c in 0..cols {
            if c % 2 == 0 {
                order.extend((0..rows).map(|r| (r, c)));
            } else {
                order.extend((0..rows).rev().map(|r| (r, c)));
            }
        }
    } else {
        for r in 0..rows {
            if r % 2 == 0 {
                order.extend((0..cols).map(|c| (r, c)));
            } else {
                order.extend((0..cols).rev().map(|c| (r, c)));
            }
        }
    }
    order
}

/// Position of `index` in `0..len` after rotating the list so `start` leads.
fn rotated_position(index: usize, start: usize, len: usize) -> usize {
    (index + len - start) % len
}

/// Traversal order of grid cells for `scheme`, starting at `(a_row, a_col)`.
pub fn traversal_order(
    scheme: NumberingScheme,
    rows: usize,
    cols: usize,
    a_row: usize,
    a_col: usize,
) -> Vec<(usize, usize)> {
    let row_vis: Vec<usize> = (0..rows).map(|i| (a_row + i) % rows).collect();
    let col_vis: Vec<usize> = (0..cols).map(|i| (a_col + i) % cols).collect();
    match scheme {
        NumberingScheme::Circular => {
            let mut order = snake_circular(rows, cols);
            let start = order
                .iter()
                .position(|&cell| cell == (a_row, a_col))
                .unwrap_or(0);
            order.rotate_left(start);
            order
        }
        NumberingScheme::ByRows => row_vis
            .iter()
            .flat_map(|&r| col_vis.iter().map(move |&c| (r, c)))
            .collect(),
        NumberingScheme::ByColumns => col_vis
            .iter()
            .flat_map(|&c| row_vis.iter().map(move |&r| (r, c)))
            .collect(),
    }
}

/// Index of the value in `values` nearest to `target` (first one on ties).
fn nearest_index(values: impl Iterator<Item = f64>, target: f64) -> usize {
    let mut best = (0, f64::INFINITY);
    for (i, v) in values.enumerate() {
        let d = (v - target).abs();
        if d < best.1 {
            best = (i, d);
        }
    }
    best.0
}

/// Build the quick-creation footprint for `spec`.
///
/// Pads come out in numbering order with pins `1..=rows*cols`; the footprint
/// centre is the midpoint of the anchors. With `create_prefix` and a row or
/// column scheme every pad also gets a `<letter><number>` prefix, the letter
/// taken from `prefix_table` (wrapping when the grid outgrows it).
pub fn generate_grid(spec: &GridSpec, prefix_table: &[String]) -> Result<Footprint> {
    let (rows, cols) = (spec.rows, spec.cols);
    if rows == 0 || cols == 0 {
        return Err(Error::degenerate(format!(
            "grid needs at least one row and column, got {rows}x{cols}"
        )));
    }
    let (a, b) = (spec.anchor_a, spec.anchor_b);
    if a == b && (rows > 1 || cols > 1) {
        return Err(Error::degenerate(format!(
            "anchors coincide at ({:.3}, {:.3}) but grid is {rows}x{cols}",
            a.x, a.y
        )));
    }

    let dx = if cols > 1 { (b.x - a.x) / (cols - 1) as f64 } else { 0.0 };
    let dy = if rows > 1 { (b.y - a.y) / (rows - 1) as f64 } else { 0.0 };

    // Row-major raster, pin = linear index + 1 until renumbered.
    let mut cells: Vec<Option<Pad>> = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let mut pad = Pad::new(
                (r * cols + c + 1).to_string(),
                a.x + c as f64 * dx,
                a.y + r as f64 * dy,
            )
            .with_shape(spec.pad.shape);
            pad.testability = spec.pad.testability;
            pad.technology = spec.pad.technology;
            cells.push(Some(pad));
        }
    }

    let a_row = nearest_index((0..rows).map(|r| a.y + r as f64 * dy), a.y);
    let a_col = nearest_index((0..cols).map(|c| a.x + c as f64 * dx), a.x);
    let order = traversal_order(spec.scheme, rows, cols, a_row, a_col);

    let with_prefix = spec.create_prefix && spec.scheme != NumberingScheme::Circular;
    if with_prefix && prefix_table.is_empty() {
        warn!("Prefix requested but the prefix table is empty; pads keep no prefix");
    }

    let mut pads = Vec::with_capacity(order.len());
    for (position, &(r, c)) in order.iter().enumerate() {
        let Some(mut pad) = cells[r * cols + c].take() else {
            continue;
        };
        pad.pin = (position + 1).to_string();
        if with_prefix && !prefix_table.is_empty() {
            let row_pos = rotated_position(r, a_row, rows);
            let col_pos = rotated_position(c, a_col, cols);
            let (letter_idx, number) = match spec.scheme {
                NumberingScheme::ByRows => (row_pos, col_pos + 1),
                _ => (col_pos, row_pos + 1),
            };
            let letter = &prefix_table[letter_idx % prefix_table.len()];
            pad.prefix = Some(format!("{letter}{number}"));
        }
        pads.push(pad);
    }

    debug!(
        "Built {rows}x{cols} grid ({:?}) from A=({:.3}, {:.3}) to B=({:.3}, {:.3}), anchor cell ({a_row}, {a_col})",
        spec.scheme, a.x, a.y, b.x, b.y
    );

    let center = a.midpoint(b);
    Ok(Footprint::with_center(pads, center.x, center.y))
}

/// Which quick-creation anchor is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorId {
    A,
    B,
}

/// The two anchors of a quick-creation rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPair {
    pub a: Point,
    pub b: Point,
}

impl AnchorPair {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    pub fn get(&self, id: AnchorId) -> Point {
        match id {
            AnchorId::A => self.a,
            AnchorId::B => self.b,
        }
    }

    /// Move one anchor by `(dx, dy)` mm. The board is viewed mirrored from
    /// the bottom, so there `dx` is inverted.
    pub fn nudge(&mut self, id: AnchorId, dx: f64, dy: f64, side: Side) {
        let dx = if side.is_mirrored() { -dx } else { dx };
        let anchor = match id {
            AnchorId::A => &mut self.a,
            AnchorId::B => &mut self.b,
        };
        anchor.x += dx;
        anchor.y += dy;
    }

    pub fn to_spec(&self, cols: usize, rows: usize) -> GridSpec {
        GridSpec::new(self.a, self.b, cols, rows)
    }
}
