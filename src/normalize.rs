//! Turning placed pads back into footprints.
//!
//! Copy/paste, move and align all start from pads that are already on the
//! board. They are rebuilt as [`Pad`] templates from their *original*
//! coordinates, so a preview that only touched the live coordinates never
//! leaks into the next placement.

use crate::geometry::Point;
use crate::model::{BoardObject, Footprint, Pad};

/// Template for `obj`, positioned at its original coordinates.
pub fn pad_from_object(obj: &BoardObject) -> Pad {
    Pad {
        pin: obj.pin.clone(),
        x_mm: obj.x_coord_mm_original,
        y_mm: obj.y_coord_mm_original,
        shape: obj.shape,
        angle_deg: obj.angle_deg,
        testability: obj.testability,
        technology: obj.technology,
        prefix: obj.prefix.clone(),
        order: None,
    }
}

/// Sort by the explicit order key when every pad has one and centre the
/// result on the bounding-box midpoint.
pub fn normalize_footprint(mut pads: Vec<Pad>) -> Footprint {
    if !pads.is_empty() && pads.iter().all(|p| p.order.is_some()) {
        pads.sort_by_key(|p| p.order);
    }
    Footprint::new(pads)
}

/// Footprint made of `objects` in the given order.
pub fn footprint_from_objects<'a>(objects: impl IntoIterator<Item = &'a BoardObject>) -> Footprint {
    normalize_footprint(objects.into_iter().map(pad_from_object).collect())
}

/// Mean of the original coordinates, `None` for no objects.
pub fn mean_center<'a>(objects: impl IntoIterator<Item = &'a BoardObject>) -> Option<Point> {
    let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
    for obj in objects {
        sx += obj.x_coord_mm_original;
        sy += obj.y_coord_mm_original;
        n += 1;
    }
    (n > 0).then(|| Point::new(sx / n as f64, sy / n as f64))
}

/// True when the numeric pins, once sorted, skip a number or do not start at
/// 1. Any non-numeric pin, or fewer than two pins, means no question to ask.
pub fn has_numbering_gaps<'a>(pins: impl IntoIterator<Item = &'a str>) -> bool {
    let mut numbers = Vec::new();
    for pin in pins {
        match pin.trim().parse::<u32>() {
            Ok(n) => numbers.push(n),
            Err(_) => return false,
        }
    }
    if numbers.len() < 2 {
        return false;
    }
    numbers.sort_unstable();
    numbers[0] != 1 || numbers.windows(2).any(|w| w[1] - w[0] != 1)
}

/// Templates for a clipboard copy of `objects`.
///
/// Pads are ordered by numeric pin when every pin is numeric (otherwise the
/// given order is kept) and stamped with that order. With `renumber` pins
/// become `1..=n` in the same order.
pub fn copy_pads(objects: &[BoardObject], renumber: bool) -> Vec<Pad> {
    let mut sorted: Vec<&BoardObject> = objects.iter().collect();
    if sorted.iter().all(|o| o.pin_number().is_some()) {
        sorted.sort_by_key(|o| o.pin_number());
    }
    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, obj)| {
            let mut pad = pad_from_object(obj);
            pad.order = Some(idx);
            if renumber {
                pad.pin = (idx + 1).to_string();
            }
            pad
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_original_coordinates() {
        let mut obj = BoardObject::new("U1", "1", 2.0, 4.0);
        obj.update_coordinates(100.0, 100.0);
        let other = BoardObject::new("U1", "2", 6.0, 0.0);
        let fp = footprint_from_objects([&obj, &other]);
        assert_eq!(fp.pads[0].x_mm, 2.0);
        assert_eq!((fp.center_x, fp.center_y), (4.0, 2.0));
    }

    #[test]
    fn test_order_key_sorts_only_when_complete() {
        let mut a = Pad::new("1", 0.0, 0.0);
        let mut b = Pad::new("2", 1.0, 0.0);
        a.order = Some(1);
        b.order = Some(0);
        let fp = normalize_footprint(vec![a.clone(), b.clone()]);
        assert_eq!(fp.pads[0].pin, "2");

        b.order = None;
        let fp = normalize_footprint(vec![a, b]);
        assert_eq!(fp.pads[0].pin, "1");
    }

    #[test]
    fn test_numbering_gaps() {
        assert!(!has_numbering_gaps(["1", "2", "3"]));
        assert!(has_numbering_gaps(["1", "3"]));
        assert!(has_numbering_gaps(["2", "3"]));
        assert!(!has_numbering_gaps(["1", "A"]));
        assert!(!has_numbering_gaps(["5"]));
    }

    #[test]
    fn test_copy_pads_sorts_and_renumbers() {
        let objs = vec![
            BoardObject::new("U1", "10", 0.0, 0.0),
            BoardObject::new("U1", "4", 1.0, 0.0),
        ];
        let pads = copy_pads(&objs, false);
        assert_eq!(pads[0].pin, "4");
        assert_eq!(pads[0].order, Some(0));
        let pads = copy_pads(&objs, true);
        assert_eq!(pads.iter().map(|p| p.pin.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(pads[0].x_mm, 1.0);
    }

    #[test]
    fn test_mean_center() {
        let objs = [
            BoardObject::new("U1", "1", 0.0, 0.0),
            BoardObject::new("U1", "2", 3.0, 0.0),
            BoardObject::new("U1", "3", 0.0, 3.0),
        ];
        assert_eq!(mean_center(&objs), Some(Point::new(1.0, 1.0)));
        assert_eq!(mean_center(&Vec::<BoardObject>::new()), None);
    }
}
