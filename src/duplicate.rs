//! Pin numbering when new pads join an existing component.
//!
//! Placing a footprint under a component name that already has pads (names
//! compare case-insensitively) needs a [`MergePolicy`]: either fill the holes
//! in the existing numbering first, or shift every new pin past the current
//! maximum. Pins that are not plain integers take no part in the gap and
//! maximum computation.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::{BoardObject, Footprint, parse_pin};

/// Upper bound on the gaps a report lists. Labels are free text, so a single
/// pad called `200000000` would otherwise produce a huge gap list.
pub const MAX_LISTED_GAPS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Use missing pin numbers first, then continue after the highest pin.
    FillGaps,
    /// Shift every footprint pin by the highest existing pin.
    Append,
}

/// What a merge into `component_name` would look like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub component_name: String,
    /// Numeric pins already placed, ascending and unique.
    pub existing_pins: Vec<u32>,
    pub highest_pin: u32,
    /// `1..=highest_pin` minus `existing_pins`, ascending, truncated to the
    /// lowest [`MAX_LISTED_GAPS`] entries.
    pub missing_pins: Vec<u32>,
    /// Empty when the name is not taken yet.
    pub policy_options: Vec<MergePolicy>,
}

impl DuplicateReport {
    /// True when pads with this name already exist.
    pub fn is_collision(&self) -> bool {
        !self.policy_options.is_empty()
    }

    /// Policy a confirmation prompt should preselect: filling when there are
    /// gaps, appending otherwise. `None` without a collision.
    pub fn suggested_policy(&self) -> Option<MergePolicy> {
        if !self.is_collision() {
            None
        } else if self.missing_pins.is_empty() {
            Some(MergePolicy::Append)
        } else {
            Some(MergePolicy::FillGaps)
        }
    }
}

/// Inspect the pads already placed for `component_name`.
///
/// `existing` may contain pads of any component; only those whose name
/// matches case-insensitively are considered.
pub fn resolve_duplicate<'a>(
    component_name: &str,
    existing: impl IntoIterator<Item = &'a BoardObject>,
) -> DuplicateReport {
    let mut any = false;
    let mut pins = BTreeSet::new();
    for obj in existing.into_iter().filter(|o| o.is_component(component_name)) {
        any = true;
        if let Some(pin) = obj.pin_number() {
            pins.insert(pin);
        }
    }

    if !any {
        return DuplicateReport {
            component_name: component_name.to_string(),
            existing_pins: Vec::new(),
            highest_pin: 0,
            missing_pins: Vec::new(),
            policy_options: Vec::new(),
        };
    }

    let highest_pin = pins.iter().next_back().copied().unwrap_or(0);
    let missing_pins = gaps_below(&pins, MAX_LISTED_GAPS);
    if missing_pins.len() == MAX_LISTED_GAPS {
        warn!(
            "Component '{component_name}' has more than {MAX_LISTED_GAPS} missing pins below {highest_pin}; listing the lowest ones"
        );
    }
    debug!(
        "Component '{component_name}' exists: {} numeric pins, highest {highest_pin}, {} missing",
        pins.len(),
        missing_pins.len()
    );

    DuplicateReport {
        component_name: component_name.to_string(),
        existing_pins: pins.into_iter().collect(),
        highest_pin,
        missing_pins,
        policy_options: vec![MergePolicy::FillGaps, MergePolicy::Append],
    }
}

/// Walk the holes between consecutive pins instead of the whole range.
fn gaps_below(pins: &BTreeSet<u32>, limit: usize) -> Vec<u32> {
    let mut missing = Vec::new();
    let mut prev = 0;
    for &pin in pins {
        // prev < pin, so prev + 1 cannot overflow.
        for gap in (prev + 1)..pin {
            if missing.len() == limit {
                return missing;
            }
            missing.push(gap);
        }
        prev = pin;
    }
    missing
}

/// Original pin label and the pin it will be placed as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinAssignment {
    pub original_pin: String,
    pub final_pin: String,
}

/// Final pins for every pad of `footprint`, in footprint order.
///
/// Without a collision, or without a policy, pins are kept as they are.
/// Under [`MergePolicy::Append`] a footprint pin that is not a positive
/// integer, or whose shifted value would not fit a `u32`, is numbered after
/// the largest appended pin so the result still stays above `highest_pin`.
///
/// Fails with [`Error::PinSpaceExhausted`] when no unused pin number above
/// the existing ones is left for a pad.
pub fn apply_policy(
    report: &DuplicateReport,
    policy: Option<MergePolicy>,
    footprint: &Footprint,
) -> Result<Vec<PinAssignment>> {
    let policy = match policy {
        Some(p) if report.is_collision() => p,
        _ => {
            return Ok(footprint
                .pads
                .iter()
                .map(|pad| PinAssignment {
                    original_pin: pad.pin.clone(),
                    final_pin: pad.pin.clone(),
                })
                .collect());
        }
    };

    let exhausted = || Error::PinSpaceExhausted {
        component: report.component_name.clone(),
    };
    let highest = report.highest_pin;
    let finals: Vec<u32> = match policy {
        MergePolicy::FillGaps => {
            let mut gaps = report.missing_pins.iter().copied();
            let mut next = highest;
            footprint
                .pads
                .iter()
                .map(|_| match gaps.next() {
                    Some(gap) => Ok(gap),
                    None => {
                        next = next.checked_add(1).ok_or_else(exhausted)?;
                        Ok(next)
                    }
                })
                .collect::<Result<_>>()?
        }
        MergePolicy::Append => {
            let shifted: Vec<Option<u32>> = footprint
                .pads
                .iter()
                .map(|pad| {
                    parse_pin(&pad.pin)
                        .filter(|&p| p > 0)
                        .and_then(|p| p.checked_add(highest))
                })
                .collect();
            let mut next = shifted.iter().flatten().copied().max().unwrap_or(highest);
            shifted
                .into_iter()
                .map(|pin| match pin {
                    Some(p) => Ok(p),
                    None => {
                        next = next.checked_add(1).ok_or_else(exhausted)?;
                        Ok(next)
                    }
                })
                .collect::<Result<_>>()?
        }
    };

    Ok(footprint
        .pads
        .iter()
        .zip(finals)
        .map(|(pad, pin)| PinAssignment {
            original_pin: pad.pin.clone(),
            final_pin: pin.to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pad;

    fn placed(name: &str, pins: &[&str]) -> Vec<BoardObject> {
        pins.iter()
            .map(|p| BoardObject::new(name, *p, 0.0, 0.0))
            .collect()
    }

    fn footprint(pins: &[&str]) -> Footprint {
        Footprint::new(pins.iter().map(|p| Pad::new(*p, 0.0, 0.0)).collect())
    }

    fn finals(assignments: &[PinAssignment]) -> Vec<&str> {
        assignments.iter().map(|a| a.final_pin.as_str()).collect()
    }

    #[test]
    fn test_unique_name_keeps_pins() {
        let existing = placed("U1", &["1", "2"]);
        let report = resolve_duplicate("R5", &existing);
        assert!(!report.is_collision());
        assert_eq!(report.suggested_policy(), None);
        let out = apply_policy(&report, Some(MergePolicy::Append), &footprint(&["1", "2"])).unwrap();
        assert_eq!(finals(&out), vec!["1", "2"]);
    }

    #[test]
    fn test_case_insensitive_and_non_numeric_ignored() {
        let mut existing = placed("u1", &["1", "3", "GND"]);
        existing.extend(placed("U2", &["7"]));
        let report = resolve_duplicate("U1", &existing);
        assert!(report.is_collision());
        assert_eq!(report.existing_pins, vec![1, 3]);
        assert_eq!(report.highest_pin, 3);
        assert_eq!(report.missing_pins, vec![2]);
        assert_eq!(report.suggested_policy(), Some(MergePolicy::FillGaps));
    }

    #[test]
    fn test_fill_gaps_then_continue() {
        let existing = placed("U1", &["1", "3"]);
        let report = resolve_duplicate("U1", &existing);
        let out = apply_policy(&report, Some(MergePolicy::FillGaps), &footprint(&["1", "2", "3"])).unwrap();
        assert_eq!(finals(&out), vec!["2", "4", "5"]);
    }

    #[test]
    fn test_append_shifts_by_highest() {
        let existing = placed("U1", &["1", "2", "3"]);
        let report = resolve_duplicate("U1", &existing);
        assert_eq!(report.suggested_policy(), Some(MergePolicy::Append));
        let out = apply_policy(&report, Some(MergePolicy::Append), &footprint(&["1", "2"])).unwrap();
        assert_eq!(finals(&out), vec!["4", "5"]);
        assert_eq!(out[1].original_pin, "2");
    }

    #[test]
    fn test_append_numbers_non_numeric_after_shifted_pins() {
        let existing = placed("U1", &["1", "2"]);
        let report = resolve_duplicate("U1", &existing);
        let out = apply_policy(&report, Some(MergePolicy::Append), &footprint(&["1", "A", "3", "0"])).unwrap();
        assert_eq!(finals(&out), vec!["3", "6", "5", "7"]);
    }

    #[test]
    fn test_only_non_numeric_existing() {
        let existing = placed("J1", &["A", "B"]);
        let report = resolve_duplicate("J1", &existing);
        assert!(report.is_collision());
        assert_eq!(report.highest_pin, 0);
        let out = apply_policy(&report, Some(MergePolicy::FillGaps), &footprint(&["1", "2"])).unwrap();
        assert_eq!(finals(&out), vec!["1", "2"]);
    }

    #[test]
    fn test_append_pin_beyond_u32_is_renumbered() {
        let existing = placed("U1", &["5"]);
        let report = resolve_duplicate("U1", &existing);
        let out = apply_policy(
            &report,
            Some(MergePolicy::Append),
            &footprint(&["4294967295", "2"]),
        )
        .unwrap();
        assert_eq!(finals(&out), vec!["8", "7"]);
    }

    #[test]
    fn test_pin_space_exhausted_is_an_error() {
        let existing = placed("U1", &["4294967295"]);
        let report = resolve_duplicate("U1", &existing);
        let out = apply_policy(&report, Some(MergePolicy::Append), &footprint(&["1"]));
        assert!(matches!(out, Err(Error::PinSpaceExhausted { .. })));

        // Gaps below the maximum are still usable.
        let out = apply_policy(&report, Some(MergePolicy::FillGaps), &footprint(&["1"])).unwrap();
        assert_eq!(finals(&out), vec!["1"]);

        let mut no_gaps = report.clone();
        no_gaps.missing_pins.clear();
        let out = apply_policy(&no_gaps, Some(MergePolicy::FillGaps), &footprint(&["1"]));
        assert!(matches!(out, Err(Error::PinSpaceExhausted { .. })));
    }

    #[test]
    fn test_huge_pin_label_lists_capped_gaps() {
        let existing = placed("U1", &["1", "200000000"]);
        let report = resolve_duplicate("U1", &existing);
        assert_eq!(report.highest_pin, 200_000_000);
        assert_eq!(report.missing_pins.len(), MAX_LISTED_GAPS);
        assert_eq!(report.missing_pins[0], 2);
        assert_eq!(report.suggested_policy(), Some(MergePolicy::FillGaps));
    }
}
