//! The board editing session.
//!
//! A [`BoardSession`] owns the object store, the undo history, the parts list
//! and the clipboard behind one exclusive lock. Every public mutating method
//! is one transaction: it captures a snapshot, mutates, and pushes the
//! snapshot only when the mutation succeeded. Internal helpers take the
//! already-locked [`SessionState`] and never lock again.
//!
//! Observers are notified after the state lock has been released, in commit
//! order even when several threads share the session. An observer may query
//! the session but must not mutate it.

use log::{debug, info};
use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::events::{BoardEvent, BoardObserver, ChannelObserver, RenderHint, ResetKind};
use super::history::{Snapshot, UndoRedoManager};
use super::selection::PadSelection;
use super::store::{BoardObjectStore, FieldChanges};
use crate::config::EngineConfig;
use crate::duplicate::{DuplicateReport, MergePolicy, apply_policy, resolve_duplicate};
use crate::error::{Error, Result};
use crate::geometry::{Orientation, Point, compute_placement};
use crate::grid::{AnchorId, AnchorPair, GridSpec, generate_grid};
use crate::model::{BoardObject, Channel, Footprint, Side};
use crate::normalize::{
    copy_pads, footprint_from_objects, has_numbering_gaps, mean_center, normalize_footprint,
};
use crate::parts::{PartEntry, PartsList};

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

/// A footprint to drop onto the board as a new (or merged) component.
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    pub footprint: Footprint,
    pub target: Point,
    pub orientation: Orientation,
    pub component_name: String,
    /// Required when `component_name` already has pads.
    pub policy: Option<MergePolicy>,
    /// Original pin → prefix, used for pads that carry no prefix of their own.
    pub prefix_map: HashMap<String, String>,
}

impl PlacementRequest {
    pub fn new(
        footprint: Footprint,
        component_name: impl Into<String>,
        target: Point,
        orientation: Orientation,
    ) -> Self {
        Self {
            footprint,
            target,
            orientation,
            component_name: component_name.into(),
            policy: None,
            prefix_map: HashMap::new(),
        }
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

/// An anchor-defined pad grid created in one step.
#[derive(Debug, Clone)]
pub struct QuickCreateRequest {
    pub spec: GridSpec,
    pub component_name: String,
    pub side: Side,
    pub policy: Option<MergePolicy>,
    /// Parts-list row registered for a new component.
    pub part: PartEntry,
}

/// Result of [`BoardSession::copy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopySummary {
    pub copied: usize,
    /// The copied pins are numeric but skip numbers or do not start at 1, so
    /// pasting with `renumber` is probably wanted.
    pub suggest_renumber: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

/// Everything guarded by the session lock.
#[derive(Debug, Default)]
pub struct SessionState {
    pub store: BoardObjectStore,
    pub history: UndoRedoManager,
    pub parts: PartsList,
    pub clipboard: Vec<BoardObject>,
    /// Ticket of the last commit, handed out under the lock.
    commits: u64,
}

impl SessionState {
    fn snapshot(&self, with_parts: bool) -> Snapshot {
        Snapshot::new(self.store.table(), with_parts.then(|| self.parts.clone()))
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.store.restore(snapshot.objects);
        if let Some(parts) = snapshot.parts {
            self.parts = parts;
        }
    }

    fn existing(&self, channels: &[Channel]) -> Result<Vec<BoardObject>> {
        channels
            .iter()
            .map(|&ch| self.store.get(ch).ok_or(Error::ChannelNotFound(ch)))
            .collect()
    }

    /// Resolve pins, place and insert `footprint` under `name`.
    #[allow(clippy::too_many_arguments)]
    fn commit_footprint(
        &mut self,
        footprint: &Footprint,
        name: &str,
        target: Point,
        orientation: &Orientation,
        side: Side,
        policy: Option<MergePolicy>,
        prefix_map: &HashMap<String, String>,
    ) -> Result<Vec<BoardObject>> {
        if footprint.is_empty() {
            return Err(Error::EmptyFootprint);
        }
        let report = resolve_duplicate(name, self.store.iter());
        if report.is_collision() && policy.is_none() {
            return Err(Error::MergePolicyRequired {
                component: name.to_string(),
            });
        }
        let assignments = apply_policy(&report, policy, footprint)?;
        let records = compute_placement(footprint, target, orientation);

        let objects = records
            .into_iter()
            .zip(assignments)
            .map(|(rec, pins)| {
                let mut obj = BoardObject::new(name, pins.final_pin, rec.x_mm, rec.y_mm);
                obj.side = side;
                obj.shape = rec.shape;
                obj.angle_deg = rec.angle_deg;
                obj.testability = rec.testability;
                obj.technology = rec.technology;
                obj.prefix = rec.prefix.or_else(|| prefix_map.get(&pins.original_pin).cloned());
                obj
            })
            .collect();
        self.store.bulk_add(objects)
    }
}

/// Observers plus the ticket of the last commit they were told about.
#[derive(Default)]
struct Dispatch {
    observers: Vec<Box<dyn BoardObserver>>,
    delivered: u64,
}

pub struct BoardSession {
    state: Mutex<SessionState>,
    dispatch: Mutex<Dispatch>,
    turn: Condvar,
    config: EngineConfig,
}

impl Default for BoardSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl BoardSession {
    pub fn new(config: EngineConfig) -> Self {
        let state = SessionState {
            history: UndoRedoManager::new(config.max_undo_steps),
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
            dispatch: Mutex::new(Dispatch::default()),
            turn: Condvar::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── observers ─────────────────────────────────────────────────────────

    pub fn subscribe(&self, observer: impl BoardObserver + 'static) {
        self.dispatch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .push(Box::new(observer));
    }

    /// Subscribe through an `mpsc` channel.
    pub fn subscribe_channel(&self) -> Receiver<BoardEvent> {
        let (observer, rx) = ChannelObserver::new();
        self.subscribe(observer);
        rx
    }

    /// Release `state` and deliver `events` of the commit it just made.
    ///
    /// Every commit takes a ticket while it still holds the state lock;
    /// delivery waits until all earlier tickets have been delivered.
    fn publish(&self, mut state: MutexGuard<'_, SessionState>, events: Vec<BoardEvent>) {
        state.commits += 1;
        let ticket = state.commits;
        drop(state);

        let dispatch = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);
        let mut dispatch = self
            .turn
            .wait_while(dispatch, |d| d.delivered + 1 != ticket)
            .unwrap_or_else(PoisonError::into_inner);
        dispatch.delivered = ticket;
        self.turn.notify_all();
        for event in &events {
            for observer in dispatch.observers.iter() {
                observer.on_event(event);
            }
        }
    }

    /// Run `f` as one undoable transaction.
    ///
    /// The pre-mutation snapshot (with the parts list when `with_parts`) is
    /// pushed only if `f` succeeds; on failure the store and parts list are
    /// put back and the history is untouched.
    fn transact<T>(
        &self,
        with_parts: bool,
        f: impl FnOnce(&mut SessionState) -> Result<(T, Vec<BoardEvent>)>,
    ) -> Result<T> {
        let mut state = self.lock();
        let before = state.snapshot(with_parts);
        let (value, events) = match f(&mut state) {
            Ok(done) => {
                state.history.push(before);
                state.history.clear_redo();
                done
            }
            Err(e) => {
                state.restore(before);
                return Err(e);
            }
        };
        self.publish(state, events);
        Ok(value)
    }

    // ── store mutations ───────────────────────────────────────────────────

    pub fn add(&self, obj: BoardObject) -> Result<BoardObject> {
        self.transact(false, |s| {
            let added = s.store.add(obj)?;
            let event = BoardEvent::Added {
                objects: vec![added.clone()],
                hint: RenderHint::Partial,
            };
            Ok((added, vec![event]))
        })
    }

    pub fn remove(&self, channel: Channel) -> Result<BoardObject> {
        self.transact(false, |s| {
            let removed = s.store.remove(channel)?;
            let event = BoardEvent::Removed {
                objects: vec![removed.clone()],
                hint: RenderHint::Partial,
            };
            Ok((removed, vec![event]))
        })
    }

    pub fn update(&self, obj: BoardObject) -> Result<BoardObject> {
        self.transact(false, |s| {
            let updated = s.store.update(obj)?;
            let event = BoardEvent::Updated {
                objects: vec![updated.clone()],
                hint: RenderHint::Partial,
            };
            Ok((updated, vec![event]))
        })
    }

    pub fn bulk_add(&self, objs: Vec<BoardObject>, hint: RenderHint) -> Result<Vec<BoardObject>> {
        self.transact(false, |s| {
            let added = s.store.bulk_add(objs)?;
            Ok((added.clone(), vec![BoardEvent::Added { objects: added, hint }]))
        })
    }

    pub fn bulk_delete(&self, channels: &[Channel], hint: RenderHint) -> Result<Vec<BoardObject>> {
        self.transact(false, |s| {
            let removed = s.store.bulk_delete(channels)?;
            Ok((removed.clone(), vec![BoardEvent::Removed { objects: removed, hint }]))
        })
    }

    pub fn bulk_update(
        &self,
        objs: Vec<BoardObject>,
        changes: &FieldChanges,
        hint: RenderHint,
    ) -> Result<Vec<BoardObject>> {
        self.transact(false, |s| {
            let updated = s.store.bulk_update(objs, changes)?;
            Ok((updated.clone(), vec![BoardEvent::Updated { objects: updated, hint }]))
        })
    }

    /// Add, update and delete in one step. Every channel in `updated` and
    /// `deleted` must exist; otherwise nothing changes.
    pub fn modify(
        &self,
        added: Vec<BoardObject>,
        updated: Vec<BoardObject>,
        deleted: &[Channel],
    ) -> Result<Vec<BoardObject>> {
        self.transact(false, |s| {
            let updated = s.store.bulk_update(updated, &FieldChanges::default())?;
            let removed = s.store.bulk_delete(deleted)?;
            let added = s.store.bulk_add(added)?;
            let mut events = Vec::new();
            if !added.is_empty() {
                events.push(BoardEvent::Added {
                    objects: added.clone(),
                    hint: RenderHint::Full,
                });
            }
            if !updated.is_empty() {
                events.push(BoardEvent::Updated {
                    objects: updated,
                    hint: RenderHint::Full,
                });
            }
            if !removed.is_empty() {
                events.push(BoardEvent::Removed {
                    objects: removed,
                    hint: RenderHint::Full,
                });
            }
            Ok((added, events))
        })
    }

    /// Remove every pad as one undoable step. Returns how many were removed.
    pub fn clear_all(&self) -> Result<usize> {
        self.transact(false, |s| {
            let removed = s.store.clear();
            info!("Cleared {} pads", removed.len());
            let n = removed.len();
            Ok((
                n,
                vec![BoardEvent::Removed {
                    objects: removed,
                    hint: RenderHint::Full,
                }],
            ))
        })
    }

    /// Replace the board with loaded objects. Starts a new undo baseline.
    pub fn load(&self, objs: Vec<BoardObject>, parts: PartsList) -> Result<Vec<BoardObject>> {
        let mut state = self.lock();
        let loaded = state.store.load(objs)?;
        state.parts = parts;
        state.clipboard.clear();
        state.history.clear();
        self.publish(
            state,
            vec![BoardEvent::Reset {
                kind: ResetKind::Load,
            }],
        );
        Ok(loaded)
    }

    pub fn refresh_channel_counter(&self) {
        self.lock().store.refresh_channel_counter();
    }

    /// Insert or replace a parts-list row as an undoable step.
    pub fn set_part(&self, component: &str, entry: PartEntry) -> Result<()> {
        self.transact(true, |s| {
            s.parts.add_component(component, entry);
            Ok(((), Vec::new()))
        })
    }

    // ── placement ─────────────────────────────────────────────────────────

    /// What placing under `component_name` would merge into.
    pub fn duplicate_report(&self, component_name: &str) -> DuplicateReport {
        let state = self.lock();
        resolve_duplicate(component_name, state.store.iter())
    }

    /// Place a footprint as new pads.
    ///
    /// Fails with [`Error::MergePolicyRequired`] when the name is taken and
    /// the request carries no policy; nothing is committed then.
    pub fn place_footprint(&self, request: &PlacementRequest) -> Result<Vec<BoardObject>> {
        self.transact(false, |s| {
            let added = s.commit_footprint(
                &request.footprint,
                &request.component_name,
                request.target,
                &request.orientation,
                request.orientation.side,
                request.policy,
                &request.prefix_map,
            )?;
            info!(
                "Placed {} pads of '{}' at ({:.3}, {:.3})",
                added.len(),
                request.component_name,
                request.target.x,
                request.target.y
            );
            let event = BoardEvent::Added {
                objects: added.clone(),
                hint: RenderHint::Partial,
            };
            Ok((added, vec![event]))
        })
    }

    /// Move one anchor by whole steps of the configured nudge distance.
    pub fn nudge_anchor(
        &self,
        anchors: &mut AnchorPair,
        id: AnchorId,
        steps_x: i32,
        steps_y: i32,
        side: Side,
    ) {
        let step = self.config.anchor_nudge_step_mm;
        anchors.nudge(id, f64::from(steps_x) * step, f64::from(steps_y) * step, side);
    }

    /// Grid spec between `anchors` using the configured default pad.
    pub fn quick_spec(&self, anchors: &AnchorPair, cols: usize, rows: usize) -> GridSpec {
        anchors.to_spec(cols, rows).with_pad(self.config.default_pad)
    }

    /// Generate a pad grid and commit it, together with a parts-list row for
    /// a new component, as one undo step.
    pub fn quick_create(&self, request: &QuickCreateRequest) -> Result<Vec<BoardObject>> {
        let footprint = generate_grid(&request.spec, &self.config.quick_prefix_table)?;
        let center = Point::new(footprint.center_x, footprint.center_y);
        // Anchors are board coordinates already: place without any transform.
        let identity = Orientation::default();
        self.transact(true, |s| {
            let is_new = s.store.pads_for_component(&request.component_name).is_empty();
            let added = s.commit_footprint(
                &footprint,
                &request.component_name,
                center,
                &identity,
                request.side,
                request.policy,
                &HashMap::new(),
            )?;
            if is_new {
                s.parts
                    .add_component(request.component_name.clone(), request.part.clone());
            }
            info!(
                "Quick-created {} pads for '{}' ({}x{}, {:?})",
                added.len(),
                request.component_name,
                request.spec.cols,
                request.spec.rows,
                request.spec.scheme
            );
            let event = BoardEvent::Added {
                objects: added.clone(),
                hint: RenderHint::Partial,
            };
            Ok((added, vec![event]))
        })
    }

    /// Re-place existing pads at `target`.
    ///
    /// The pads are rebuilt into a footprint from their original coordinates
    /// and committed: live and original coordinates, angle and side all change.
    pub fn move_channels(
        &self,
        channels: &[Channel],
        target: Point,
        orientation: &Orientation,
    ) -> Result<Vec<BoardObject>> {
        self.transact(false, |s| {
            let objects = s.existing(channels)?;
            if objects.is_empty() {
                return Ok((Vec::new(), Vec::new()));
            }
            let footprint = footprint_from_objects(&objects);
            let records = compute_placement(&footprint, target, orientation);
            let moved = objects
                .into_iter()
                .zip(records)
                .map(|(mut obj, rec)| {
                    obj.commit_position(rec.x_mm, rec.y_mm);
                    obj.angle_deg = rec.angle_deg;
                    obj.side = rec.side;
                    obj
                })
                .collect();
            let moved = s.store.bulk_update(moved, &FieldChanges::default())?;
            debug!("Moved {} pads to ({:.3}, {:.3})", moved.len(), target.x, target.y);
            let event = BoardEvent::Updated {
                objects: moved.clone(),
                hint: RenderHint::Partial,
            };
            Ok((moved, vec![event]))
        })
    }

    /// Translate pads so their mean centre lands on `target`.
    pub fn align_channels(&self, channels: &[Channel], target: Point) -> Result<Vec<BoardObject>> {
        self.transact(false, |s| {
            let objects = s.existing(channels)?;
            let Some(center) = mean_center(&objects) else {
                return Ok((Vec::new(), Vec::new()));
            };
            let (dx, dy) = (target.x - center.x, target.y - center.y);
            let aligned = objects
                .into_iter()
                .map(|mut obj| {
                    obj.commit_position(obj.x_coord_mm_original + dx, obj.y_coord_mm_original + dy);
                    obj
                })
                .collect();
            let aligned = s.store.bulk_update(aligned, &FieldChanges::default())?;
            let event = BoardEvent::Updated {
                objects: aligned.clone(),
                hint: RenderHint::Partial,
            };
            Ok((aligned, vec![event]))
        })
    }

    // ── clipboard ─────────────────────────────────────────────────────────

    /// Copy pads to the clipboard.
    pub fn copy(&self, channels: &[Channel]) -> Result<CopySummary> {
        let mut state = self.lock();
        let objects = state.existing(channels)?;
        let summary = CopySummary {
            copied: objects.len(),
            suggest_renumber: has_numbering_gaps(objects.iter().map(|o| o.pin.as_str())),
        };
        state.clipboard = objects;
        debug!(
            "Copied {} pads{}",
            summary.copied,
            if summary.suggest_renumber { ", numbering has gaps" } else { "" }
        );
        Ok(summary)
    }

    /// The clipboard as a footprint ready for [`Self::place_footprint`].
    /// With `renumber` pins become `1..=n`.
    pub fn clipboard_footprint(&self, renumber: bool) -> Result<Footprint> {
        let state = self.lock();
        if state.clipboard.is_empty() {
            return Err(Error::EmptyClipboard);
        }
        Ok(normalize_footprint(copy_pads(&state.clipboard, renumber)))
    }

    // ── history ───────────────────────────────────────────────────────────

    /// Snapshot the board, and `extra` as the parts list to restore, unless
    /// the snapshot equals the latest one.
    pub fn push_state(&self, extra: Option<PartsList>) -> bool {
        let mut state = self.lock();
        let snapshot = Snapshot::new(state.store.table(), extra);
        state.history.push(snapshot)
    }

    pub fn undo(&self) -> Result<()> {
        let mut state = self.lock();
        let current = state.snapshot(true);
        let previous = state.history.undo(current)?;
        state.restore(previous);
        info!("Undo");
        self.publish(
            state,
            vec![BoardEvent::Reset {
                kind: ResetKind::Undo,
            }],
        );
        Ok(())
    }

    pub fn redo(&self) -> Result<()> {
        let mut state = self.lock();
        let current = state.snapshot(true);
        let next = state.history.redo(current)?;
        state.restore(next);
        info!("Redo");
        self.publish(
            state,
            vec![BoardEvent::Reset {
                kind: ResetKind::Redo,
            }],
        );
        Ok(())
    }

    /// Forget all history, e.g. after a save.
    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.lock().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.lock().history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.lock().history.undo_depth()
    }

    // ── queries ───────────────────────────────────────────────────────────

    pub fn get(&self, channel: Channel) -> Option<BoardObject> {
        self.lock().store.get(channel)
    }

    pub fn all_objects(&self) -> Vec<BoardObject> {
        self.lock().store.all_objects()
    }

    pub fn objects_on_side(&self, side: Side) -> Vec<BoardObject> {
        self.lock().store.objects_on_side(side)
    }

    pub fn pads_for_component(&self, component: &str) -> Vec<BoardObject> {
        self.lock().store.pads_for_component(component)
    }

    pub fn find_pad(
        &self,
        component: Option<&str>,
        pin: Option<&str>,
        signal: Option<&str>,
        channel: Option<Channel>,
    ) -> Option<BoardObject> {
        self.lock().store.find_pad(component, pin, signal, channel)
    }

    pub fn find_by_signal(&self, signal: &str) -> Vec<BoardObject> {
        self.lock().store.find_by_signal(signal)
    }

    pub fn components(&self) -> Vec<String> {
        self.lock().store.components()
    }

    pub fn pins(&self, component: &str) -> Vec<String> {
        self.lock().store.pins(component)
    }

    pub fn signals(&self, component: Option<&str>, pin: Option<&str>) -> Vec<String> {
        self.lock().store.signals(component, pin)
    }

    pub fn parts(&self) -> PartsList {
        self.lock().parts.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().store.is_empty()
    }

    pub fn next_channel(&self) -> Option<Channel> {
        self.lock().store.next_channel()
    }

    /// Finish a drag selection against the current board, on `side`.
    pub fn finish_selection(&self, selection: &mut PadSelection, side: Side) {
        let state = self.lock();
        selection.finish_rect(state.store.iter(), side);
    }

    /// Forget selected channels that no longer exist.
    pub fn prune_selection(&self, selection: &mut PadSelection) {
        let state = self.lock();
        selection.retain_existing(|ch| state.store.contains(ch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pad;
    use std::sync::{Arc, Mutex as StdMutex};

    fn make_test_session() -> BoardSession {
        BoardSession::new(EngineConfig::default())
    }

    fn two_pad_footprint() -> Footprint {
        Footprint::new(vec![Pad::new("1", -1.0, 0.0), Pad::new("2", 1.0, 0.0)])
    }

    #[test]
    fn test_failed_mutation_pushes_nothing() {
        let session = make_test_session();
        session.add(BoardObject::new("U1", "1", 0.0, 0.0)).unwrap();
        assert_eq!(session.undo_depth(), 1);
        assert!(session.remove(99).is_err());
        assert!(session.bulk_delete(&[1, 99], RenderHint::Full).is_err());
        assert_eq!(session.undo_depth(), 1);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_merge_policy_required() {
        let session = make_test_session();
        let request = PlacementRequest::new(
            two_pad_footprint(),
            "U1",
            Point::new(10.0, 10.0),
            Orientation::default(),
        );
        session.place_footprint(&request).unwrap();
        let err = session.place_footprint(&request).unwrap_err();
        assert!(matches!(err, Error::MergePolicyRequired { .. }));
        assert_eq!(session.len(), 2);

        let added = session
            .place_footprint(&request.clone().with_policy(MergePolicy::Append))
            .unwrap();
        let pins: Vec<_> = added.iter().map(|o| o.pin.as_str()).collect();
        assert_eq!(pins, vec!["3", "4"]);
    }

    #[test]
    fn test_prefix_map_fills_missing_prefixes() {
        let session = make_test_session();
        let mut request =
            PlacementRequest::new(two_pad_footprint(), "J1", Point::default(), Orientation::default());
        request.prefix_map.insert("2".into(), "B7".into());
        let added = session.place_footprint(&request).unwrap();
        assert_eq!(added[0].prefix, None);
        assert_eq!(added[1].prefix.as_deref(), Some("B7"));
    }

    #[test]
    fn test_events_after_commit() {
        let session = make_test_session();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session.subscribe(move |e: &BoardEvent| {
            sink.lock().unwrap().push(e.objects().len());
        });
        session
            .bulk_add(
                vec![BoardObject::new("U1", "1", 0.0, 0.0), BoardObject::new("U1", "2", 1.0, 0.0)],
                RenderHint::Partial,
            )
            .unwrap();
        session.undo().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![2, 0]);
    }

    #[test]
    fn test_clipboard_round_trip() {
        let session = make_test_session();
        assert!(matches!(session.clipboard_footprint(false), Err(Error::EmptyClipboard)));
        session
            .bulk_add(
                vec![BoardObject::new("U1", "5", 2.0, 0.0), BoardObject::new("U1", "3", 0.0, 0.0)],
                RenderHint::Full,
            )
            .unwrap();
        let summary = session.copy(&[1, 2]).unwrap();
        assert_eq!(summary.copied, 2);
        assert!(summary.suggest_renumber);
        let fp = session.clipboard_footprint(true).unwrap();
        assert_eq!(fp.pads[0].pin, "1");
        assert_eq!(fp.pads[0].x_mm, 0.0);
        assert_eq!((fp.center_x, fp.center_y), (1.0, 0.0));
    }

    #[test]
    fn test_copy_of_contiguous_pins_needs_no_renumber() {
        let session = make_test_session();
        session
            .bulk_add(
                vec![BoardObject::new("U1", "2", 0.0, 0.0), BoardObject::new("U1", "1", 1.0, 0.0)],
                RenderHint::Full,
            )
            .unwrap();
        let summary = session.copy(&[1, 2]).unwrap();
        assert_eq!(summary, CopySummary { copied: 2, suggest_renumber: false });
        assert!(!session.copy(&[2]).unwrap().suggest_renumber);
    }

    #[test]
    fn test_nudge_anchor_uses_configured_step() {
        let session = BoardSession::new(EngineConfig {
            anchor_nudge_step_mm: 0.5,
            ..Default::default()
        });
        let mut anchors = AnchorPair::new(Point::new(0.0, 0.0), Point::new(4.0, 4.0));
        session.nudge_anchor(&mut anchors, AnchorId::A, 2, -1, Side::Top);
        assert_eq!(anchors.a, Point::new(1.0, -0.5));
        session.nudge_anchor(&mut anchors, AnchorId::B, 1, 0, Side::Bottom);
        assert_eq!(anchors.b, Point::new(3.5, 4.0));
    }

    #[test]
    fn test_observer_can_query_during_delivery() {
        let session = Arc::new(make_test_session());
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let (inner, sink) = (Arc::clone(&session), Arc::clone(&seen));
        session.subscribe(move |_: &BoardEvent| {
            sink.lock().unwrap().push(inner.len());
        });
        session.add(BoardObject::new("U1", "1", 0.0, 0.0)).unwrap();
        session.set_part("U1", PartEntry::default()).unwrap();
        session.add(BoardObject::new("U1", "2", 0.0, 0.0)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
