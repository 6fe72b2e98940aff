//! The authoritative collection of placed pads.
//!
//! Objects are keyed by channel in a [`BTreeMap`] of [`Arc`]s, so taking a
//! snapshot for the undo stack copies pointers rather than pads, and a pad
//! that is never touched again is shared by every snapshot that contains it.
//!
//! Every bulk operation works on a staged copy of the table and only swaps it
//! in when the whole batch succeeded: a failed call leaves the store exactly
//! as it was.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{
    BoardObject, Channel, PadShape, Side, Technology, Testability, default_signal, parse_pin,
};

/// Channel → placed pad. Cloning is cheap and yields an independent table.
pub type ObjectTable = BTreeMap<Channel, Arc<BoardObject>>;

/// The first channel handed out by an empty store.
pub const FIRST_CHANNEL: Channel = 1;

// ────────────────────────────────────────────────────────────────────────────
// Field changes
// ────────────────────────────────────────────────────────────────────────────

/// Fields overwritten on every object of a [`BoardObjectStore::bulk_update`].
///
/// `None` leaves the field as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldChanges {
    pub component_name: Option<String>,
    pub signal: Option<String>,
    pub side: Option<Side>,
    pub testability: Option<Testability>,
    pub technology: Option<Technology>,
    pub shape: Option<PadShape>,
    pub angle_deg: Option<f64>,
    pub visible: Option<bool>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        *self == FieldChanges::default()
    }

    pub fn apply(&self, obj: &mut BoardObject) {
        if let Some(name) = &self.component_name {
            obj.component_name = name.clone();
        }
        if let Some(signal) = &self.signal {
            obj.signal = signal.clone();
        }
        if let Some(side) = self.side {
            obj.side = side;
        }
        if let Some(testability) = self.testability {
            obj.testability = testability;
        }
        if let Some(technology) = self.technology {
            obj.technology = technology;
        }
        if let Some(shape) = self.shape {
            obj.shape = shape;
        }
        if let Some(angle) = self.angle_deg {
            obj.angle_deg = angle;
        }
        if let Some(visible) = self.visible {
            obj.visible = visible;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BoardObjectStore {
    objects: ObjectTable,
    next_channel: Channel,
}

impl Default for BoardObjectStore {
    fn default() -> Self {
        Self {
            objects: ObjectTable::new(),
            next_channel: FIRST_CHANNEL,
        }
    }
}

/// First free channel at or above `from`. Once the top of the channel space
/// is taken, the lowest free channel is used instead.
fn free_channel(objects: &ObjectTable, from: Channel) -> Option<Channel> {
    let mut ch = from.max(FIRST_CHANNEL);
    while objects.contains_key(&ch) {
        match ch.checked_add(1) {
            Some(next) => ch = next,
            None => return lowest_free_channel(objects),
        }
    }
    Some(ch)
}

fn lowest_free_channel(objects: &ObjectTable) -> Option<Channel> {
    let mut candidate = FIRST_CHANNEL;
    for &ch in objects.keys() {
        if ch > candidate {
            break;
        }
        if ch == candidate {
            candidate = candidate.checked_add(1)?;
        }
    }
    Some(candidate)
}

/// Insert `obj` into `objects`, assigning a channel when it has none, has an
/// occupied one, or has 0.
fn insert_into(
    objects: &mut ObjectTable,
    next_channel: &mut Channel,
    mut obj: BoardObject,
) -> Result<BoardObject> {
    let requested = obj.channel.filter(|&c| c >= FIRST_CHANNEL);
    let channel = match requested {
        Some(ch) if !objects.contains_key(&ch) => {
            if ch >= *next_channel {
                *next_channel = ch.saturating_add(1);
            }
            ch
        }
        _ => {
            let ch = free_channel(objects, *next_channel).ok_or(Error::ChannelsExhausted)?;
            *next_channel = ch.saturating_add(1);
            if let Some(old) = requested {
                debug!("Channel {old} is taken, reassigned {}/{} to {ch}", obj.component_name, obj.pin);
            }
            ch
        }
    };

    let reassigned = requested.filter(|&old| old != channel);
    if obj.signal.is_empty() || reassigned.is_some_and(|old| obj.signal == default_signal(old)) {
        obj.signal = default_signal(channel);
    }
    obj.channel = Some(channel);

    if objects.contains_key(&channel) {
        return Err(Error::ChannelCollision(channel));
    }
    objects.insert(channel, Arc::new(obj.clone()));
    Ok(obj)
}

fn require_channel(objects: &ObjectTable, channel: Option<Channel>) -> Result<Channel> {
    match channel {
        Some(ch) if objects.contains_key(&ch) => Ok(ch),
        other => {
            let ch = other.unwrap_or(0);
            warn!("Channel {ch} not found");
            Err(Error::ChannelNotFound(ch))
        }
    }
}

impl BoardObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── single-object mutations ───────────────────────────────────────────

    /// Insert `obj`, returning it as stored (channel and signal filled in).
    pub fn add(&mut self, obj: BoardObject) -> Result<BoardObject> {
        let added = insert_into(&mut self.objects, &mut self.next_channel, obj)?;
        debug!("Added {}/{} on channel {:?}", added.component_name, added.pin, added.channel);
        Ok(added)
    }

    pub fn remove(&mut self, channel: Channel) -> Result<BoardObject> {
        match self.objects.remove(&channel) {
            Some(obj) => Ok(Arc::unwrap_or_clone(obj)),
            None => {
                warn!("Channel {channel} not found");
                Err(Error::ChannelNotFound(channel))
            }
        }
    }

    /// Replace the object stored under `obj.channel`.
    pub fn update(&mut self, obj: BoardObject) -> Result<BoardObject> {
        let channel = require_channel(&self.objects, obj.channel)?;
        self.objects.insert(channel, Arc::new(obj.clone()));
        Ok(obj)
    }

    // ── bulk mutations ────────────────────────────────────────────────────

    pub fn bulk_add(&mut self, objs: Vec<BoardObject>) -> Result<Vec<BoardObject>> {
        let mut staged = self.objects.clone();
        let mut next = self.next_channel;
        let added = objs
            .into_iter()
            .map(|obj| insert_into(&mut staged, &mut next, obj))
            .collect::<Result<Vec<_>>>()?;
        self.objects = staged;
        self.next_channel = next;
        info!("Added {} pads", added.len());
        Ok(added)
    }

    /// Remove every channel in `channels`. Nothing is removed when any of
    /// them is absent.
    pub fn bulk_delete(&mut self, channels: &[Channel]) -> Result<Vec<BoardObject>> {
        for &ch in channels {
            require_channel(&self.objects, Some(ch))?;
        }
        let mut staged = self.objects.clone();
        let removed: Vec<BoardObject> = channels
            .iter()
            .filter_map(|ch| staged.remove(ch))
            .map(Arc::unwrap_or_clone)
            .collect();
        self.objects = staged;
        info!("Deleted {} pads", removed.len());
        Ok(removed)
    }

    /// Replace every object of `objs` by channel after applying `changes`.
    /// Nothing is written when any channel is absent.
    pub fn bulk_update(
        &mut self,
        objs: Vec<BoardObject>,
        changes: &FieldChanges,
    ) -> Result<Vec<BoardObject>> {
        for obj in &objs {
            require_channel(&self.objects, obj.channel)?;
        }
        let mut staged = self.objects.clone();
        let mut updated = Vec::with_capacity(objs.len());
        for mut obj in objs {
            changes.apply(&mut obj);
            let channel = require_channel(&staged, obj.channel)?;
            staged.insert(channel, Arc::new(obj.clone()));
            updated.push(obj);
        }
        self.objects = staged;
        info!("Updated {} pads", updated.len());
        Ok(updated)
    }

    /// Remove everything, returning what was stored.
    pub fn clear(&mut self) -> Vec<BoardObject> {
        std::mem::take(&mut self.objects)
            .into_values()
            .map(Arc::unwrap_or_clone)
            .collect()
    }

    /// Replace the whole collection with loaded objects.
    ///
    /// Objects with an explicit channel keep it (first one wins on a
    /// duplicate); the rest are numbered after them. The counter is then
    /// refreshed from the loaded maximum.
    pub fn load(&mut self, objs: Vec<BoardObject>) -> Result<Vec<BoardObject>> {
        let mut staged = ObjectTable::new();
        let mut next = FIRST_CHANNEL;
        let (explicit, unset): (Vec<_>, Vec<_>) = objs
            .into_iter()
            .partition(|o| o.channel.is_some_and(|c| c >= FIRST_CHANNEL));
        let mut loaded = Vec::with_capacity(explicit.len() + unset.len());
        for obj in explicit {
            loaded.push(insert_into(&mut staged, &mut next, obj)?);
        }
        for obj in unset {
            loaded.push(insert_into(&mut staged, &mut next, obj)?);
        }
        self.objects = staged;
        self.refresh_channel_counter();
        info!("Loaded {} pads, next channel {}", loaded.len(), self.next_channel);
        Ok(loaded)
    }

    /// Reset the allocator to one past the highest stored channel.
    pub fn refresh_channel_counter(&mut self) {
        self.next_channel = self
            .objects
            .keys()
            .next_back()
            .map_or(FIRST_CHANNEL, |&max| max.saturating_add(1));
    }

    // ── snapshots ─────────────────────────────────────────────────────────

    pub fn table(&self) -> ObjectTable {
        self.objects.clone()
    }

    /// Put a snapshot table back. The counter never moves backwards, so a
    /// channel freed by the undo is not handed out again.
    pub fn restore(&mut self, table: ObjectTable) {
        self.objects = table;
        if let Some(&max) = self.objects.keys().next_back() {
            self.next_channel = self.next_channel.max(max.saturating_add(1));
        }
    }

    // ── queries ───────────────────────────────────────────────────────────

    pub fn get(&self, channel: Channel) -> Option<BoardObject> {
        self.objects.get(&channel).map(|o| BoardObject::clone(o))
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.objects.contains_key(&channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoardObject> {
        self.objects.values().map(|o| &**o)
    }

    /// Every object in channel order.
    pub fn all_objects(&self) -> Vec<BoardObject> {
        self.iter().cloned().collect()
    }

    pub fn objects_on_side(&self, side: Side) -> Vec<BoardObject> {
        self.iter().filter(|o| o.side == side).cloned().collect()
    }

    /// Pads of `component`, compared case-insensitively.
    pub fn pads_for_component(&self, component: &str) -> Vec<BoardObject> {
        self.iter().filter(|o| o.is_component(component)).cloned().collect()
    }

    /// First object (channel order) matching every given criterion.
    pub fn find_pad(
        &self,
        component: Option<&str>,
        pin: Option<&str>,
        signal: Option<&str>,
        channel: Option<Channel>,
    ) -> Option<BoardObject> {
        self.iter()
            .find(|o| {
                component.is_none_or(|c| o.is_component(c))
                    && pin.is_none_or(|p| o.pin == p)
                    && signal.is_none_or(|s| o.signal == s)
                    && channel.is_none_or(|ch| o.channel == Some(ch))
            })
            .cloned()
    }

    pub fn find_by_signal(&self, signal: &str) -> Vec<BoardObject> {
        self.iter().filter(|o| o.signal == signal).cloned().collect()
    }

    /// Sorted unique component names.
    pub fn components(&self) -> Vec<String> {
        self.iter()
            .map(|o| o.component_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Unique pins of `component`, numeric ones first in numeric order.
    pub fn pins(&self, component: &str) -> Vec<String> {
        let mut pins: Vec<String> = self
            .iter()
            .filter(|o| o.is_component(component))
            .map(|o| o.pin.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        pins.sort_by_key(|p| (parse_pin(p).is_none(), parse_pin(p), p.clone()));
        pins
    }

    /// Sorted unique signals, optionally narrowed to a component and pin.
    pub fn signals(&self, component: Option<&str>, pin: Option<&str>) -> Vec<String> {
        self.iter()
            .filter(|o| component.is_none_or(|c| o.is_component(c)))
            .filter(|o| pin.is_none_or(|p| o.pin == p))
            .map(|o| o.signal.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The channel the next unnumbered object will receive, `None` when
    /// every channel is taken.
    pub fn next_channel(&self) -> Option<Channel> {
        free_channel(&self.objects, self.next_channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(name: &str, pin: &str) -> BoardObject {
        BoardObject::new(name, pin, 0.0, 0.0)
    }

    #[test]
    fn test_add_assigns_channels_and_signals() {
        let mut store = BoardObjectStore::new();
        let a = store.add(pad("U1", "1")).unwrap();
        let b = store.add(pad("U1", "2").with_signal("GND")).unwrap();
        assert_eq!(a.channel, Some(1));
        assert_eq!(a.signal, "S1");
        assert_eq!(b.channel, Some(2));
        assert_eq!(b.signal, "GND");
    }

    #[test]
    fn test_occupied_channel_is_reassigned() {
        let mut store = BoardObjectStore::new();
        store.add(pad("U1", "1").with_channel(5)).unwrap();
        let b = store.add(pad("U1", "2").with_channel(5).with_signal("S5")).unwrap();
        assert_eq!(b.channel, Some(6));
        assert_eq!(b.signal, "S6");
        let c = store.add(pad("U1", "3").with_channel(6).with_signal("VCC")).unwrap();
        assert_eq!(c.channel, Some(7));
        assert_eq!(c.signal, "VCC");
    }

    #[test]
    fn test_remove_and_update_missing_channel() {
        let mut store = BoardObjectStore::new();
        assert!(matches!(store.remove(3), Err(Error::ChannelNotFound(3))));
        assert!(matches!(store.update(pad("U1", "1")), Err(Error::ChannelNotFound(0))));
        assert!(matches!(
            store.update(pad("U1", "1").with_channel(9)),
            Err(Error::ChannelNotFound(9))
        ));
    }

    #[test]
    fn test_bulk_delete_is_all_or_nothing() {
        let mut store = BoardObjectStore::new();
        store.bulk_add(vec![pad("U1", "1"), pad("U1", "2")]).unwrap();
        assert!(store.bulk_delete(&[1, 42]).is_err());
        assert_eq!(store.len(), 2);
        let removed = store.bulk_delete(&[2, 1]).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_bulk_update_applies_field_changes() {
        let mut store = BoardObjectStore::new();
        let added = store.bulk_add(vec![pad("U1", "1"), pad("U1", "2")]).unwrap();
        let changes = FieldChanges {
            side: Some(Side::Bottom),
            visible: Some(false),
            ..Default::default()
        };
        store.bulk_update(added, &changes).unwrap();
        assert_eq!(store.objects_on_side(Side::Bottom).len(), 2);
        assert!(store.iter().all(|o| !o.visible));
    }

    #[test]
    fn test_load_keeps_explicit_channels() {
        let mut store = BoardObjectStore::new();
        store.add(pad("X", "1")).unwrap();
        let loaded = store
            .load(vec![
                pad("U1", "1"),
                pad("U1", "2").with_channel(10),
                pad("U1", "3").with_channel(4),
            ])
            .unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(loaded[0].channel, Some(10));
        assert_eq!(store.get(11).map(|o| o.pin), Some("1".to_string()));
        assert_eq!(store.next_channel(), Some(12));
    }

    #[test]
    fn test_restore_never_rewinds_counter() {
        let mut store = BoardObjectStore::new();
        let before = store.table();
        store.add(pad("U1", "1")).unwrap();
        store.restore(before);
        assert!(store.is_empty());
        assert_eq!(store.add(pad("U1", "1")).unwrap().channel, Some(2));
    }

    #[test]
    fn test_top_channel_falls_back_to_lowest_free() {
        let mut store = BoardObjectStore::new();
        let top = store.add(pad("U1", "1").with_channel(Channel::MAX)).unwrap();
        assert_eq!(top.channel, Some(Channel::MAX));
        assert_eq!(store.next_channel(), Some(FIRST_CHANNEL));

        let a = store.add(pad("U1", "2")).unwrap();
        let b = store.add(pad("U1", "3").with_channel(Channel::MAX)).unwrap();
        assert_eq!(a.channel, Some(1));
        assert_eq!(b.channel, Some(2));
        assert_eq!(b.signal, "S2");
        assert!(!store.contains(0));

        store.refresh_channel_counter();
        let before = store.table();
        store.restore(before);
        assert_eq!(store.add(pad("U1", "4")).unwrap().channel, Some(3));
    }

    #[test]
    fn test_load_with_top_channel() {
        let mut store = BoardObjectStore::new();
        let loaded = store
            .load(vec![pad("U1", "1"), pad("U1", "2").with_channel(Channel::MAX)])
            .unwrap();
        assert_eq!(loaded[0].channel, Some(Channel::MAX));
        assert_eq!(loaded[1].channel, Some(FIRST_CHANNEL));
        assert_eq!(store.next_channel(), Some(2));
    }

    #[test]
    fn test_queries() {
        let mut store = BoardObjectStore::new();
        store
            .bulk_add(vec![
                pad("u1", "10"),
                pad("U1", "2").with_signal("GND"),
                pad("U1", "A"),
                pad("R1", "1").with_side(Side::Bottom),
            ])
            .unwrap();
        assert_eq!(store.components(), vec!["R1", "U1", "u1"]);
        assert_eq!(store.pins("U1"), vec!["2", "10", "A"]);
        assert_eq!(store.pads_for_component("U1").len(), 3);
        assert_eq!(store.find_by_signal("GND").len(), 1);
        assert_eq!(
            store.find_pad(Some("r1"), None, None, None).and_then(|o| o.channel),
            Some(4)
        );
        assert_eq!(store.signals(Some("U1"), Some("2")), vec!["GND"]);
        assert!(store.find_pad(None, Some("99"), None, None).is_none());
    }
}
