//! The parts list kept next to the board objects.
//!
//! Quick creation registers a row for the component it creates. The list is
//! small and travels inside undo snapshots together with the pads.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartEntry {
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub part_number: String,
}

/// Component name → part row, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartsList {
    entries: IndexMap<String, PartEntry>,
}

impl PartsList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row for `component`.
    pub fn add_component(&mut self, component: impl Into<String>, entry: PartEntry) {
        self.entries.insert(component.into(), entry);
    }

    pub fn remove_component(&mut self, component: &str) -> Option<PartEntry> {
        self.entries.shift_remove(component)
    }

    pub fn get(&self, component: &str) -> Option<&PartEntry> {
        self.entries.get(component)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PartEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_replace_remove() {
        let mut parts = PartsList::new();
        parts.add_component("U1", PartEntry::default());
        parts.add_component(
            "R1",
            PartEntry {
                value: "10k".into(),
                ..Default::default()
            },
        );
        parts.add_component(
            "U1",
            PartEntry {
                package: "SOIC-8".into(),
                ..Default::default()
            },
        );
        assert_eq!(parts.len(), 2);
        assert_eq!(parts.iter().next().map(|(k, _)| k.as_str()), Some("U1"));
        assert_eq!(parts.get("U1").map(|e| e.package.as_str()), Some("SOIC-8"));
        assert!(parts.remove_component("U1").is_some());
        assert_eq!(parts.iter().next().map(|(k, _)| k.as_str()), Some("R1"));
    }
}
