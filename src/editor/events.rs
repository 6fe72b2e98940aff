//! Change notifications for the rendering and persistence layers.
//!
//! Events are delivered after the mutation has been committed and the board
//! lock released, in the order the mutations happened. An observer is either
//! a closure or a [`ChannelObserver`] feeding an `mpsc` receiver that the
//! consumer drains on its own thread.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::model::BoardObject;

/// Whether a consumer may redraw only the affected pads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderHint {
    Partial,
    #[default]
    Full,
}

/// Why the whole board was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    Undo,
    Redo,
    Load,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    Added {
        objects: Vec<BoardObject>,
        hint: RenderHint,
    },
    Removed {
        objects: Vec<BoardObject>,
        hint: RenderHint,
    },
    Updated {
        objects: Vec<BoardObject>,
        hint: RenderHint,
    },
    /// Everything may have changed; consumers re-read the board.
    Reset { kind: ResetKind },
}

impl BoardEvent {
    /// The affected pads, empty for a reset.
    pub fn objects(&self) -> &[BoardObject] {
        match self {
            BoardEvent::Added { objects, .. }
            | BoardEvent::Removed { objects, .. }
            | BoardEvent::Updated { objects, .. } => objects,
            BoardEvent::Reset { .. } => &[],
        }
    }
}

pub trait BoardObserver: Send {
    fn on_event(&self, event: &BoardEvent);
}

impl<F> BoardObserver for F
where
    F: Fn(&BoardEvent) + Send,
{
    fn on_event(&self, event: &BoardEvent) {
        self(event)
    }
}

/// Forwards every event into an `mpsc` channel.
pub struct ChannelObserver {
    tx: Sender<BoardEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, Receiver<BoardEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl BoardObserver for ChannelObserver {
    fn on_event(&self, event: &BoardEvent) {
        // A dropped receiver just means nobody listens any more.
        let _ = self.tx.send(event.clone());
    }
}
