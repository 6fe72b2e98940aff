//! Board editing on top of the placement engine.
//!
//! - **Store**: channel-keyed collection of placed pads with transactional bulk operations
//! - **History**: bounded, deduplicated snapshot undo/redo
//! - **Events**: added/removed/updated notifications delivered after each commit
//! - **Selection**: toggle and rectangle selection of channels
//! - **Session**: the context object tying it together behind one lock

pub mod events;
pub mod history;
pub mod selection;
pub mod session;
pub mod store;

pub use events::{BoardEvent, BoardObserver, ChannelObserver, RenderHint, ResetKind};
pub use history::{Snapshot, UndoRedoManager};
pub use selection::{PadSelection, SelectionRect};
pub use session::{BoardSession, CopySummary, PlacementRequest, QuickCreateRequest, SessionState};
pub use store::{BoardObjectStore, FieldChanges, ObjectTable};
