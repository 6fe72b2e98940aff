use thiserror::Error;

use crate::model::Channel;

#[derive(Error, Debug)]
pub enum Error {
    #[error("channel {0} does not exist")]
    ChannelNotFound(Channel),

    #[error("degenerate pad grid: {reason}")]
    DegenerateGrid { reason: String },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    /// The allocator produced a channel that is already stored. This is a
    /// logic defect, never a user error.
    #[error("channel collision on {0}")]
    ChannelCollision(Channel),

    #[error("component '{component}' already has pads; a merge policy is required")]
    MergePolicyRequired { component: String },

    #[error("component '{component}' has no pin numbers left to assign")]
    PinSpaceExhausted { component: String },

    #[error("no free channel left")]
    ChannelsExhausted,

    #[error("footprint has no pads")]
    EmptyFootprint,

    #[error("clipboard is empty")]
    EmptyClipboard,

    #[error("invalid pad code: {0}")]
    InvalidPadCode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Error::DegenerateGrid {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
